use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::normalize::normalize_label;

/// Reserved group label meaning "no power set".
pub const BASIC_GROUP: &str = "Basic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Occupation,
    Origin,
    Trait,
    Tag,
    Power,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Occupation,
        EntityKind::Origin,
        EntityKind::Trait,
        EntityKind::Tag,
        EntityKind::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Occupation => "occupation",
            EntityKind::Origin => "origin",
            EntityKind::Trait => "trait",
            EntityKind::Tag => "tag",
            EntityKind::Power => "power",
        }
    }
}

#[derive(Debug)]
pub struct ParseKindError {
    pub value: String,
}

impl std::fmt::Display for ParseKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown entity kind: {}", self.value)
    }
}

impl std::error::Error for ParseKindError {}

impl FromStr for EntityKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "occupation" => Ok(EntityKind::Occupation),
            "origin" => Ok(EntityKind::Origin),
            "trait" => Ok(EntityKind::Trait),
            "tag" => Ok(EntityKind::Tag),
            "power" => Ok(EntityKind::Power),
            _ => Err(ParseKindError {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    #[default]
    Base,
    World,
    Compendium,
}

impl SourceOrigin {
    /// Precedence used by the power merge: world beats compendium beats base.
    pub fn precedence(&self) -> u8 {
        match self {
            SourceOrigin::Base => 0,
            SourceOrigin::Compendium => 1,
            SourceOrigin::World => 2,
        }
    }
}

fn default_group() -> String {
    BASIC_GROUP.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub kind: EntityKind,
    /// Power set the entity belongs to. Only meaningful for powers.
    #[serde(default = "default_group")]
    pub group_label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisite_text: Option<String>,
    #[serde(default)]
    pub source: SourceOrigin,
    #[serde(default)]
    pub modified_at: Option<i64>,
    #[serde(default)]
    pub granted_traits: Vec<EntityRecord>,
    #[serde(default)]
    pub granted_tags: Vec<EntityRecord>,
    #[serde(default)]
    pub granted_powers: Vec<EntityRecord>,
}

impl EntityRecord {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            group_label: default_group(),
            description: String::new(),
            prerequisite_text: None,
            source: SourceOrigin::Base,
            modified_at: None,
            granted_traits: Vec::new(),
            granted_tags: Vec::new(),
            granted_powers: Vec::new(),
        }
    }

    pub fn is_basic(&self) -> bool {
        self.group_label == BASIC_GROUP
    }

    /// Canonicalize the group label in place. Run after any merge so labels
    /// differing only by dash/whitespace typography compare equal.
    pub fn canonicalize(&mut self) {
        self.group_label = normalize_label(&self.group_label);
        if self.group_label.is_empty() {
            self.group_label = default_group();
        }
    }
}

/// Ingestion-boundary validation: keep only records with a usable name and
/// stamp them with the kind and source they were fetched under. Invalid rows
/// are reported and dropped, never fatal.
pub fn validate_records(
    kind: EntityKind,
    source: SourceOrigin,
    records: Vec<EntityRecord>,
) -> Vec<EntityRecord> {
    let mut out = Vec::with_capacity(records.len());
    for mut record in records {
        if record.name.trim().is_empty() {
            eprintln!("Dropping nameless {} record during ingestion", kind.as_str());
            continue;
        }
        record.kind = kind;
        record.source = source;
        record.canonicalize();
        out.push(record);
    }
    out
}
