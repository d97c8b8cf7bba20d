use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::builder::state::{AbilityKey, BuildState};
use crate::catalog::entity::EntityRecord;

static LABEL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^pr[eé]:\s*").expect("Failed to compile label regex"));

static RANK_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"rank\s*(\d+)").expect("Failed to compile rank regex"));

static ABILITY_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(agl|mle|res|vig|ego|log|melee|agility|resilience|vigilance|logic)\s*(\d+)\s*\+")
        .expect("Failed to compile ability regex")
});

static TRAIT_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\btra(?:[çc]os?|its?)\s*:\s*([^.;,]+)").expect("Failed to compile trait regex")
});

static TAG_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\btags?\s*:\s*([^.;,]+)").expect("Failed to compile tag regex"));

static NAME_LIST_SEP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;/]+|\s(?:e|and)\s").expect("Failed to compile list regex"));

static TOKEN_SEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[,;•\u{2013}\u{2014}-]").expect("Failed to compile token regex")
});

static TOKEN_IS_RANK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rank\s*\d+").expect("Failed to compile rank token regex"));

static TOKEN_IS_ABILITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(agl|mle|res|vig|ego|log|melee|agility|resilience|vigilance|logic)\s*\d+\s*\+?")
        .expect("Failed to compile ability token regex")
});

static TOKEN_IS_LABELED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:tra(?:[çc]os?|its?)|tags?)\s*:").expect("Failed to compile label token regex")
});

/// One parsed condition from a prerequisite string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementClause {
    MinRank(u32),
    MinAbility(AbilityKey, i32),
    RequiresTrait(String),
    RequiresTag(String),
    RequiresPower(String),
}

#[derive(Debug)]
pub struct ClauseParseError {
    pub detail: String,
}

impl std::fmt::Display for ClauseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prerequisite parse failed: {}", self.detail)
    }
}

impl std::error::Error for ClauseParseError {}

/// Catalog context for name matching.
pub struct PrereqContext<'a> {
    /// Full merged power catalog.
    pub power_catalog: &'a [EntityRecord],
    /// Lower-cased names of powers already granted by occupation/origin.
    pub granted_power_names: &'a HashSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrereqOutcome {
    pub satisfied: bool,
    pub missing: Vec<String>,
}

impl PrereqOutcome {
    fn satisfied() -> Self {
        Self {
            satisfied: true,
            missing: Vec::new(),
        }
    }
}

/// Highest rank mentioned in a power's own prerequisite text, or 0.
pub fn required_rank(prereq_text: &str) -> u32 {
    RANK_CLAUSE
        .captures_iter(&prereq_text.to_lowercase())
        .filter_map(|caps| caps[1].parse().ok())
        .max()
        .unwrap_or(0)
}

/// Parse the fixed clause dialect out of a lower-cased prerequisite string.
/// Tokens that match nothing in the catalog are authoring noise and skipped.
pub fn parse_clauses(
    text: &str,
    power_names: &[String],
) -> Result<Vec<RequirementClause>, ClauseParseError> {
    let mut clauses = Vec::new();

    for caps in RANK_CLAUSE.captures_iter(text) {
        let need = caps[1].parse().map_err(|_| ClauseParseError {
            detail: format!("bad rank number in '{}'", &caps[0]),
        })?;
        clauses.push(RequirementClause::MinRank(need));
    }

    for caps in ABILITY_CLAUSE.captures_iter(text) {
        let Some(key) = AbilityKey::from_token(&caps[1]) else {
            continue;
        };
        let need = caps[2].parse().map_err(|_| ClauseParseError {
            detail: format!("bad ability threshold in '{}'", &caps[0]),
        })?;
        clauses.push(RequirementClause::MinAbility(key, need));
    }

    for caps in TRAIT_CLAUSE.captures_iter(text) {
        for name in split_name_list(&caps[1]) {
            clauses.push(RequirementClause::RequiresTrait(name));
        }
    }

    for caps in TAG_CLAUSE.captures_iter(text) {
        for name in split_name_list(&caps[1]) {
            clauses.push(RequirementClause::RequiresTag(name));
        }
    }

    for token in TOKEN_SEP.split(text) {
        let token = LABEL_PREFIX.replace(token.trim(), "").trim().to_string();
        if token.is_empty()
            || TOKEN_IS_RANK.is_match(&token)
            || TOKEN_IS_ABILITY.is_match(&token)
            || TOKEN_IS_LABELED.is_match(&token)
        {
            continue;
        }
        if let Some(name) = power_names
            .iter()
            .find(|n| **n == token || n.starts_with(&token))
        {
            clauses.push(RequirementClause::RequiresPower(name.clone()));
        }
    }

    Ok(clauses)
}

fn split_name_list(segment: &str) -> Vec<String> {
    NAME_LIST_SEP
        .split(segment)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Evaluate a prerequisite string against the current build. Empty text is
/// trivially satisfied; an internal parse failure is logged and treated as
/// satisfied so authoring mistakes never block the user.
pub fn evaluate(prereq_text: &str, state: &BuildState, ctx: &PrereqContext) -> PrereqOutcome {
    if prereq_text.trim().is_empty() {
        return PrereqOutcome::satisfied();
    }
    let text = prereq_text.to_lowercase();
    let text = LABEL_PREFIX.replace(text.trim(), "").trim().to_string();

    let power_names: Vec<String> = ctx
        .power_catalog
        .iter()
        .map(|p| p.name.to_lowercase())
        .collect();

    let clauses = match parse_clauses(&text, &power_names) {
        Ok(clauses) => clauses,
        Err(err) => {
            eprintln!("Treating prerequisite '{}' as satisfied: {}", prereq_text, err);
            return PrereqOutcome::satisfied();
        }
    };

    let chosen: HashSet<String> = state
        .chosen_powers
        .iter()
        .map(|p| p.name.to_lowercase())
        .collect();
    let traits: HashSet<String> = state
        .selected_traits
        .iter()
        .map(|t| t.name.to_lowercase())
        .collect();
    let tags: HashSet<String> = state
        .selected_tags
        .iter()
        .map(|t| t.name.to_lowercase())
        .collect();

    let mut missing = Vec::new();
    for clause in &clauses {
        match clause {
            RequirementClause::MinRank(need) => {
                if u32::from(state.rank) < *need {
                    missing.push(format!("Rank {}", need));
                }
            }
            RequirementClause::MinAbility(key, need) => {
                if state.abilities.get(*key) < *need {
                    missing.push(format!("{} {}+", key.abbrev().to_uppercase(), need));
                }
            }
            RequirementClause::RequiresTrait(name) => {
                if !traits.contains(name) {
                    missing.push(format!("Trait {}", name));
                }
            }
            RequirementClause::RequiresTag(name) => {
                if !tags.contains(name) {
                    missing.push(format!("Tag {}", name));
                }
            }
            RequirementClause::RequiresPower(name) => {
                if !chosen.contains(name) && !ctx.granted_power_names.contains(name) {
                    missing.push(format!("Power {}", name));
                }
            }
        }
    }

    PrereqOutcome {
        satisfied: missing.is_empty(),
        missing,
    }
}
