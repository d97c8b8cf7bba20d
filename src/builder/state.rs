use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::entity::{EntityKind, EntityRecord};

/// Ability points a build may spend, by rank.
pub fn ability_points_for_rank(rank: u8) -> i32 {
    match rank {
        1 => 5,
        2 => 10,
        3 => 15,
        4 => 20,
        5 => 25,
        6 => 30,
        _ => 0,
    }
}

/// Per-ability ceiling for a rank.
pub fn max_ability_for_rank(rank: u8) -> i32 {
    (i32::from(rank) + 3).max(1)
}

/// Lowest score an ability may be bought down to. Buying down refunds points.
pub const MIN_ABILITY: i32 = -3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbilityKey {
    #[serde(rename = "mle")]
    Melee,
    #[serde(rename = "agl")]
    Agility,
    #[serde(rename = "res")]
    Resilience,
    #[serde(rename = "vig")]
    Vigilance,
    Ego,
    #[serde(rename = "log")]
    Logic,
}

impl AbilityKey {
    pub const ALL: [AbilityKey; 6] = [
        AbilityKey::Melee,
        AbilityKey::Agility,
        AbilityKey::Resilience,
        AbilityKey::Vigilance,
        AbilityKey::Ego,
        AbilityKey::Logic,
    ];

    pub fn abbrev(&self) -> &'static str {
        match self {
            AbilityKey::Melee => "mle",
            AbilityKey::Agility => "agl",
            AbilityKey::Resilience => "res",
            AbilityKey::Vigilance => "vig",
            AbilityKey::Ego => "ego",
            AbilityKey::Logic => "log",
        }
    }

    /// Fold an abbreviation or long-form alias down to one of the six keys.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "mle" | "melee" => Some(AbilityKey::Melee),
            "agl" | "agility" => Some(AbilityKey::Agility),
            "res" | "resilience" => Some(AbilityKey::Resilience),
            "vig" | "vigilance" => Some(AbilityKey::Vigilance),
            "ego" => Some(AbilityKey::Ego),
            "log" | "logic" => Some(AbilityKey::Logic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub mle: i32,
    pub agl: i32,
    pub res: i32,
    pub vig: i32,
    pub ego: i32,
    pub log: i32,
}

impl AbilityScores {
    pub fn get(&self, key: AbilityKey) -> i32 {
        match key {
            AbilityKey::Melee => self.mle,
            AbilityKey::Agility => self.agl,
            AbilityKey::Resilience => self.res,
            AbilityKey::Vigilance => self.vig,
            AbilityKey::Ego => self.ego,
            AbilityKey::Logic => self.log,
        }
    }

    pub fn set(&mut self, key: AbilityKey, value: i32) {
        match key {
            AbilityKey::Melee => self.mle = value,
            AbilityKey::Agility => self.agl = value,
            AbilityKey::Resilience => self.res = value,
            AbilityKey::Vigilance => self.vig = value,
            AbilityKey::Ego => self.ego = value,
            AbilityKey::Logic => self.log = value,
        }
    }

    /// Sum of positive scores (points spent).
    pub fn spent(&self) -> i32 {
        AbilityKey::ALL
            .iter()
            .map(|k| self.get(*k).max(0))
            .sum()
    }

    /// Points refunded by negative scores.
    pub fn refunded(&self) -> i32 {
        AbilityKey::ALL
            .iter()
            .map(|k| (-self.get(*k)).max(0))
            .sum()
    }
}

/// Everything the wizard accumulates for one character. An explicit value:
/// the engine never reads session state it was not handed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildState {
    pub rank: u8,
    pub abilities: AbilityScores,
    pub occupation: Option<EntityRecord>,
    pub origin: Option<EntityRecord>,
    pub selected_traits: Vec<EntityRecord>,
    pub selected_tags: Vec<EntityRecord>,
    pub chosen_powers: Vec<EntityRecord>,
    /// Power set currently being browsed.
    pub active_group: String,
}

impl Default for BuildState {
    fn default() -> Self {
        Self::new()
    }
}

/// "Connections" may be taken more than once; every other trait is unique.
fn is_repeatable_trait(name: &str) -> bool {
    let name = name.trim().to_lowercase();
    name == "connections" || name == "conex\u{f5}es"
}

impl BuildState {
    pub fn new() -> Self {
        Self {
            rank: 1,
            abilities: AbilityScores::default(),
            occupation: None,
            origin: None,
            selected_traits: Vec::new(),
            selected_tags: Vec::new(),
            chosen_powers: Vec::new(),
            active_group: String::new(),
        }
    }

    /// Change rank. A rank change resets the ability allocation.
    pub fn set_rank(&mut self, rank: u8) {
        let rank = rank.clamp(1, 6);
        if rank != self.rank {
            self.rank = rank;
            self.abilities = AbilityScores::default();
        }
    }

    pub fn max_ability(&self) -> i32 {
        max_ability_for_rank(self.rank)
    }

    pub fn ability_points(&self) -> i32 {
        ability_points_for_rank(self.rank)
    }

    pub fn remaining_ability_points(&self) -> i32 {
        self.ability_points() + self.abilities.refunded() - self.abilities.spent()
    }

    /// Scores this ability could legally take given the other five: within
    /// the floor/ceiling, and keeping spent points inside budget + refunds.
    pub fn allowed_ability_values(&self, key: AbilityKey) -> Vec<i32> {
        let budget = self.ability_points();
        (MIN_ABILITY..=self.max_ability())
            .filter(|v| {
                let mut trial = self.abilities;
                trial.set(key, *v);
                trial.spent() <= budget + trial.refunded()
            })
            .collect()
    }

    /// Distinct non-Basic power sets among the chosen powers.
    pub fn distinct_non_basic_groups(&self) -> usize {
        self.chosen_powers
            .iter()
            .filter(|p| !p.is_basic())
            .map(|p| p.group_label.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Traits the user may still pick beyond the granted ones (one per rank).
    pub fn extra_traits_remaining(&self) -> usize {
        usize::from(self.rank).saturating_sub(self.selected_traits.len())
    }

    pub fn has_chosen_power(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.chosen_powers
            .iter()
            .any(|p| p.name.to_lowercase() == name)
    }

    /// Names of one grant list across the chosen occupation and origin.
    fn granted_names(&self, pick: fn(&EntityRecord) -> &[EntityRecord]) -> HashSet<String> {
        self.occupation
            .iter()
            .chain(self.origin.iter())
            .flat_map(|r| pick(r).iter())
            .map(|g| g.name.to_lowercase())
            .collect()
    }

    /// Add a picked trait. Granted traits and duplicates by name are refused
    /// except for the repeatable "Connections" family; the per-rank budget is
    /// enforced.
    pub fn select_trait(&mut self, record: EntityRecord) -> bool {
        debug_assert_eq!(record.kind, EntityKind::Trait);
        if self.extra_traits_remaining() == 0 {
            return false;
        }
        if !is_repeatable_trait(&record.name) {
            let name = record.name.to_lowercase();
            if self.granted_names(|r| &r.granted_traits).contains(&name) {
                return false;
            }
            if self
                .selected_traits
                .iter()
                .any(|t| t.name.to_lowercase() == name)
            {
                return false;
            }
        }
        self.selected_traits.push(record);
        true
    }

    pub fn select_tag(&mut self, record: EntityRecord) -> bool {
        debug_assert_eq!(record.kind, EntityKind::Tag);
        let name = record.name.to_lowercase();
        if self.granted_names(|r| &r.granted_tags).contains(&name) {
            return false;
        }
        if self
            .selected_tags
            .iter()
            .any(|t| t.name.to_lowercase() == name)
        {
            return false;
        }
        self.selected_tags.push(record);
        true
    }

    pub fn remove_trait(&mut self, name: &str) {
        let name = name.to_lowercase();
        if let Some(idx) = self
            .selected_traits
            .iter()
            .position(|t| t.name.to_lowercase() == name)
        {
            self.selected_traits.remove(idx);
        }
    }

    pub fn remove_tag(&mut self, name: &str) {
        let name = name.to_lowercase();
        if let Some(idx) = self
            .selected_tags
            .iter()
            .position(|t| t.name.to_lowercase() == name)
        {
            self.selected_tags.remove(idx);
        }
    }

    pub fn choose_power(&mut self, record: EntityRecord) {
        debug_assert_eq!(record.kind, EntityKind::Power);
        self.chosen_powers.push(record);
    }

    pub fn unchoose_power(&mut self, name: &str) {
        let name = name.to_lowercase();
        if let Some(idx) = self
            .chosen_powers
            .iter()
            .position(|p| p.name.to_lowercase() == name)
        {
            self.chosen_powers.remove(idx);
        }
    }
}
