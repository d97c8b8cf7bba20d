use std::collections::HashSet;

use crate::builder::state::BuildState;
use crate::catalog::entity::{EntityKind, EntityRecord};
use crate::rules::budget::PowerLimitMatrix;
use crate::rules::prereq::{self, PrereqContext};

/// Which chosen item an automatic grant came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantedBy {
    Occupation,
    Origin,
}

#[derive(Debug, Clone)]
pub struct Grant {
    pub granted_by: GrantedBy,
    pub entity: EntityRecord,
}

/// Traits, tags and powers automatically granted by the chosen occupation
/// and origin, de-duplicated by id first and by (kind, name) second, first
/// occurrence winning.
pub fn granted_entities(
    occupation: Option<&EntityRecord>,
    origin: Option<&EntityRecord>,
) -> Vec<Grant> {
    let mut grants = Vec::new();
    for (source, record) in [
        (GrantedBy::Occupation, occupation),
        (GrantedBy::Origin, origin),
    ] {
        let Some(record) = record else { continue };
        for entity in record
            .granted_traits
            .iter()
            .chain(record.granted_tags.iter())
            .chain(record.granted_powers.iter())
        {
            grants.push(Grant {
                granted_by: source,
                entity: entity.clone(),
            });
        }
    }

    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    let mut unique = Vec::new();
    for grant in grants {
        if let Some(id) = &grant.entity.id {
            if !seen_ids.insert(id.clone()) {
                continue;
            }
        }
        let name_key = (grant.entity.kind, grant.entity.name.trim().to_lowercase());
        if !seen_names.insert(name_key) {
            continue;
        }
        unique.push(grant);
    }
    unique
}

/// Origin-granted powers that occupy budget slots: the alphabetically first
/// `limit` of them. Grants past the cap stay granted but cost nothing.
/// Occupation grants are never capped.
pub fn origin_consumed_powers(grants: &[Grant], limit: u32) -> Vec<EntityRecord> {
    let mut from_origin: Vec<&EntityRecord> = grants
        .iter()
        .filter(|g| g.granted_by == GrantedBy::Origin && g.entity.kind == EntityKind::Power)
        .map(|g| &g.entity)
        .collect();
    from_origin.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    from_origin
        .into_iter()
        .take(limit as usize)
        .cloned()
        .collect()
}

/// Granted powers that count for selection gating: all occupation grants
/// plus the consumed origin subset.
pub fn effective_granted_powers(grants: &[Grant], limit: u32) -> Vec<EntityRecord> {
    let mut out: Vec<EntityRecord> = grants
        .iter()
        .filter(|g| g.granted_by == GrantedBy::Occupation && g.entity.kind == EntityKind::Power)
        .map(|g| g.entity.clone())
        .collect();
    out.extend(origin_consumed_powers(grants, limit));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Granted,
    AlreadyChosen,
    RankTooLow,
    GroupLocked,
    BudgetFull,
    PrereqUnmet,
}

#[derive(Debug, Clone)]
pub struct SelectionVerdict {
    pub allowed: bool,
    pub reason: Option<DenyReason>,
    pub missing: Vec<String>,
}

impl SelectionVerdict {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            missing: Vec::new(),
        }
    }

    fn deny(reason: DenyReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            missing: Vec::new(),
        }
    }
}

/// Decide whether the user may pick a power right now. Checks run cheapest
/// first; the prerequisite clauses are only evaluated once everything
/// structural has passed.
pub fn can_select_power(
    power: &EntityRecord,
    state: &BuildState,
    power_catalog: &[EntityRecord],
    matrix: &PowerLimitMatrix,
) -> SelectionVerdict {
    let grants = granted_entities(state.occupation.as_ref(), state.origin.as_ref());
    let limit = matrix.power_limit(state.rank, state.distinct_non_basic_groups());
    let consumed = origin_consumed_powers(&grants, limit).len();
    let granted = effective_granted_powers(&grants, limit);

    let granted_ids: HashSet<&String> = granted.iter().filter_map(|p| p.id.as_ref()).collect();
    let granted_names: HashSet<String> =
        granted.iter().map(|p| p.name.to_lowercase()).collect();

    let by_id_granted = power
        .id
        .as_ref()
        .map(|id| granted_ids.contains(id))
        .unwrap_or(false);
    if by_id_granted || granted_names.contains(&power.name.to_lowercase()) {
        return SelectionVerdict::deny(DenyReason::Granted);
    }

    if state.has_chosen_power(&power.name) {
        return SelectionVerdict::deny(DenyReason::AlreadyChosen);
    }

    let prereq_text = power.prerequisite_text.as_deref().unwrap_or("");
    let needed = prereq::required_rank(prereq_text);
    if needed > 0 && u32::from(state.rank) < needed {
        return SelectionVerdict::deny(DenyReason::RankTooLow);
    }

    // Rank 1 is limited to the Basic set plus exactly one other set.
    if state.rank == 1 && !power.is_basic() {
        let chosen_groups: HashSet<String> = state
            .chosen_powers
            .iter()
            .filter(|p| !p.is_basic())
            .map(|p| p.group_label.trim().to_lowercase())
            .collect();
        let group = power.group_label.trim().to_lowercase();
        if !chosen_groups.is_empty() && !chosen_groups.contains(&group) {
            return SelectionVerdict::deny(DenyReason::GroupLocked);
        }
    }

    let available = (limit as usize).saturating_sub(consumed);
    if state.chosen_powers.len() >= available {
        return SelectionVerdict::deny(DenyReason::BudgetFull);
    }

    let ctx = PrereqContext {
        power_catalog,
        granted_power_names: &granted_names,
    };
    let outcome = prereq::evaluate(prereq_text, state, &ctx);
    if !outcome.satisfied {
        let mut verdict = SelectionVerdict::deny(DenyReason::PrereqUnmet);
        verdict.missing = outcome.missing;
        return verdict;
    }

    SelectionVerdict::allow()
}
