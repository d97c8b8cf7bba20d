use std::collections::HashSet;

use crate::builder::state::BuildState;
use crate::catalog::entity::{EntityKind, EntityRecord};
use crate::rules::budget::PowerLimitMatrix;
use crate::rules::grants::{self, GrantedBy};
use crate::rules::series::collapse_series;

/// Flat entity list ready for persistence by the host's actor-creation
/// routine. Consumes the build state's picks exactly once.
#[derive(Debug, Clone)]
pub struct FinalizedBuild {
    pub items: Vec<EntityRecord>,
}

pub fn finalize_build(state: &BuildState, matrix: &PowerLimitMatrix) -> FinalizedBuild {
    let mut items = Vec::new();
    if let Some(occupation) = &state.occupation {
        items.push(occupation.clone());
    }
    if let Some(origin) = &state.origin {
        items.push(origin.clone());
    }

    let grants = grants::granted_entities(state.occupation.as_ref(), state.origin.as_ref());

    let granted_of = |kind: EntityKind| -> Vec<EntityRecord> {
        grants
            .iter()
            .filter(|g| g.entity.kind == kind)
            .map(|g| g.entity.clone())
            .collect()
    };

    let mut traits = granted_of(EntityKind::Trait);
    traits.extend(state.selected_traits.iter().cloned());
    items.extend(dedup_by_name(traits));

    let mut tags = granted_of(EntityKind::Tag);
    tags.extend(state.selected_tags.iter().cloned());
    items.extend(dedup_by_name(tags));

    // Powers: occupation grants in full, origin grants up to the budget cap,
    // then the user's picks minus anything already granted, with numbered
    // series collapsed to their highest tier.
    let limit = matrix.power_limit(state.rank, state.distinct_non_basic_groups());
    let mut granted_powers: Vec<EntityRecord> = grants
        .iter()
        .filter(|g| g.granted_by == GrantedBy::Occupation && g.entity.kind == EntityKind::Power)
        .map(|g| g.entity.clone())
        .collect();
    granted_powers.extend(grants::origin_consumed_powers(&grants, limit));

    let granted_names: HashSet<String> = granted_powers
        .iter()
        .map(|p| p.name.to_lowercase())
        .collect();
    let chosen: Vec<EntityRecord> = state
        .chosen_powers
        .iter()
        .filter(|p| !granted_names.contains(&p.name.to_lowercase()))
        .cloned()
        .collect();

    let combined: Vec<EntityRecord> = granted_powers.iter().chain(chosen.iter()).cloned().collect();
    let kept_names: HashSet<String> = collapse_series(&combined)
        .iter()
        .map(|p| p.name.to_lowercase())
        .collect();

    items.extend(
        granted_powers
            .into_iter()
            .filter(|p| kept_names.contains(&p.name.to_lowercase())),
    );
    items.extend(
        chosen
            .into_iter()
            .filter(|p| kept_names.contains(&p.name.to_lowercase())),
    );

    FinalizedBuild { items }
}

fn dedup_by_name(records: Vec<EntityRecord>) -> Vec<EntityRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let key = r.name.trim().to_lowercase();
            !key.is_empty() && seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power_in(name: &str, group: &str) -> EntityRecord {
        let mut p = EntityRecord::new(EntityKind::Power, name);
        p.group_label = group.to_string();
        p
    }

    fn names_of_kind(build: &FinalizedBuild, kind: EntityKind) -> Vec<String> {
        build
            .items
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.name.clone())
            .collect()
    }

    #[test]
    fn composes_occupation_origin_grants_and_picks() {
        let mut occupation = EntityRecord::new(EntityKind::Occupation, "Scientist");
        occupation.granted_traits = vec![EntityRecord::new(EntityKind::Trait, "Genius")];
        let mut origin = EntityRecord::new(EntityKind::Origin, "Mutant");
        origin.granted_tags = vec![EntityRecord::new(EntityKind::Tag, "X-Gene")];

        let mut state = BuildState::new();
        state.occupation = Some(occupation);
        state.origin = Some(origin);
        state
            .selected_traits
            .push(EntityRecord::new(EntityKind::Trait, "Genius"));
        state
            .selected_traits
            .push(EntityRecord::new(EntityKind::Trait, "Brave"));
        state.choose_power(power_in("Punch", "Basic"));

        let build = finalize_build(&state, &PowerLimitMatrix::default());
        assert_eq!(
            names_of_kind(&build, EntityKind::Trait),
            vec!["Genius".to_string(), "Brave".to_string()]
        );
        assert_eq!(names_of_kind(&build, EntityKind::Tag), vec!["X-Gene".to_string()]);
        assert_eq!(names_of_kind(&build, EntityKind::Power), vec!["Punch".to_string()]);
        assert_eq!(build.items[0].kind, EntityKind::Occupation);
        assert_eq!(build.items[1].kind, EntityKind::Origin);
    }

    #[test]
    fn numbered_series_collapse_at_finalization() {
        let mut state = BuildState::new();
        state.set_rank(3);
        state.choose_power(power_in("Jump 1", "Super-Strength"));
        state.choose_power(power_in("Jump 2", "Super-Strength"));
        state.choose_power(power_in("Jump 3", "Super-Strength"));
        state.choose_power(power_in("Swing", "Super-Strength"));
        let build = finalize_build(&state, &PowerLimitMatrix::default());
        assert_eq!(
            names_of_kind(&build, EntityKind::Power),
            vec!["Jump 3".to_string(), "Swing".to_string()]
        );
    }

    #[test]
    fn chosen_power_loses_to_granted_series_sibling() {
        let mut origin = EntityRecord::new(EntityKind::Origin, "Mutant");
        origin.granted_powers = vec![power_in("Jump 2", "Super-Strength")];
        let mut state = BuildState::new();
        state.origin = Some(origin);
        state.choose_power(power_in("Jump 1", "Super-Strength"));
        let build = finalize_build(&state, &PowerLimitMatrix::default());
        assert_eq!(
            names_of_kind(&build, EntityKind::Power),
            vec!["Jump 2".to_string()]
        );
    }

    #[test]
    fn origin_grants_past_the_cap_do_not_finalize() {
        // Rank 1 limit 4, origin grants 5: the alphabetical head is kept.
        let mut origin = EntityRecord::new(EntityKind::Origin, "Cosmic");
        origin.granted_powers = vec![
            power_in("Echo", "Basic"),
            power_in("Alpha", "Basic"),
            power_in("Delta", "Basic"),
            power_in("Bravo", "Basic"),
            power_in("Charlie", "Basic"),
        ];
        let mut state = BuildState::new();
        state.origin = Some(origin);
        let build = finalize_build(&state, &PowerLimitMatrix::default());
        assert_eq!(
            names_of_kind(&build, EntityKind::Power),
            vec![
                "Alpha".to_string(),
                "Bravo".to_string(),
                "Charlie".to_string(),
                "Delta".to_string()
            ]
        );
    }
}
