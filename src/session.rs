//! Wizard-session glue for an ECS host. The engine itself never touches the
//! world; this layer owns the build state and hands it to the rule functions.

use bevy_ecs::prelude::*;

use crate::builder::state::BuildState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    RankAbilities,
    Occupation,
    Origin,
    TraitsTags,
    Powers,
    Review,
}

impl WizardStep {
    pub const ORDER: [WizardStep; 6] = [
        WizardStep::RankAbilities,
        WizardStep::Occupation,
        WizardStep::Origin,
        WizardStep::TraitsTags,
        WizardStep::Powers,
        WizardStep::Review,
    ];

    fn position(&self) -> usize {
        Self::ORDER.iter().position(|s| s == self).unwrap_or(0)
    }

    pub fn next(&self) -> Option<WizardStep> {
        Self::ORDER.get(self.position() + 1).copied()
    }

    pub fn prev(&self) -> Option<WizardStep> {
        self.position().checked_sub(1).map(|i| Self::ORDER[i])
    }
}

#[derive(Resource, Debug, Default)]
pub struct WizardSession {
    pub step: WizardStep,
    pub build: BuildState,
}

pub fn start_session(world: &mut World) {
    world.insert_resource(WizardSession::default());
}

/// Move forward one step. Stays on Review at the end.
pub fn advance_step(world: &mut World) -> WizardStep {
    let mut session = world.resource_mut::<WizardSession>();
    if let Some(next) = session.step.next() {
        session.step = next;
    }
    session.step
}

/// Move back one step. Stays on the first step at the start.
pub fn back_step(world: &mut World) -> WizardStep {
    let mut session = world.resource_mut::<WizardSession>();
    if let Some(prev) = session.step.prev() {
        session.step = prev;
    }
    session.step
}

/// Change rank mid-session; the build state resets its ability allocation.
pub fn set_session_rank(world: &mut World, rank: u8) {
    let mut session = world.resource_mut::<WizardSession>();
    session.build.set_rank(rank);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::state::AbilityKey;

    #[test]
    fn steps_run_in_wizard_order_and_clamp() {
        let mut world = World::new();
        start_session(&mut world);
        assert_eq!(world.resource::<WizardSession>().step, WizardStep::RankAbilities);
        assert_eq!(back_step(&mut world), WizardStep::RankAbilities);
        for expected in [
            WizardStep::Occupation,
            WizardStep::Origin,
            WizardStep::TraitsTags,
            WizardStep::Powers,
            WizardStep::Review,
        ] {
            assert_eq!(advance_step(&mut world), expected);
        }
        assert_eq!(advance_step(&mut world), WizardStep::Review);
        assert_eq!(back_step(&mut world), WizardStep::Powers);
    }

    #[test]
    fn rank_change_through_the_session_resets_abilities() {
        let mut world = World::new();
        start_session(&mut world);
        world
            .resource_mut::<WizardSession>()
            .build
            .abilities
            .set(AbilityKey::Ego, 2);
        set_session_rank(&mut world, 3);
        let session = world.resource::<WizardSession>();
        assert_eq!(session.build.rank, 3);
        assert_eq!(session.build.abilities.get(AbilityKey::Ego), 0);
    }
}
