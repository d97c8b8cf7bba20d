pub mod finalize;
pub mod state;

pub use finalize::{finalize_build, FinalizedBuild};
pub use state::{
    ability_points_for_rank, max_ability_for_rank, AbilityKey, AbilityScores, BuildState,
    MIN_ABILITY,
};
