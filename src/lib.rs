// Re-export core modules for use by the binary or other consumers
pub mod builder;
pub mod catalog;
pub mod rules;
pub mod session;

// Expose the types a wizard front end needs for interaction
pub use crate::builder::{finalize_build, BuildState, FinalizedBuild};
pub use crate::catalog::{CatalogService, EntityKind, EntityRecord};
pub use crate::rules::{can_select_power, PowerLimitMatrix, SelectionVerdict};
pub use crate::session::{WizardSession, WizardStep};
