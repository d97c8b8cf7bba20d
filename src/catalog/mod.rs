pub mod base;
pub mod entity;
pub mod merge;
pub mod normalize;
pub mod repository;
pub mod sqlite;

pub use base::{BaseCatalogError, JsonBaseCatalog};
pub use entity::{
    validate_records, EntityKind, EntityRecord, ParseKindError, SourceOrigin, BASIC_GROUP,
};
pub use merge::merge_catalog;
pub use normalize::{name_key, normalize_label, power_key};
pub use repository::{CatalogService, EmptySource, EntitySource};
pub use sqlite::SqliteCompendium;
