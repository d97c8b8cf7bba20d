use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::entity::{EntityKind, EntityRecord};
use crate::catalog::repository::EntitySource;

const DEFAULT_DATA_DIR: &str = "./assets/data";

#[derive(Debug)]
pub enum BaseCatalogError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
}

impl std::fmt::Display for BaseCatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaseCatalogError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path, source)
            }
            BaseCatalogError::Json { path, source } => {
                write!(f, "failed to parse {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for BaseCatalogError {}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    items: Vec<EntityRecord>,
}

/// Static dataset shipped with the module: one `<kind>s.json` document per
/// entity kind under the data directory.
pub struct JsonBaseCatalog {
    dir: PathBuf,
}

impl JsonBaseCatalog {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn default_dir() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }

    fn file_for(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(format!("{}s.json", kind.as_str()))
    }
}

pub fn parse_catalog_file(data: &str, path: &str) -> Result<Vec<EntityRecord>, BaseCatalogError> {
    let file: CatalogFile = serde_json::from_str(data).map_err(|source| BaseCatalogError::Json {
        path: path.to_string(),
        source,
    })?;
    Ok(file.items)
}

impl EntitySource for JsonBaseCatalog {
    fn fetch(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, Box<dyn std::error::Error>> {
        let path = self.file_for(kind);
        let shown = path.display().to_string();
        let data = fs::read_to_string(&path).map_err(|source| BaseCatalogError::Io {
            path: shown.clone(),
            source,
        })?;
        Ok(parse_catalog_file(&data, &shown)?)
    }
}
