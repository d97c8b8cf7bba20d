use std::path::Path;

use rusqlite::{params, Connection};
use serde::Deserialize;

use crate::catalog::entity::{EntityKind, EntityRecord};
use crate::catalog::repository::EntitySource;

/// Compendium backed by a SQLite item table. Embedded grant lists are stored
/// as a JSON column and parsed leniently: a broken column loses its grants,
/// never the row.
pub struct SqliteCompendium {
    conn: Connection,
}

#[derive(Debug, Default, Deserialize)]
struct GrantsColumn {
    #[serde(default)]
    traits: Vec<EntityRecord>,
    #[serde(default)]
    tags: Vec<EntityRecord>,
    #[serde(default)]
    powers: Vec<EntityRecord>,
}

impl SqliteCompendium {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Create the item table on a fresh database.
    pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS item (\
                 id TEXT PRIMARY KEY,\
                 kind TEXT NOT NULL,\
                 name TEXT NOT NULL,\
                 group_label TEXT,\
                 description TEXT,\
                 prerequisites TEXT,\
                 modified_at INTEGER,\
                 grants TEXT\
             )",
        )
    }
}

impl EntitySource for SqliteCompendium {
    fn fetch(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, Box<dyn std::error::Error>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, group_label, description, prerequisites, modified_at, grants \
             FROM item WHERE kind = ?1",
        )?;

        let rows = stmt.query_map(params![kind.as_str()], |row| {
            let id: Option<String> = row.get(0)?;
            let name: String = row.get(1)?;
            let group_label: Option<String> = row.get(2)?;
            let description: Option<String> = row.get(3)?;
            let prerequisites: Option<String> = row.get(4)?;
            let modified_at: Option<i64> = row.get(5)?;
            let grants_raw: Option<String> = row.get(6)?;
            Ok((id, name, group_label, description, prerequisites, modified_at, grants_raw))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (id, name, group_label, description, prerequisites, modified_at, grants_raw) =
                row?;
            let mut record = EntityRecord::new(kind, name);
            record.id = id;
            if let Some(label) = group_label {
                record.group_label = label;
            }
            record.description = description.unwrap_or_default();
            record.prerequisite_text = prerequisites;
            record.modified_at = modified_at;
            if let Some(raw) = grants_raw {
                let grants = parse_grants(&raw, record.name.as_str());
                record.granted_traits = grants.traits;
                record.granted_tags = grants.tags;
                record.granted_powers = grants.powers;
            }
            out.push(record);
        }
        Ok(out)
    }
}

fn parse_grants(raw: &str, owner: &str) -> GrantsColumn {
    match serde_json::from_str(raw) {
        Ok(grants) => grants,
        Err(err) => {
            eprintln!("Ignoring malformed grants column on '{}': {}", owner, err);
            GrantsColumn::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compendium_with(rows: &[(&str, &str, &str, Option<&str>, Option<i64>, Option<&str>)]) -> SqliteCompendium {
        let conn = Connection::open_in_memory().unwrap();
        SqliteCompendium::init_schema(&conn).unwrap();
        for (id, kind, name, group, modified, grants) in rows {
            conn.execute(
                "INSERT INTO item (id, kind, name, group_label, modified_at, grants) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, kind, name, group, modified, grants],
            )
            .unwrap();
        }
        SqliteCompendium::new(conn)
    }

    #[test]
    fn fetches_only_the_requested_kind() {
        let source = compendium_with(&[
            ("p1", "power", "Flight", Some("Basic"), Some(100), None),
            ("t1", "trait", "Brave", None, None, None),
        ]);
        let powers = source.fetch(EntityKind::Power).unwrap();
        assert_eq!(powers.len(), 1);
        assert_eq!(powers[0].name, "Flight");
        assert_eq!(powers[0].modified_at, Some(100));
        let traits = source.fetch(EntityKind::Trait).unwrap();
        assert_eq!(traits.len(), 1);
    }

    #[test]
    fn grants_column_round_trips() {
        let grants = r#"{"traits":[{"name":"Genius","kind":"trait"}],"powers":[{"name":"Gadgetry","kind":"power"}]}"#;
        let source = compendium_with(&[(
            "o1",
            "occupation",
            "Scientist",
            None,
            None,
            Some(grants),
        )]);
        let occupations = source.fetch(EntityKind::Occupation).unwrap();
        assert_eq!(occupations[0].granted_traits.len(), 1);
        assert_eq!(occupations[0].granted_powers[0].name, "Gadgetry");
        assert!(occupations[0].granted_tags.is_empty());
    }

    #[test]
    fn malformed_grants_lose_the_grants_not_the_row() {
        let source = compendium_with(&[(
            "o1",
            "occupation",
            "Scientist",
            None,
            None,
            Some("{broken"),
        )]);
        let occupations = source.fetch(EntityKind::Occupation).unwrap();
        assert_eq!(occupations.len(), 1);
        assert!(occupations[0].granted_traits.is_empty());
    }
}
