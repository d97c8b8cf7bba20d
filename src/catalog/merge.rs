use std::collections::HashMap;

use crate::catalog::entity::{EntityKind, EntityRecord};
use crate::catalog::normalize::{name_key, power_key};

/// Merge same-kind entity lists from the three data origins into one
/// de-duplicated list, sorted by name (case-insensitive).
///
/// Non-power kinds: later source wins outright (base < compendium < world).
/// Powers: keyed by (name, power set); a world record beats a compendium or
/// base record, otherwise the larger modification timestamp wins and exact
/// ties keep the existing entry.
pub fn merge_catalog(
    kind: EntityKind,
    base: Vec<EntityRecord>,
    world: Vec<EntityRecord>,
    compendium: Vec<EntityRecord>,
) -> Vec<EntityRecord> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<EntityRecord> = Vec::new();

    for record in base
        .into_iter()
        .chain(compendium.into_iter())
        .chain(world.into_iter())
    {
        let key = record_key(kind, &record);
        match slots.get(&key) {
            Some(&idx) => {
                if replaces(kind, &merged[idx], &record) {
                    merged[idx] = record;
                }
            }
            None => {
                slots.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    for record in &mut merged {
        record.canonicalize();
    }
    merged.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    merged
}

fn record_key(kind: EntityKind, record: &EntityRecord) -> String {
    match kind {
        EntityKind::Power => power_key(&record.name, &record.group_label),
        _ => name_key(&record.name),
    }
}

fn replaces(kind: EntityKind, existing: &EntityRecord, incoming: &EntityRecord) -> bool {
    if kind != EntityKind::Power {
        // Later-listed source wins outright.
        return true;
    }
    let (cur, new) = (existing.source.precedence(), incoming.source.precedence());
    if new != cur {
        return new > cur;
    }
    incoming.modified_at.unwrap_or(0) > existing.modified_at.unwrap_or(0)
}
