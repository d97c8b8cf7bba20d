use std::collections::{HashMap, HashSet};

use crate::catalog::entity::{validate_records, EntityKind, EntityRecord, SourceOrigin};
use crate::catalog::merge::merge_catalog;
use crate::catalog::normalize::power_key;
use crate::rules::series::series_base;

/// A repository that can produce entity records of a given kind. Implementors
/// cover the static base catalog, the world's own items and any number of
/// external compendia.
pub trait EntitySource {
    fn fetch(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, Box<dyn std::error::Error>>;
}

/// Source that never has anything. Stands in for an absent world repository.
pub struct EmptySource;

impl EntitySource for EmptySource {
    fn fetch(&self, _kind: EntityKind) -> Result<Vec<EntityRecord>, Box<dyn std::error::Error>> {
        Ok(Vec::new())
    }
}

/// Merged, cached view over the three data origins. One cache slot per kind;
/// a slot stays valid until explicitly invalidated or folded into.
pub struct CatalogService {
    base: Box<dyn EntitySource>,
    world: Box<dyn EntitySource>,
    compendia: Vec<Box<dyn EntitySource>>,
    cache: HashMap<EntityKind, Vec<EntityRecord>>,
}

impl CatalogService {
    pub fn new(base: Box<dyn EntitySource>, world: Box<dyn EntitySource>) -> Self {
        Self {
            base,
            world,
            compendia: Vec::new(),
            cache: HashMap::new(),
        }
    }

    pub fn add_compendium(&mut self, source: Box<dyn EntitySource>) {
        self.compendia.push(source);
    }

    /// The merged catalog for one kind. Fetch failures degrade to empty
    /// lists; a failing compendium is skipped without disturbing the rest.
    pub fn merged(&mut self, kind: EntityKind) -> &[EntityRecord] {
        if !self.cache.contains_key(&kind) {
            let base = fetch_or_empty(self.base.as_ref(), kind, SourceOrigin::Base);
            let world = fetch_or_empty(self.world.as_ref(), kind, SourceOrigin::World);
            let mut compendium = Vec::new();
            for source in &self.compendia {
                compendium.extend(fetch_or_empty(source.as_ref(), kind, SourceOrigin::Compendium));
            }
            self.cache
                .insert(kind, merge_catalog(kind, base, world, compendium));
        }
        self.cache.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn invalidate(&mut self, kind: EntityKind) {
        self.cache.remove(&kind);
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    pub fn refresh(&mut self, kind: EntityKind) -> &[EntityRecord] {
        self.invalidate(kind);
        self.merged(kind)
    }

    /// Fold a late-arriving fetch result into the merged view. Results may
    /// land in any order; merging the same list twice changes nothing.
    pub fn fold(&mut self, kind: EntityKind, source: SourceOrigin, records: Vec<EntityRecord>) {
        let records = validate_records(kind, source, records);
        let current = self.merged(kind).to_vec();
        let folded = match source {
            SourceOrigin::World => merge_catalog(kind, current, records, Vec::new()),
            _ => merge_catalog(kind, current, Vec::new(), records),
        };
        self.cache.insert(kind, folded);
    }

    /// Distinct non-Basic power set labels, sorted.
    pub fn power_groups(&mut self) -> Vec<String> {
        let mut groups: Vec<String> = self
            .merged(EntityKind::Power)
            .iter()
            .filter(|p| !p.is_basic())
            .map(|p| p.group_label.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        groups.sort();
        groups
    }

    /// Powers browsable under one group label. Numbered siblings of any base
    /// name present in the group are pulled in even when they belong to
    /// another set, so a family like "Jump 1/2/3" is shown together.
    pub fn powers_in_group(&mut self, group_label: &str) -> Vec<EntityRecord> {
        let wanted = group_label.trim().to_lowercase();
        let powers = self.merged(EntityKind::Power);
        let bases: HashSet<String> = powers
            .iter()
            .filter(|p| p.group_label.trim().to_lowercase() == wanted)
            .map(|p| series_base(&p.name))
            .collect();
        let mut seen = HashSet::new();
        powers
            .iter()
            .filter(|p| bases.contains(&series_base(&p.name)))
            .filter(|p| seen.insert(power_key(&p.name, &p.group_label)))
            .cloned()
            .collect()
    }
}

fn fetch_or_empty(
    source: &dyn EntitySource,
    kind: EntityKind,
    origin: SourceOrigin,
) -> Vec<EntityRecord> {
    match source.fetch(kind) {
        Ok(records) => validate_records(kind, origin, records),
        Err(err) => {
            eprintln!("Fetch of {} entities failed, continuing without: {}", kind.as_str(), err);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct ListSource {
        records: Vec<EntityRecord>,
        fetches: Rc<Cell<usize>>,
    }

    impl EntitySource for ListSource {
        fn fetch(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, Box<dyn std::error::Error>> {
            self.fetches.set(self.fetches.get() + 1);
            Ok(self
                .records
                .iter()
                .filter(|r| r.kind == kind)
                .cloned()
                .collect())
        }
    }

    struct FailingSource;

    impl EntitySource for FailingSource {
        fn fetch(&self, _kind: EntityKind) -> Result<Vec<EntityRecord>, Box<dyn std::error::Error>> {
            Err("repository unavailable".into())
        }
    }

    fn power(name: &str, group: &str) -> EntityRecord {
        let mut p = EntityRecord::new(EntityKind::Power, name);
        p.group_label = group.to_string();
        p
    }

    fn service_with(records: Vec<EntityRecord>) -> (CatalogService, Rc<Cell<usize>>) {
        let fetches = Rc::new(Cell::new(0));
        let source = ListSource {
            records,
            fetches: Rc::clone(&fetches),
        };
        (
            CatalogService::new(Box::new(source), Box::new(EmptySource)),
            fetches,
        )
    }

    #[test]
    fn merged_is_cached_until_invalidated() {
        let (mut service, fetches) = service_with(vec![power("Flight", "Basic")]);
        assert_eq!(service.merged(EntityKind::Power).len(), 1);
        let after_first = fetches.get();
        service.merged(EntityKind::Power);
        assert_eq!(fetches.get(), after_first);
        service.invalidate(EntityKind::Power);
        service.merged(EntityKind::Power);
        assert!(fetches.get() > after_first);
    }

    #[test]
    fn failing_compendium_is_skipped() {
        let (mut service, _) = service_with(vec![power("Flight", "Basic")]);
        service.add_compendium(Box::new(FailingSource));
        assert_eq!(service.merged(EntityKind::Power).len(), 1);
    }

    #[test]
    fn failing_base_still_yields_world_entities() {
        let fetches = Rc::new(Cell::new(0));
        let world = ListSource {
            records: vec![EntityRecord::new(EntityKind::Trait, "Brave")],
            fetches,
        };
        let mut service = CatalogService::new(Box::new(FailingSource), Box::new(world));
        let merged = service.merged(EntityKind::Trait);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, SourceOrigin::World);
    }

    #[test]
    fn fold_is_idempotent_and_order_tolerant() {
        let (mut service, _) = service_with(vec![power("Flight", "Basic")]);
        let late = vec![power("Jump 1", "Spider-Powers")];
        service.fold(EntityKind::Power, SourceOrigin::Compendium, late.clone());
        service.fold(EntityKind::Power, SourceOrigin::Compendium, late);
        assert_eq!(service.merged(EntityKind::Power).len(), 2);

        let mut fresh = power("Flight", "Basic");
        fresh.description = "updated".to_string();
        service.fold(EntityKind::Power, SourceOrigin::World, vec![fresh]);
        let merged = service.merged(EntityKind::Power);
        let flight = merged.iter().find(|p| p.name == "Flight").unwrap();
        assert_eq!(flight.description, "updated");
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn group_browsing_pulls_numbered_siblings() {
        let (mut service, _) = service_with(vec![
            power("Jump 1", "Super-Strength"),
            power("Jump 2", "Spider-Powers"),
            power("Web Swing", "Spider-Powers"),
            power("Punch", "Basic"),
        ]);
        assert_eq!(
            service.power_groups(),
            vec!["Spider-Powers".to_string(), "Super-Strength".to_string()]
        );
        let shown = service.powers_in_group("Super-Strength");
        let names: Vec<&str> = shown.iter().map(|p| p.name.as_str()).collect();
        assert!(names.contains(&"Jump 1"));
        assert!(names.contains(&"Jump 2"));
        assert!(!names.contains(&"Web Swing"));
    }
}
