use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::entity::EntityRecord;

static SERIES_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)(?:\s+(\d+))\s*$").expect("Failed to compile series regex"));

/// Lower-cased family name with any trailing tier number stripped.
/// "Jump 2" and "jump 3" share the base "jump"; "Swing" is its own base.
pub fn series_base(name: &str) -> String {
    match SERIES_PATTERN.captures(name) {
        Some(caps) => caps[1].trim().to_lowercase(),
        None => name.trim().to_lowercase(),
    }
}

/// Trailing tier number, if the name carries one.
pub fn series_number(name: &str) -> Option<u32> {
    SERIES_PATTERN
        .captures(name)
        .and_then(|caps| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Collapse numbered variant families down to their highest member.
///
/// Entities sharing a base name keep only the highest-numbered entry; a
/// numbered entry displaces an unnumbered one of the same base. Unnumbered
/// names de-duplicate first-occurrence-wins. Insertion order is preserved.
pub fn collapse_series(entities: &[EntityRecord]) -> Vec<EntityRecord> {
    let mut best: Vec<(String, Option<u32>, EntityRecord)> = Vec::new();
    for entity in entities {
        let base = series_base(&entity.name);
        let number = series_number(&entity.name);
        match best.iter_mut().find(|(b, _, _)| *b == base) {
            Some((_, kept, slot)) => {
                let kept_rank = kept.map(i64::from).unwrap_or(-1);
                if let Some(n) = number {
                    if i64::from(n) > kept_rank {
                        *kept = Some(n);
                        *slot = entity.clone();
                    }
                }
            }
            None => best.push((base, number, entity.clone())),
        }
    }
    best.into_iter().map(|(_, _, entity)| entity).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::entity::EntityKind;

    fn power(name: &str) -> EntityRecord {
        EntityRecord::new(EntityKind::Power, name)
    }

    #[test]
    fn keeps_highest_numbered_member() {
        let input = vec![power("Jump 1"), power("Jump 2"), power("Jump 3"), power("Swing")];
        let out = collapse_series(&input);
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Jump 3", "Swing"]);
    }

    #[test]
    fn order_of_arrival_does_not_matter_for_the_winner() {
        let input = vec![power("Jump 3"), power("Jump 1"), power("Jump 2")];
        let out = collapse_series(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Jump 3");
    }

    #[test]
    fn numbered_displaces_unnumbered_sibling() {
        let input = vec![power("Jump"), power("Jump 2")];
        let out = collapse_series(&input);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Jump 2");
    }

    #[test]
    fn unnumbered_names_dedup_first_wins() {
        let mut first = power("Swing");
        first.description = "first".to_string();
        let mut second = power("swing");
        second.description = "second".to_string();
        let out = collapse_series(&[first, second]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "first");
    }

    #[test]
    fn base_and_number_extraction() {
        assert_eq!(series_base("Jump 12"), "jump");
        assert_eq!(series_number("Jump 12"), Some(12));
        assert_eq!(series_base("Elemental Control 2"), "elemental control");
        assert_eq!(series_number("Swing"), None);
        assert_eq!(series_base("  Swing  "), "swing");
    }
}
