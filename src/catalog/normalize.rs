//! Free-text canonicalization used for cross-source equality.

/// Replace en/em dashes with a plain hyphen, collapse whitespace runs to a
/// single space and trim. Idempotent.
pub fn normalize_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for ch in text.chars() {
        let ch = match ch {
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        };
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

/// De-duplication key for non-power entities.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// De-duplication key for powers: name and power set together.
pub fn power_key(name: &str, group_label: &str) -> String {
    format!(
        "{}::{}",
        name.trim().to_lowercase(),
        normalize_label(group_label).trim().to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_dashes_and_whitespace() {
        assert_eq!(normalize_label("Spider\u{2013}Powers"), "Spider-Powers");
        assert_eq!(normalize_label("Spider\u{2014}Powers"), "Spider-Powers");
        assert_eq!(normalize_label("  Super   Strength  "), "Super Strength");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "Spider\u{2013}Powers",
            "  a \u{2014} b  c ",
            "plain",
            "",
            "   ",
            "tabs\tand\nnewlines",
        ];
        for s in samples {
            let once = normalize_label(s);
            assert_eq!(normalize_label(&once), once);
        }
    }

    #[test]
    fn power_key_folds_case_and_typography() {
        assert_eq!(
            power_key(" Jump 1 ", "Spider\u{2013}Powers"),
            power_key("jump 1", "spider-powers")
        );
        assert_ne!(
            power_key("Jump 1", "Spider-Powers"),
            power_key("Jump 1", "Super-Strength")
        );
    }
}
