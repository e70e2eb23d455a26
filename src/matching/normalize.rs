//! Cross-script text normalization.
//!
//! Operators type profile names with a mix of Cyrillic and Latin look-alike
//! letters ("СР-100" vs "CP-100"). Everything is folded to lowercase Latin
//! so both spellings land on the same canonical string.
//!
//! CHANGELOG:
//! - 19/11/2025 - п folds to p
//! - 03/11/2025 - Settled on Latin as the single canonical target
//! - 28/10/2025 - Initial lookup table

/// Lowercase Cyrillic letters that look like a Latin letter, paired with
/// that Latin letter. Applied after lowercasing, so uppercase forms are
/// covered too.
pub const CONFUSABLES: &[(char, char)] = &[
    ('а', 'a'),
    ('в', 'b'),
    ('с', 'c'),
    ('е', 'e'),
    ('н', 'h'),
    ('к', 'k'),
    ('м', 'm'),
    ('о', 'o'),
    ('р', 'p'),
    ('п', 'p'),
    ('т', 't'),
    ('х', 'x'),
    ('у', 'y'),
];

fn canonical(c: char) -> char {
    CONFUSABLES
        .iter()
        .find(|(cyr, _)| *cyr == c)
        .map(|(_, lat)| *lat)
        .unwrap_or(c)
}

/// Normalize text for matching: lowercase, then fold Cyrillic look-alikes
/// onto Latin. Digits, punctuation and unmapped letters pass through.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().chars().map(canonical).collect()
}

/// `normalize` for optional input; absent text is the empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_latin() {
        assert_eq!(normalize("HELLO"), "hello");
        assert_eq!(normalize("CYP"), "cyp");
    }

    #[test]
    fn test_cyrillic_folds_to_latin() {
        assert_eq!(normalize("СУП"), "cyp");
        assert_eq!(normalize("СУП"), normalize("CYP"));
        assert_eq!(normalize("СР"), "cp");
        assert_eq!(normalize("СА"), "ca");
    }

    #[test]
    fn test_every_pair_collapses() {
        for (cyr, lat) in CONFUSABLES {
            let upper_cyr: String = cyr.to_uppercase().collect();
            let upper_lat: String = lat.to_uppercase().collect();
            let expected = normalize(&lat.to_string());
            assert_eq!(normalize(&cyr.to_string()), expected, "{cyr}");
            assert_eq!(normalize(&upper_cyr), expected, "{upper_cyr}");
            assert_eq!(normalize(&upper_lat), expected, "{upper_lat}");
        }
    }

    #[test]
    fn test_mixed_script_profiles_match() {
        assert_eq!(normalize("CP-100"), normalize("СР-100"));
        assert_eq!(normalize("ЮП-1625"), "юp-1625");
    }

    #[test]
    fn test_idempotent() {
        for s in ["", "CP-100", "СР-100", "ЮП-1625 + юп_3233", "Корпус Ёлка", "x1 Y2"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "{s}");
        }
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(normalize("12-34_56"), "12-34_56");
        assert_eq!(normalize("юж"), "юж");
    }

    #[test]
    fn test_absent_is_empty() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize_opt(Some("")), "");
        assert_eq!(normalize(""), "");
    }
}
