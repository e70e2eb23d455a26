//! Split composite profile fields into individual profile names.
//!
//! A single spreadsheet cell may list several parts hung together:
//! "ЮП-1625 + ЮП-3233", "A-1, A-2", "B-7;B-8" or names separated by a run
//! of spaces.

use std::sync::LazyLock;

use regex::Regex;

/// Shortest token that can name a profile.
pub const MIN_TOKEN_CHARS: usize = 2;

/// `+`, `,` or `;` with optional surrounding whitespace, or 2+ whitespace.
static RE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[+,;]\s*|\s{2,}").expect("Invalid regex"));

/// Split a raw profile field into tokens, in order of appearance.
///
/// Pieces are trimmed; empty pieces and pieces shorter than
/// `MIN_TOKEN_CHARS` are dropped.
pub fn split_profiles(raw: &str) -> Vec<String> {
    RE_SEPARATOR
        .split(raw)
        .map(str::trim)
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(String::from)
        .collect()
}

/// `split_profiles` for optional input.
pub fn split_profiles_opt(raw: Option<&str>) -> Vec<String> {
    raw.map(split_profiles).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_with_spaces() {
        assert_eq!(
            split_profiles("юп-1625  +  юп-3233 + юп-1875"),
            vec!["юп-1625", "юп-3233", "юп-1875"]
        );
    }

    #[test]
    fn test_single_token() {
        assert_eq!(split_profiles("корпус"), vec!["корпус"]);
    }

    #[test]
    fn test_short_token_dropped() {
        assert_eq!(split_profiles("a + юп-009"), vec!["юп-009"]);
    }

    #[test]
    fn test_comma_semicolon_and_wide_gaps() {
        assert_eq!(
            split_profiles("A-1,A-2 ; B-7   B-8"),
            vec!["A-1", "A-2", "B-7", "B-8"]
        );
    }

    #[test]
    fn test_single_space_is_not_a_separator() {
        assert_eq!(split_profiles("ЮП 1625"), vec!["ЮП 1625"]);
    }

    #[test]
    fn test_empty_and_absent() {
        assert!(split_profiles("").is_empty());
        assert!(split_profiles("  +  ,  ").is_empty());
        assert!(split_profiles_opt(None).is_empty());
    }
}
