//! Tiered similarity scoring for profile names.
//!
//! Both inputs are expected to be normalized already (see `normalize`).
//! Part numbers are usually referenced by prefix or with a suffix letter,
//! so containment is checked before falling back to edit distance.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use strsim::normalized_levenshtein;

/// Minimum score for a candidate to count as a match.
pub const ACCEPT_THRESHOLD: u8 = 30;

static RE_WORD_SEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_\s]+").expect("Invalid regex"));

/// Score `candidate` against `query`, 0..=100.
///
/// 1. exact → 100
/// 2. query inside candidate → 70 + 30 * |q| / |c|
/// 3. candidate inside query → 60 + 30 * |c| / |q|
/// 4. max(edit-distance ratio, word overlap ratio) * 100
///
/// Lengths are counted in chars. One side empty (but not both) → 0.
pub fn score(query: &str, candidate: &str) -> u8 {
    if query == candidate {
        return 100;
    }
    if query.is_empty() || candidate.is_empty() {
        return 0;
    }

    let q_len = query.chars().count() as f64;
    let c_len = candidate.chars().count() as f64;

    if candidate.contains(query) {
        return (70.0 + 30.0 * (q_len / c_len)) as u8;
    }
    if query.contains(candidate) {
        return (60.0 + 30.0 * (c_len / q_len)) as u8;
    }

    let sequence = (sequence_ratio(query, candidate) * 100.0) as u8;
    let overlap = (word_overlap_ratio(query, candidate) * 100.0) as u8;
    sequence.max(overlap)
}

/// Whether `score` clears the acceptance threshold.
pub fn is_match(query: &str, candidate: &str) -> bool {
    score(query, candidate) >= ACCEPT_THRESHOLD
}

/// Normalized Levenshtein similarity (0.0 - 1.0).
fn sequence_ratio(a: &str, b: &str) -> f64 {
    normalized_levenshtein(a, b)
}

fn words(s: &str) -> HashSet<&str> {
    RE_WORD_SEP.split(s).filter(|w| !w.is_empty()).collect()
}

/// Share of the query's words that also appear in the candidate.
fn word_overlap_ratio(query: &str, candidate: &str) -> f64 {
    let q_words = words(query);
    let c_words = words(candidate);
    if q_words.is_empty() || c_words.is_empty() {
        return 0.0;
    }
    let shared = q_words.intersection(&c_words).count();
    shared as f64 / q_words.len() as f64
}
