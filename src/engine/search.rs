//! Fuzzy ranking of profile names against a query.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::CatalogProfile;
use crate::matching::{normalize, score, split_profiles_opt, ACCEPT_THRESHOLD};
use crate::records::Record;

/// Catalog profile accepted by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub profile: CatalogProfile,
    pub score: u8,
}

/// Historical profile name accepted by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryHit {
    pub profile: String,
    pub usage_count: i64,
    pub score: u8,
}

/// Indices and scores of accepted candidates, best first: score, then usage,
/// then name for a stable order.
fn rank<T: Sync>(
    query: &str,
    items: &[T],
    name: fn(&T) -> &str,
    usage: fn(&T) -> i64,
) -> Vec<(usize, u8)> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let query = normalize(query.trim());

    let mut ranked: Vec<(usize, u8)> = items
        .par_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let s = score(&query, &normalize(name(item).trim()));
            (s >= ACCEPT_THRESHOLD).then_some((i, s))
        })
        .collect();

    ranked.sort_by(|&(a, sa), &(b, sb)| {
        sb.cmp(&sa)
            .then_with(|| usage(&items[b]).cmp(&usage(&items[a])))
            .then_with(|| name(&items[a]).cmp(name(&items[b])))
    });
    ranked
}

/// Rank catalog profiles by similarity of their name to `query`.
///
/// Returns every profile scoring at least the acceptance threshold; a blank
/// query matches nothing.
pub fn search(query: &str, profiles: &[CatalogProfile]) -> Vec<SearchHit> {
    rank(query, profiles, |p| p.name.as_str(), |p| p.usage_count)
        .into_iter()
        .map(|(i, score)| SearchHit {
            profile: profiles[i].clone(),
            score,
        })
        .collect()
}

/// Number of records mentioning each profile token. Tokens are counted once
/// per record and keyed by their trimmed text.
pub fn usage_counts(records: &[Record]) -> HashMap<String, i64> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for record in records {
        let mut tokens = split_profiles_opt(record.profile_field.as_deref());
        tokens.sort();
        tokens.dedup();
        for token in tokens {
            *counts.entry(token).or_default() += 1;
        }
    }
    counts
}

/// Rank every distinct profile token from the records, using how often each
/// was produced as the tie-breaker.
pub fn search_history(query: &str, records: &[Record]) -> Vec<HistoryHit> {
    let candidates: Vec<(String, i64)> = usage_counts(records).into_iter().collect();
    rank(query, &candidates, |c| c.0.as_str(), |c| c.1)
        .into_iter()
        .map(|(i, score)| HistoryHit {
            profile: candidates[i].0.clone(),
            usage_count: candidates[i].1,
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, usage: i64) -> CatalogProfile {
        CatalogProfile {
            name: name.into(),
            usage_count: usage,
            ..Default::default()
        }
    }

    fn record(field: &str) -> Record {
        Record {
            profile_field: Some(field.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_beats_longer_variant() {
        let catalog = vec![profile("ЮП-1625", 5), profile("юп-1625b", 9)];
        let hits = search("юп-1625", &catalog);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].profile.name, "ЮП-1625");
        assert_eq!(hits[0].score, 100);
        assert_eq!(hits[1].profile.name, "юп-1625b");
        assert_eq!(hits[1].score, 96);
    }

    #[test]
    fn test_equal_scores_ordered_by_usage() {
        // both script variants normalize to the same name
        let catalog = vec![profile("CP-100", 3), profile("СР-100", 8), profile("Z-9", 100)];
        let hits = search("cp-100", &catalog);
        let names: Vec<&str> = hits.iter().map(|h| h.profile.name.as_str()).collect();
        assert_eq!(names, vec!["СР-100", "CP-100"]);
        assert!(hits.iter().all(|h| h.score == 100));
    }

    #[test]
    fn test_results_sorted() {
        let catalog = vec![
            profile("ЮП-1625", 1),
            profile("юп-1625b", 9),
            profile("юп-16", 4),
            profile("юп-3233", 7),
            profile("A-1", 2),
            profile("юп-1626", 3),
        ];
        let hits = search("юп-1625", &catalog);
        assert!(hits.iter().all(|h| h.score >= ACCEPT_THRESHOLD));
        for pair in hits.windows(2) {
            assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score
                        && pair[0].profile.usage_count >= pair[1].profile.usage_count)
            );
        }
        assert!(!hits.iter().any(|h| h.profile.name == "A-1"));
    }

    #[test]
    fn test_blank_query() {
        let catalog = vec![profile("A-1", 1)];
        assert!(search("", &catalog).is_empty());
        assert!(search("   ", &catalog).is_empty());
    }

    #[test]
    fn test_usage_counts_once_per_record() {
        let records = vec![
            record("A-1 + A-1"),
            record("A-1 + B-2"),
            record("B-2"),
            Record::default(),
        ];
        let counts = usage_counts(&records);
        assert_eq!(counts.get("A-1"), Some(&2));
        assert_eq!(counts.get("B-2"), Some(&2));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_search_history() {
        let records = vec![
            record("юп-1625"),
            record("юп-1625b + X-1"),
            record("юп-1625b"),
            record("КОРПУС"),
        ];
        let hits = search_history("ЮП-1625", &records);
        assert_eq!(hits[0].profile, "юп-1625");
        assert_eq!(hits[0].score, 100);
        assert_eq!(hits[1].profile, "юп-1625b");
        assert_eq!(hits[1].usage_count, 2);
        assert!(!hits.iter().any(|h| h.profile == "КОРПУС"));
    }
}
