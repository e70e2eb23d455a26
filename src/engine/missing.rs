//! Profiles that appear in production records but have no photo.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::{has_photo, Page};
use crate::error::Result;
use crate::photos::PhotoIndex;
use crate::records::Record;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingProfile {
    /// Whole trimmed profile field, possibly several profiles.
    pub profile: String,
    pub date: Option<NaiveDate>,
    pub sequence_number: Option<String>,
    pub row_number: usize,
}

/// Scan every record newest-first and page through the distinct profile
/// fields none of whose profiles has a photo.
///
/// A field is identified by its whole trimmed text, so a row naming one
/// photographed and one unphotographed profile is not reported. The scan
/// always covers the full set so `total` is exact.
pub fn missing_profiles(
    records: &[Record],
    index: &PhotoIndex,
    page_size: usize,
    offset: usize,
) -> Result<Page<MissingProfile>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut missing = Vec::new();

    for record in records.iter().rev() {
        let Some(profile) = record.profile() else {
            continue;
        };
        if !seen.insert(profile) {
            continue;
        }
        if has_photo(Some(profile), index) {
            continue;
        }
        missing.push(MissingProfile {
            profile: profile.to_string(),
            date: record.date,
            sequence_number: record.sequence_number.clone(),
            row_number: record.row_number(),
        });
    }

    Page::paginate(missing, page_size, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::index_with;
    use crate::error::Error;

    fn records(fields: &[Option<&str>]) -> Vec<Record> {
        fields
            .iter()
            .enumerate()
            .map(|(row, field)| Record {
                row,
                profile_field: field.map(str::to_string),
                sequence_number: Some(format!("{}", row + 1)),
                ..Default::default()
            })
            .collect()
    }

    fn sample() -> Vec<Record> {
        records(&[
            Some("A-1"),
            Some("B-2 + C-3"),
            None,
            Some("D-4"),
            Some(" A-1 "),
            Some("E-5 + F-6"),
            Some(""),
            Some("G-7"),
            Some("D-4"),
        ])
    }

    fn all_missing(records: &[Record], index: &PhotoIndex) -> Vec<String> {
        missing_profiles(records, index, usize::MAX, 0)
            .unwrap()
            .entries
            .into_iter()
            .map(|m| m.profile)
            .collect()
    }

    #[test]
    fn test_newest_first_distinct() {
        let index = index_with(&["c-3", "g-7"]);
        let page = missing_profiles(&sample(), &index, 10, 0).unwrap();

        let names: Vec<&str> = page.entries.iter().map(|m| m.profile.as_str()).collect();
        // "B-2 + C-3" has one photographed profile, so the field is not missing
        assert_eq!(names, vec!["D-4", "E-5 + F-6", "A-1"]);
        assert_eq!(page.total, 3);
        assert!(!page.has_more);

        // first occurrence in reverse order wins: D-4 from row 8
        assert_eq!(page.entries[0].row_number, 10);
        assert_eq!(page.entries[0].sequence_number.as_deref(), Some("9"));
    }

    #[test]
    fn test_pages_concatenate_to_full_list() {
        let index = index_with(&["c-3"]);
        let full = all_missing(&sample(), &index);

        for size in 1..=4 {
            let mut collected = Vec::new();
            let mut offset = 0;
            loop {
                let page = missing_profiles(&sample(), &index, size, offset).unwrap();
                assert_eq!(page.total, full.len());
                collected.extend(page.entries.into_iter().map(|m| m.profile));
                if !page.has_more {
                    break;
                }
                offset += size;
            }
            assert_eq!(collected, full, "page size {size}");
        }
    }

    #[test]
    fn test_never_repeats_a_field() {
        let full = all_missing(&sample(), &PhotoIndex::default());
        let distinct: HashSet<&String> = full.iter().collect();
        assert_eq!(distinct.len(), full.len());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = missing_profiles(&sample(), &PhotoIndex::default(), 0, 0);
        assert!(matches!(err, Err(Error::InvalidPage)));
    }

    #[test]
    fn test_empty_records() {
        let page = missing_profiles(&[], &PhotoIndex::default(), 5, 0).unwrap();
        assert_eq!(page, Page::empty());
    }
}
