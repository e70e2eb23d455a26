//! Profiles seen in the most recent records, with their photo status.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use super::{photo_for, Page};
use crate::error::Result;
use crate::photos::PhotoIndex;
use crate::records::{recent_window, Record};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentProfile {
    pub profile: String,
    pub date: Option<NaiveDate>,
    pub sequence_number: Option<String>,
    pub time_of_day: Option<NaiveTime>,
    pub row_number: usize,
    pub has_photo: bool,
    pub thumbnail: Option<String>,
    pub full: Option<String>,
}

/// Distinct profile fields among the last `window` records, newest first.
pub fn recent_profiles(
    records: &[Record],
    index: &PhotoIndex,
    window: usize,
    page_size: usize,
    offset: usize,
) -> Result<Page<RecentProfile>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut recent = Vec::new();

    for record in recent_window(records, window).iter().rev() {
        let Some(profile) = record.profile() else {
            continue;
        };
        if !seen.insert(profile) {
            continue;
        }
        let photo = photo_for(Some(profile), index).cloned().unwrap_or_default();
        recent.push(RecentProfile {
            profile: profile.to_string(),
            date: record.date,
            sequence_number: record.sequence_number.clone(),
            time_of_day: record.time_of_day,
            row_number: record.row_number(),
            has_photo: photo.has_photo(),
            thumbnail: photo.thumbnail,
            full: photo.full,
        });
    }

    Page::paginate(recent, page_size, offset)
}
