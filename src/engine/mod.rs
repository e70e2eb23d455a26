//! Catalog reconciliation: which profiles seen in production have photos,
//! and fuzzy ranking of profile names.
//!
//! Every operation here is a pure function of an immutable record snapshot,
//! a photo index snapshot and, for search, a catalog listing.
//!
//! CHANGELOG:
//! - 12/11/2025 - Recent profiles and history search share the pager
//! - 30/10/2025 - Initial missing-profiles scan and catalog search

pub mod missing;
pub mod recent;
pub mod search;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::matching::split_profiles_opt;
use crate::photos::{PhotoEntry, PhotoIndex};

pub use missing::{missing_profiles, MissingProfile};
pub use recent::{recent_profiles, RecentProfile};
pub use search::{search, search_history, usage_counts, HistoryHit, SearchHit};

/// One page of an accumulated result list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub entries: Vec<T>,
    pub total: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Zero results, used when the record source cannot be read.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
            has_more: false,
        }
    }

    /// Cut `[offset, offset + page_size)` out of the full list.
    pub fn paginate(all: Vec<T>, page_size: usize, offset: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::InvalidPage);
        }
        let total = all.len();
        let entries = all.into_iter().skip(offset).take(page_size).collect();
        Ok(Self {
            entries,
            total,
            has_more: offset.saturating_add(page_size) < total,
        })
    }
}

/// Photo refs of the first token in `field` that has a photo.
pub fn photo_for<'a>(field: Option<&str>, index: &'a PhotoIndex) -> Option<&'a PhotoEntry> {
    split_profiles_opt(field)
        .iter()
        .find_map(|token| index.get(token).filter(|e| e.has_photo()))
}

/// Whether any profile named in `field` has a photo.
pub fn has_photo(field: Option<&str>, index: &PhotoIndex) -> bool {
    photo_for(field, index).is_some()
}
