//! Production records read from the hanger sheet.
//!
//! CHANGELOG:
//! - 10/11/2025 - Added explicit RecordCache keyed by source freshness token
//! - 28/10/2025 - Initial record model and JSON export source

pub mod cache;
pub mod parse;
pub mod source;
pub mod view;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::error::Result;

pub use cache::RecordCache;
pub use source::JsonRecordSource;

/// Spreadsheet row of the first data record (row 1 is the header).
pub const FIRST_DATA_ROW: usize = 2;

/// Quantity cell: usually a count, sometimes free text like "30+30".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Quantity {
    Count(i64),
    Text(String),
}

/// One row of the sheet. Never mutated after being read.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Record {
    /// Position in the source, 0-based.
    pub row: usize,
    pub date: Option<NaiveDate>,
    pub sequence_number: Option<String>,
    pub time_of_day: Option<NaiveTime>,
    pub profile_field: Option<String>,
    pub client: Option<String>,
    pub color: Option<String>,
    pub material_type: Option<String>,
    pub kpz_number: Option<String>,
    pub lamels_qty: Option<Quantity>,
}

impl Record {
    /// Row number as shown in the spreadsheet.
    pub fn row_number(&self) -> usize {
        self.row + FIRST_DATA_ROW
    }

    /// Trimmed profile field, `None` when blank.
    pub fn profile(&self) -> Option<&str> {
        self.profile_field
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// Supplier of records in sheet order (oldest first).
pub trait RecordSource: Send + Sync {
    /// Every record in the source.
    fn read_all(&self) -> Result<Vec<Record>>;

    /// The last `n` records. Sources that can seek should override this.
    fn read_recent(&self, n: usize) -> Result<Vec<Record>> {
        let all = self.read_all()?;
        let start = all.len().saturating_sub(n);
        Ok(all.into_iter().skip(start).collect())
    }

    /// Freshness token; changes whenever the underlying data changes.
    fn cache_key(&self) -> Result<String>;
}

/// Last `window` records of a snapshot.
pub fn recent_window(records: &[Record], window: usize) -> &[Record] {
    &records[records.len().saturating_sub(window)..]
}
