//! JSON export of the hanger sheet.
//!
//! The sheet is exported as an array of row objects. Keys follow the column
//! names used by the web view; unknown keys are ignored.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde_json::{Map, Value};

use super::{parse, Record, RecordSource};
use crate::error::Result;

/// Reads records from a JSON file holding an array of row objects.
pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Build a record from one row object. Malformed cells become `None`.
pub fn record_from_row(row: usize, obj: &Map<String, Value>) -> Record {
    Record {
        row,
        date: parse::date(obj.get("date")),
        sequence_number: parse::text(obj.get("number")),
        time_of_day: parse::time(obj.get("time")),
        profile_field: parse::text(obj.get("profile")),
        client: parse::text(obj.get("client")),
        color: parse::text(obj.get("color")),
        material_type: parse::text(obj.get("material_type")),
        kpz_number: parse::text(obj.get("kpz_number")),
        lamels_qty: parse::quantity(obj.get("lamels_qty")),
    }
}

/// Parse an exported sheet. Non-object rows keep their position but carry
/// no data, so row numbers stay aligned with the sheet.
pub fn parse_rows(content: &str) -> Result<Vec<Record>> {
    let rows: Vec<Value> = serde_json::from_str(content)?;
    Ok(rows
        .iter()
        .enumerate()
        .map(|(i, v)| match v.as_object() {
            Some(obj) => record_from_row(i, obj),
            None => Record { row: i, ..Default::default() },
        })
        .collect())
}

impl RecordSource for JsonRecordSource {
    fn read_all(&self) -> Result<Vec<Record>> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_rows(&content)
    }

    fn cache_key(&self) -> Result<String> {
        let modified = std::fs::metadata(&self.path)?.modified()?;
        let nanos = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Ok(nanos.to_string())
    }
}
