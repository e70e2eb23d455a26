//! Lenient cell parsing.
//!
//! The sheet is edited by hand, so every cell is loosely typed: dates come as
//! ISO strings or `dd.mm.yy`, numbers as numbers or strings. Anything that
//! does not parse is treated as absent.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use super::Quantity;

// Two-digit years first: `%Y` would happily read "25" as year 25.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%y", "%d.%m.%Y", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"];

/// Non-empty trimmed text. Numbers are rendered without a trailing `.0`.
pub fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Calendar date from a date or datetime string.
pub fn date(value: Option<&Value>) -> Option<NaiveDate> {
    let raw = text(value)?;
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&raw, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Time of day, `HH:MM` with optional seconds and fraction.
pub fn time(value: Option<&Value>) -> Option<NaiveTime> {
    let raw = text(value)?;
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&raw, fmt).ok())
}

/// Quantity cell: a count when numeric, otherwise the raw text ("30+30").
pub fn quantity(value: Option<&Value>) -> Option<Quantity> {
    match value? {
        Value::Number(n) => n.as_f64().map(|f| Quantity::Count(f as i64)),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.replace(',', ".").parse::<f64>() {
                Ok(f) if f.is_finite() => Some(Quantity::Count(f as i64)),
                _ => Some(Quantity::Text(s.to_string())),
            }
        }
        _ => None,
    }
}
