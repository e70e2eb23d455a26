//! Catalog query helpers - shared between CLI commands, the HTTP service and
//! the bot's backend.
//!
//! These functions accept `&Connection` so callers decide whether to hold a
//! long-lived connection (server) or open one per invocation (CLI).
//!
//! CHANGELOG:
//! - 14/11/2025 - Photo sync mirrors the photo index, clears stale refs
//! - 05/11/2025 - Priority substring search through normalize()
//! - 28/10/2025 - Initial catalog helpers

use std::collections::HashMap;
use std::io::Read;

use chrono::Utc;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::queries;
use crate::error::{Error, Result};
use crate::matching::normalize;
use crate::photos::{PhotoEntry, PhotoIndex};

// ============================================================================
// Data Structures
// ============================================================================

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogProfile {
    pub id: i64,
    pub name: String,
    pub quantity_per_hanger: Option<i64>,
    pub length: Option<f64>,
    pub notes: Option<String>,
    pub photo_thumb: Option<String>,
    pub photo_full: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub usage_count: i64,
}

/// Fields to create or change. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub quantity_per_hanger: Option<i64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photo_thumb: Option<String>,
    #[serde(default)]
    pub photo_full: Option<String>,
    #[serde(default)]
    pub usage_count: Option<i64>,
}

/// Whether an upsert created a row or changed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Sort order for `list_profiles`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    #[default]
    Updated,
    Usage,
    Name,
    PhotosFirst,
    PhotosLast,
}

impl ListOrder {
    fn order_by(self) -> &'static str {
        match self {
            ListOrder::Updated => "updated_at DESC, name ASC",
            ListOrder::Usage => "usage_count DESC, name ASC",
            ListOrder::Name => "name ASC",
            ListOrder::PhotosFirst => {
                "CASE WHEN photo_thumb IS NOT NULL OR photo_full IS NOT NULL THEN 0 ELSE 1 END, \
                 updated_at DESC, name ASC"
            }
            ListOrder::PhotosLast => {
                "CASE WHEN photo_thumb IS NOT NULL OR photo_full IS NOT NULL THEN 1 ELSE 0 END, \
                 updated_at DESC, name ASC"
            }
        }
    }
}

/// Result of mirroring the photo index into the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhotoSyncStats {
    pub total_profiles: usize,
    pub with_photo: usize,
    pub updated: usize,
}

/// Result of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

fn now_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn row_to_profile(row: &Row) -> rusqlite::Result<CatalogProfile> {
    Ok(CatalogProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        quantity_per_hanger: row.get(2)?,
        length: row.get(3)?,
        notes: row.get(4)?,
        photo_thumb: row.get(5)?,
        photo_full: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        usage_count: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
    })
}

/// LIKE pattern for a normalized substring, with wildcards escaped.
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in normalize(query.trim()).chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// ============================================================================
// Single Profile Helpers
// ============================================================================

/// Fetch a profile by exact name.
pub fn get_profile(conn: &Connection, name: &str) -> Result<Option<CatalogProfile>> {
    let profile = conn
        .query_row(queries::GET_PROFILE, params![name.trim()], row_to_profile)
        .optional()?;
    Ok(profile)
}

/// Create the profile or change only the supplied fields of an existing one.
pub fn upsert_profile(conn: &Connection, update: &ProfileUpdate) -> Result<UpsertOutcome> {
    let name = update.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidProfileName(update.name.clone()));
    }

    if get_profile(conn, name)?.is_none() {
        conn.execute(
            queries::INSERT_PROFILE,
            params![
                name,
                update.quantity_per_hanger,
                update.length,
                update.notes,
                update.photo_thumb,
                update.photo_full,
                update.usage_count.unwrap_or(0),
            ],
        )?;
        info!(profile = %name, "catalog profile created");
        return Ok(UpsertOutcome::Created);
    }

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();
    if let Some(q) = update.quantity_per_hanger {
        sets.push("quantity_per_hanger = ?");
        values.push(SqlValue::Integer(q));
    }
    if let Some(l) = update.length {
        sets.push("length = ?");
        values.push(SqlValue::Real(l));
    }
    if let Some(n) = &update.notes {
        sets.push("notes = ?");
        values.push(SqlValue::Text(n.clone()));
    }
    if let Some(t) = &update.photo_thumb {
        sets.push("photo_thumb = ?");
        values.push(SqlValue::Text(t.clone()));
    }
    if let Some(f) = &update.photo_full {
        sets.push("photo_full = ?");
        values.push(SqlValue::Text(f.clone()));
    }
    if let Some(u) = update.usage_count {
        sets.push("usage_count = ?");
        values.push(SqlValue::Integer(u));
    }
    sets.push("updated_at = ?");
    values.push(SqlValue::Text(now_timestamp()));
    values.push(SqlValue::Text(name.to_string()));

    let sql = format!("UPDATE profiles SET {} WHERE name = ?", sets.join(", "));
    conn.execute(&sql, params_from_iter(values))?;
    debug!(profile = %name, fields = sets.len() - 1, "catalog profile updated");
    Ok(UpsertOutcome::Updated)
}

/// Delete by name. Returns whether a row was removed.
pub fn delete_profile(conn: &Connection, name: &str) -> Result<bool> {
    let removed = conn.execute(queries::DELETE_PROFILE, params![name.trim()])? > 0;
    if removed {
        info!(profile = %name.trim(), "catalog profile deleted");
    }
    Ok(removed)
}

/// Rename a profile. Fails when `old` is unknown or `new` is taken.
pub fn rename_profile(conn: &Connection, old: &str, new: &str) -> Result<()> {
    let (old, new) = (old.trim(), new.trim());
    if new.is_empty() {
        return Err(Error::InvalidProfileName(new.to_string()));
    }
    if get_profile(conn, old)?.is_none() {
        return Err(Error::ProfileNotFound(old.to_string()));
    }
    if old != new && get_profile(conn, new)?.is_some() {
        return Err(Error::ProfileExists(new.to_string()));
    }
    conn.execute(queries::RENAME_PROFILE, params![new, now_timestamp(), old])?;
    info!(from = %old, to = %new, "catalog profile renamed");
    Ok(())
}

/// Point a profile's photo refs at `entry`. Returns whether the profile exists.
pub fn set_photos(conn: &Connection, name: &str, entry: &PhotoEntry) -> Result<bool> {
    let changed = conn.execute(
        queries::SET_PHOTOS,
        params![entry.thumbnail, entry.full, now_timestamp(), name.trim()],
    )?;
    Ok(changed > 0)
}

// ============================================================================
// Listing and Search Helpers
// ============================================================================

/// All profiles in `order`, optionally limited.
pub fn list_profiles(
    conn: &Connection,
    order: ListOrder,
    limit: Option<usize>,
) -> Result<Vec<CatalogProfile>> {
    let sql = format!(
        "SELECT {} FROM profiles ORDER BY {} LIMIT ?1",
        queries::PROFILE_COLUMNS,
        order.order_by()
    );
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(&sql)?;
    let profiles = stmt
        .query_map(params![limit], row_to_profile)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(profiles)
}

/// Substring search over name, notes, quantity and length, script-insensitive.
///
/// Name hits come first, then notes hits, then numeric field hits; within a
/// tier higher usage wins.
pub fn search_profiles(conn: &Connection, query: &str) -> Result<Vec<CatalogProfile>> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(queries::SEARCH_PROFILES)?;
    let profiles = stmt
        .query_map(params![like_pattern(query)], row_to_profile)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(profiles)
}

// ============================================================================
// Bulk Helpers
// ============================================================================

/// Store usage counts for the named profiles. Names not in the catalog are
/// ignored. Returns the number of rows changed.
pub fn set_usage_counts(conn: &mut Connection, counts: &HashMap<String, i64>) -> Result<usize> {
    let tx = conn.transaction()?;
    let mut changed = 0;
    {
        let mut stmt = tx.prepare(queries::SET_USAGE_COUNT)?;
        for (name, count) in counts {
            changed += stmt.execute(params![count, name])?;
        }
    }
    tx.commit()?;
    info!(changed, "usage counts stored");
    Ok(changed)
}

/// Make every profile's photo refs match the photo index.
pub fn sync_photos(conn: &mut Connection, index: &PhotoIndex) -> Result<PhotoSyncStats> {
    let rows: Vec<(String, Option<String>, Option<String>)> = {
        let mut stmt = conn.prepare(queries::ALL_NAMES_AND_PHOTOS)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    let mut stats = PhotoSyncStats {
        total_profiles: rows.len(),
        ..Default::default()
    };
    let now = now_timestamp();
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(queries::SET_PHOTOS)?;
        for (name, thumb, full) in rows {
            let entry = index.get(&name).cloned().unwrap_or_default();
            if entry.has_photo() {
                stats.with_photo += 1;
            }
            if entry.thumbnail != thumb || entry.full != full {
                stmt.execute(params![entry.thumbnail, entry.full, now, name])?;
                stats.updated += 1;
            }
        }
    }
    tx.commit()?;
    info!(
        total = stats.total_profiles,
        with_photo = stats.with_photo,
        updated = stats.updated,
        "catalog photos synced"
    );
    Ok(stats)
}

fn csv_cell(record: &csv::StringRecord, i: usize) -> Option<&str> {
    record.get(i).map(str::trim).filter(|c| !c.is_empty())
}

/// Load `name,quantity_per_hanger,length,notes` rows. The first row is a
/// header. Malformed numbers are stored as absent; rows without a name are
/// skipped.
pub fn import_csv<R: Read>(conn: &mut Connection, reader: R) -> Result<ImportStats> {
    let mut rows = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut stats = ImportStats::default();
    let tx = conn.transaction()?;
    for record in rows.records() {
        let record = record?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let Some(name) = csv_cell(&record, 0) else {
            stats.skipped += 1;
            continue;
        };
        let update = ProfileUpdate {
            name: name.to_string(),
            quantity_per_hanger: csv_cell(&record, 1).and_then(|q| q.parse().ok()),
            length: csv_cell(&record, 2).and_then(|l| l.replace(',', ".").parse().ok()),
            notes: csv_cell(&record, 3).map(str::to_string),
            ..Default::default()
        };
        upsert_profile(&tx, &update)?;
        stats.imported += 1;
    }
    tx.commit()?;
    info!(imported = stats.imported, skipped = stats.skipped, "catalog CSV imported");
    Ok(stats)
}
