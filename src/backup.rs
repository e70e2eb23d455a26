//! Timestamped snapshots of the catalog database and the photo folder.
//!
//! Each backup is a directory `backup_YYYYmmdd_HHMMSS` holding `profiles.db`,
//! `images/` and a `metadata.json` describing what was copied.

use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::Result;

pub const METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub timestamp: String,
    pub datetime: String,
    pub backed_up: Vec<String>,
    pub db_exists: bool,
    pub images_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub metadata: BackupMetadata,
}

/// Copy `catalog_db` and `photo_dir` into a new directory under `backup_root`.
///
/// The database is written with `VACUUM INTO`, so a server holding the
/// catalog open does not produce a torn copy.
pub fn create_backup(catalog_db: &Path, photo_dir: &Path, backup_root: &Path) -> Result<BackupReport> {
    let now = Local::now();
    let timestamp = now.format("%Y%m%d_%H%M%S").to_string();
    let path = backup_root.join(format!("backup_{timestamp}"));
    std::fs::create_dir_all(&path)?;

    let mut backed_up = Vec::new();

    let db_exists = catalog_db.is_file();
    if db_exists {
        let target = path.join("profiles.db");
        let conn = Connection::open(catalog_db)?;
        conn.execute("VACUUM INTO ?1", [target.to_string_lossy().as_ref()])?;
        info!(db = %catalog_db.display(), "catalog backed up");
        backed_up.push("profiles.db".to_string());
    } else {
        warn!(db = %catalog_db.display(), "catalog database not found");
    }

    let images_count = if photo_dir.is_dir() {
        let copied = copy_dir(photo_dir, &path.join("images"))?;
        if copied > 0 {
            info!(files = copied, "photos backed up");
            backed_up.push("images".to_string());
        }
        copied
    } else {
        warn!(dir = %photo_dir.display(), "photo directory not found");
        0
    };

    let metadata = BackupMetadata {
        timestamp,
        datetime: now.to_rfc3339(),
        backed_up,
        db_exists,
        images_count,
    };
    std::fs::write(
        path.join(METADATA_FILE),
        serde_json::to_string_pretty(&metadata)?,
    )?;

    info!(path = %path.display(), "backup completed");
    Ok(BackupReport { path, metadata })
}

/// Recursively copy regular files, returning how many were copied.
fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}
