//! SQLite connection management for the profile catalog.
//!
//! CHANGELOG:
//! - 05/11/2025 - Register normalize() SQL function for cross-script LIKE search
//! - 28/10/2025 - Initial schema

use std::path::Path;
use std::time::Duration;

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use tracing::debug;

use super::queries;
use crate::error::Result;
use crate::matching::normalize_opt;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Open (creating if needed) the catalog database at `path`.
pub fn open_catalog(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    prepare(&conn)?;
    debug!(path = %path.display(), "catalog database opened");
    Ok(conn)
}

/// In-memory catalog, for tests and dry runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    prepare(&conn)?;
    Ok(conn)
}

fn prepare(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.create_scalar_function(
        "normalize",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(normalize_opt(text.as_deref()))
        },
    )?;
    conn.execute_batch(queries::SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_function_registered() {
        let conn = open_in_memory().unwrap();
        let folded: String = conn
            .query_row("SELECT normalize('СР-100')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "cp-100");
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("profiles.db");
        open_catalog(&path).unwrap();
        assert!(path.exists());
        // reopening keeps the schema idempotent
        open_catalog(&path).unwrap();
    }
}
