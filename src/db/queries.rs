//! SQL for the profile catalog.

/// Table and index creation, safe to run on every open.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE NOT NULL,
    quantity_per_hanger INTEGER,
    length REAL,
    notes TEXT,
    photo_thumb TEXT,
    photo_full TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    usage_count INTEGER DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_profile_name ON profiles(name);
"#;

/// Column list shared by every SELECT, in `row_to_profile` order.
pub const PROFILE_COLUMNS: &str = "id, name, quantity_per_hanger, length, notes, \
     photo_thumb, photo_full, created_at, updated_at, usage_count";

pub const GET_PROFILE: &str = r#"
SELECT id, name, quantity_per_hanger, length, notes,
       photo_thumb, photo_full, created_at, updated_at, usage_count
FROM profiles
WHERE name = ?1
"#;

pub const INSERT_PROFILE: &str = r#"
INSERT INTO profiles (name, quantity_per_hanger, length, notes,
                      photo_thumb, photo_full, usage_count)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub const DELETE_PROFILE: &str = "DELETE FROM profiles WHERE name = ?1";

pub const RENAME_PROFILE: &str = "UPDATE profiles SET name = ?1, updated_at = ?2 WHERE name = ?3";

pub const SET_USAGE_COUNT: &str = "UPDATE profiles SET usage_count = ?1 WHERE name = ?2";

pub const SET_PHOTOS: &str =
    "UPDATE profiles SET photo_thumb = ?1, photo_full = ?2, updated_at = ?3 WHERE name = ?4";

pub const ALL_NAMES_AND_PHOTOS: &str = "SELECT name, photo_thumb, photo_full FROM profiles";

/// Substring search over name, notes, quantity and length.
/// ?1 = normalized LIKE pattern (with `\` escapes).
/// Priority: 1 = name, 2 = notes, 3 = quantity/length.
pub const SEARCH_PROFILES: &str = r#"
SELECT id, name, quantity_per_hanger, length, notes,
       photo_thumb, photo_full, created_at, updated_at, usage_count,
       CASE
           WHEN normalize(name) LIKE ?1 ESCAPE '\' THEN 1
           WHEN normalize(notes) LIKE ?1 ESCAPE '\' THEN 2
           ELSE 3
       END AS match_priority
FROM profiles
WHERE normalize(name) LIKE ?1 ESCAPE '\'
   OR normalize(notes) LIKE ?1 ESCAPE '\'
   OR CAST(quantity_per_hanger AS TEXT) LIKE ?1 ESCAPE '\'
   OR CAST(length AS TEXT) LIKE ?1 ESCAPE '\'
ORDER BY match_priority ASC, usage_count DESC, name ASC
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_list_matches_get() {
        for col in PROFILE_COLUMNS.split(',').map(str::trim) {
            assert!(GET_PROFILE.contains(col), "{col}");
            assert!(SEARCH_PROFILES.contains(col), "{col}");
        }
    }
}
