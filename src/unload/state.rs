//! Tailer progress persisted between polls and restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailState {
    /// Day of the log being followed, `YYYY-MM-DD`.
    pub file_date: Option<String>,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub byte_offset: u64,
}

impl TailState {
    /// Saved state, or a fresh one when the file is missing or unreadable.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt tailer state");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Switch to `date`'s log, starting from its beginning. Returns whether
    /// the day changed.
    pub fn roll_to(&mut self, date: &str) -> bool {
        if self.file_date.as_deref() == Some(date) {
            return false;
        }
        self.file_date = Some(date.to_string());
        self.file_size = 0;
        self.byte_offset = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_to_new_day_resets_offset() {
        let mut state = TailState {
            file_date: Some("2025-11-26".into()),
            file_size: 900,
            byte_offset: 900,
        };
        assert!(!state.roll_to("2025-11-26"));
        assert_eq!(state.byte_offset, 900);
        assert!(state.roll_to("2025-11-27"));
        assert_eq!(state.byte_offset, 0);
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("tailer.json");
        assert_eq!(TailState::load(&path), TailState::default());

        let state = TailState {
            file_date: Some("2025-11-27".into()),
            file_size: 120,
            byte_offset: 100,
        };
        state.save(&path).unwrap();
        assert_eq!(TailState::load(&path), state);

        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(TailState::load(&path), TailState::default());
    }

    #[test]
    fn test_reads_legacy_state_without_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.json");
        std::fs::write(&path, r#"{"file_date": "2025-11-27", "byte_offset": 42}"#).unwrap();
        let state = TailState::load(&path);
        assert_eq!(state.byte_offset, 42);
        assert_eq!(state.file_size, 0);
    }
}
