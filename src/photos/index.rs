//! Photo presence index.
//!
//! Built by a single scan of the photo directory. `NAME.jpg` is the full
//! image and `NAME-thumb.jpg` the thumbnail; both are keyed by lowercase
//! `NAME`. The index is never patched: any change to the library produces a
//! fresh index that replaces the old one whole.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::Result;

/// Reserved suffix marking a thumbnail.
pub const THUMB_SUFFIX: &str = "-thumb";

/// URL prefix under which photo files are served.
pub const URL_PREFIX: &str = "/static/images";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Photo references for one profile name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhotoEntry {
    pub thumbnail: Option<String>,
    pub full: Option<String>,
}

impl PhotoEntry {
    /// A thumbnail alone or a full image alone both count.
    pub fn has_photo(&self) -> bool {
        self.thumbnail.is_some() || self.full.is_some()
    }
}

/// Immutable lowercase-name → photo refs mapping.
#[derive(Debug, Clone, Default)]
pub struct PhotoIndex {
    entries: HashMap<String, PhotoEntry>,
}

/// Lookup key for a profile name.
pub fn photo_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl PhotoIndex {
    /// Index from explicit entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, PhotoEntry)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, entry)| (photo_key(&name), entry))
                .collect(),
        }
    }

    /// Scan `dir` (non-recursive). A missing directory yields an empty index.
    pub fn scan(dir: &Path) -> Self {
        let mut entries: HashMap<String, PhotoEntry> = HashMap::new();
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "photo directory not found");
            return Self { entries };
        }

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_image(path) {
                continue;
            }
            let (Some(stem), Some(file_name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            let url = format!("{URL_PREFIX}/{file_name}");
            match stem.strip_suffix(THUMB_SUFFIX) {
                Some(name) => entries.entry(photo_key(name)).or_default().thumbnail = Some(url),
                None => entries.entry(photo_key(stem)).or_default().full = Some(url),
            }
        }

        Self { entries }
    }

    /// Entry for `name` (case-insensitive, trimmed).
    pub fn get(&self, name: &str) -> Option<&PhotoEntry> {
        self.entries.get(&photo_key(name))
    }

    /// Whether `name` has a thumbnail or a full image.
    pub fn has_photo(&self, name: &str) -> bool {
        self.get(name).is_some_and(PhotoEntry::has_photo)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PhotoEntry)> {
        self.entries.iter()
    }
}

/// Process-wide photo library: the directory plus its current index.
///
/// Readers take an `Arc` to the current index; `rebuild()` scans first and
/// only then swaps the pointer, so a half-built index is never visible.
pub struct PhotoLibrary {
    dir: PathBuf,
    current: RwLock<Arc<PhotoIndex>>,
}

impl PhotoLibrary {
    /// Open the library and build the initial index.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let index = PhotoIndex::scan(&dir);
        info!(dir = %dir.display(), profiles = index.len(), "photo index built");
        Self {
            dir,
            current: RwLock::new(Arc::new(index)),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot of the current index.
    pub fn current(&self) -> Arc<PhotoIndex> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Rescan the directory and publish the new index.
    pub fn rebuild(&self) -> Arc<PhotoIndex> {
        let index = Arc::new(PhotoIndex::scan(&self.dir));
        {
            let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
            *guard = Arc::clone(&index);
        }
        info!(profiles = index.len(), "photo index rebuilt");
        index
    }

    /// Make sure the directory exists.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_scan_pairs_thumb_and_full() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "ЮП-1625.jpg");
        touch(dir.path(), "ЮП-1625-thumb.jpg");
        touch(dir.path(), "CP-100-thumb.jpg");
        touch(dir.path(), "notes.txt");

        let index = PhotoIndex::scan(dir.path());
        assert_eq!(index.len(), 2);

        let entry = index.get("юп-1625").unwrap();
        assert_eq!(entry.full.as_deref(), Some("/static/images/ЮП-1625.jpg"));
        assert_eq!(entry.thumbnail.as_deref(), Some("/static/images/ЮП-1625-thumb.jpg"));

        // thumbnail alone still counts
        assert!(index.has_photo(" cp-100 "));
        assert!(!index.has_photo("notes"));
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let index = PhotoIndex::scan(Path::new("/nonexistent/photos"));
        assert!(index.is_empty());
    }

    #[test]
    fn test_rebuild_swaps_whole_index() {
        let dir = tempfile::tempdir().unwrap();
        let library = PhotoLibrary::open(dir.path());
        let before = library.current();
        assert!(before.is_empty());

        touch(dir.path(), "A-1.jpg");
        library.rebuild();

        // old snapshot untouched, new one sees the file
        assert!(before.is_empty());
        assert!(library.current().has_photo("a-1"));
    }
}
