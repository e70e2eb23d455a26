//! Snapshot cache over a record source.
//!
//! Re-reads the source only when its freshness token changes. Handlers get
//! an `Arc<[Record]>` they can hold for the whole request while a reload
//! publishes a new snapshot for later callers.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use super::{Record, RecordSource};
use crate::error::Result;

struct Cached {
    key: String,
    records: Arc<[Record]>,
}

pub struct RecordCache {
    source: Box<dyn RecordSource>,
    cached: Mutex<Option<Cached>>,
}

impl RecordCache {
    pub fn new(source: impl RecordSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cached: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Cached>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current snapshot, reloading when the source changed since last read.
    pub fn snapshot(&self) -> Result<Arc<[Record]>> {
        let key = self.source.cache_key()?;

        let mut cached = self.lock();
        if let Some(c) = cached.as_ref() {
            if c.key == key {
                debug!(key = %key, "record cache hit");
                return Ok(Arc::clone(&c.records));
            }
        }

        let records: Arc<[Record]> = self.source.read_all()?.into();
        info!(rows = records.len(), key = %key, "records reloaded");
        *cached = Some(Cached {
            key,
            records: Arc::clone(&records),
        });
        Ok(records)
    }

    /// Key of the cached snapshot, if any.
    pub fn cache_key(&self) -> Option<String> {
        self.lock().as_ref().map(|c| c.key.clone())
    }

    /// Drop the cached snapshot; the next `snapshot()` re-reads the source.
    pub fn invalidate(&self) {
        *self.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        key: Mutex<String>,
        reads: Arc<AtomicUsize>,
    }

    impl RecordSource for CountingSource {
        fn read_all(&self) -> Result<Vec<Record>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Record::default()])
        }

        fn cache_key(&self) -> Result<String> {
            Ok(self.key.lock().unwrap().clone())
        }
    }

    fn counting(key: &str) -> (Arc<AtomicUsize>, RecordCache) {
        let reads = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            key: Mutex::new(key.to_string()),
            reads: Arc::clone(&reads),
        };
        (reads, RecordCache::new(source))
    }

    #[test]
    fn test_reads_once_while_key_unchanged() {
        let (reads, cache) = counting("v1");
        cache.snapshot().unwrap();
        cache.snapshot().unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cache_key().as_deref(), Some("v1"));
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let (reads, cache) = counting("v1");
        cache.snapshot().unwrap();
        cache.invalidate();
        assert_eq!(cache.cache_key(), None);
        cache.snapshot().unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_file_change_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        std::fs::write(&path, r#"[{"profile": "A-1"}]"#).unwrap();

        let cache = RecordCache::new(crate::records::JsonRecordSource::new(&path));
        assert_eq!(cache.snapshot().unwrap().len(), 1);

        std::fs::write(&path, r#"[{"profile": "A-1"}, {"profile": "A-2"}]"#).unwrap();
        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(5);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();
        assert_eq!(cache.snapshot().unwrap().len(), 2);
    }
}
