//! Rebuild the photo index when files change outside the app.
//!
//! Photos are sometimes copied straight into the folder over the network
//! share. Events are debounced so a batch copy triggers one rebuild.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::index::PhotoLibrary;
use crate::error::Result;

/// Keeps the watch alive; dropping it stops watching and ends the
/// rebuild thread.
pub struct PhotoWatcher {
    _watcher: RecommendedWatcher,
}

fn is_relevant(event: &Event) -> bool {
    let touches_image = event.paths.iter().any(|p| {
        !p.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("tmp"))
    });
    touches_image
        && matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        )
}

impl PhotoWatcher {
    /// Watch the library directory and rebuild after `debounce` of quiet.
    pub fn spawn(library: Arc<PhotoLibrary>, debounce: Duration) -> Result<Self> {
        library.ensure_dir()?;
        let (tx, rx) = mpsc::channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) if is_relevant(&event) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "photo watcher error"),
            },
            Config::default(),
        )?;
        watcher.watch(library.dir(), RecursiveMode::NonRecursive)?;

        thread::spawn(move || {
            // Block for the first event, then wait until the folder is quiet.
            while rx.recv().is_ok() {
                loop {
                    match rx.recv_timeout(debounce) {
                        Ok(()) => continue,
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
                debug!("photo folder changed");
                library.rebuild();
            }
        });

        Ok(Self { _watcher: watcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_external_copy_triggers_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let library = Arc::new(PhotoLibrary::open(dir.path()));
        let watcher = PhotoWatcher::spawn(Arc::clone(&library), Duration::from_millis(100)).unwrap();

        thread::sleep(Duration::from_millis(200));
        std::fs::write(dir.path().join("B-2-thumb.jpg"), b"x").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline && !library.current().has_photo("b-2") {
            thread::sleep(Duration::from_millis(50));
        }
        assert!(library.current().has_photo("b-2"));
        drop(watcher);
    }
}
