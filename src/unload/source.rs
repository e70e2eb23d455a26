//! Where equipment logs are read from.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use tracing::info;

use crate::error::Result;

/// Bytes read from a log, starting at `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogChunk {
    pub start: u64,
    pub bytes: Vec<u8>,
    pub total_size: u64,
}

/// Random-access reader over named log files.
pub trait LogSource: Send {
    /// Read `name` from `offset` to its end. A file now shorter than
    /// `offset` was truncated and is read from the beginning.
    fn read_from(&self, name: &str, offset: u64) -> Result<LogChunk>;
}

impl<S: LogSource + ?Sized> LogSource for Box<S> {
    fn read_from(&self, name: &str, offset: u64) -> Result<LogChunk> {
        (**self).read_from(name, offset)
    }
}

/// Where to resume reading a file of `total_size` bytes.
pub(crate) fn resume_offset(name: &str, total_size: u64, offset: u64) -> u64 {
    if total_size < offset {
        info!(file = %name, from = offset, to = total_size, "log file reset");
        0
    } else {
        offset
    }
}

/// Logs in a local directory (the controller's share mounted on the host).
pub struct FileLogSource {
    dir: PathBuf,
}

impl FileLogSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LogSource for FileLogSource {
    fn read_from(&self, name: &str, offset: u64) -> Result<LogChunk> {
        let mut file = File::open(self.dir.join(name))?;
        let total_size = file.metadata()?.len();

        let start = resume_offset(name, total_size, offset);
        file.seek(SeekFrom::Start(start))?;
        let mut bytes = Vec::with_capacity((total_size - start) as usize);
        file.read_to_end(&mut bytes)?;
        Ok(LogChunk {
            start,
            bytes,
            total_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_from_offset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2025-11-27"), b"abcdef").unwrap();
        let source = FileLogSource::new(dir.path());

        let chunk = source.read_from("2025-11-27", 2).unwrap();
        assert_eq!(chunk.bytes, b"cdef");
        assert_eq!(chunk.start, 2);
        assert_eq!(chunk.total_size, 6);

        assert!(source.read_from("2025-11-27", 6).unwrap().bytes.is_empty());
    }

    #[test]
    fn test_truncated_file_read_from_start() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log"), b"xyz").unwrap();
        let chunk = FileLogSource::new(dir.path()).read_from("log", 100).unwrap();
        assert_eq!(chunk.start, 0);
        assert_eq!(chunk.bytes, b"xyz");
    }

    #[test]
    fn test_resume_offset() {
        assert_eq!(resume_offset("log", 100, 40), 40);
        assert_eq!(resume_offset("log", 40, 40), 40);
        assert_eq!(resume_offset("log", 10, 40), 0);
    }

    #[test]
    fn test_boxed_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log"), b"abc").unwrap();
        let source: Box<dyn LogSource> = Box::new(FileLogSource::new(dir.path()));
        assert_eq!(source.read_from("log", 1).unwrap().bytes, b"bc");
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileLogSource::new(dir.path()).read_from("nope", 0).is_err());
    }
}
