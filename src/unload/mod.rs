//! Hanger-unload detection from the line controller's message logs.
//!
//! CHANGELOG:
//! - 19/11/2025 - Read logs over FTP when a host is configured
//! - 08/11/2025 - Only complete lines are consumed per poll
//! - 06/11/2025 - Initial tailer

pub mod forward;
pub mod ftp;
pub mod parser;
pub mod source;
pub mod state;
pub mod tailer;

pub use forward::{HttpSignalSink, SignalSink};
pub use ftp::{FtpConfig, FtpLogSource};
pub use parser::{decode_log, parse_unload_events, UnloadEvent};
pub use source::{FileLogSource, LogChunk, LogSource};
pub use state::TailState;
pub use tailer::{log_name, PollStats, Tailer};

use tracing::info;

use crate::config::Settings;

/// The log source the settings select: FTP when a host is set, otherwise
/// the local log directory.
pub fn log_source(settings: &Settings) -> Box<dyn LogSource> {
    match settings.ftp_config() {
        Some(config) => {
            info!(host = %config.host, port = config.port, "reading logs over FTP");
            Box::new(FtpLogSource::new(config))
        }
        None => {
            let dir = settings.tailer_log_dir();
            info!(dir = %dir.display(), "reading logs from directory");
            Box::new(FileLogSource::new(dir))
        }
    }
}
