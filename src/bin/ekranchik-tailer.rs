//! ekranchik-tailer - forwards hanger unloads from the equipment logs.
//!
//! CHANGELOG:
//! - 19/11/2025 - FTP log source
//! - 06/11/2025 - Initial implementation

use std::time::Duration;

use anyhow::{Context, Result};
use ekranchik::config::Settings;
use ekranchik::logging::init_tracing;
use ekranchik::unload::{log_source, HttpSignalSink, Tailer};
use tracing::info;

fn main() -> Result<()> {
    init_tracing(tracing::Level::INFO);

    let settings = Settings::new().context("Invalid configuration")?;
    let signal_url = settings.signal_url();
    info!(signals = %signal_url, "unload tailer configured");

    let sink = HttpSignalSink::new(signal_url).context("Failed to build HTTP client")?;
    let mut tailer = Tailer::new(log_source(&settings), sink, settings.tailer_state_file());
    tailer.run(Duration::from_secs(settings.tailer_interval_secs.max(1)));
    Ok(())
}
