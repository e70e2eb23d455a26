//! Equipment log commands: parse-log, tail-once.
//!
//! CHANGELOG:
//! - 19/11/2025 - tail-once follows the configured log source
//! - 08/11/2025 - Added tail-once for checking the tailer by hand
//! - 06/11/2025 - Initial implementation

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::config::Settings;
use crate::output::OutputControls;
use crate::unload::{decode_log, log_source, parse_unload_events, HttpSignalSink, Tailer};

/// Print the hanger unloads recorded in a log file.
pub fn parse_log(file: &Path, output: &OutputControls) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let events = parse_unload_events(&decode_log(&bytes));

    if output.wants_json() {
        output.print(&events);
        return Ok(());
    }

    if events.is_empty() {
        println!("No hanger unloads in {}", file.display());
        return Ok(());
    }
    println!("Hanger unloads ({}):", events.len());
    for e in &events {
        println!("{}  hanger {}", e.time, e.hanger);
    }
    Ok(())
}

/// Run a single tailer poll against today's log and forward what it finds.
pub fn tail_once(settings: &Settings, output: &OutputControls) -> Result<()> {
    let sink = HttpSignalSink::new(settings.signal_url())?;
    let mut tailer = Tailer::new(log_source(settings), sink, settings.tailer_state_file());
    let stats = tailer
        .poll_once(Local::now().date_naive())
        .context("Log poll failed")?;

    if output.wants_json() {
        output.print(&serde_json::json!({ "stats": stats, "state": tailer.state() }));
    } else {
        println!(
            "{} unloads found, {} sent (offset {})",
            stats.found,
            stats.sent,
            tailer.state().byte_offset
        );
    }
    Ok(())
}
