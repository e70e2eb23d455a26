//! Incremental follower of the day's equipment log.
//!
//! Each poll reads what was appended since the last one, forwards every
//! unload event and persists the new offset. Only complete lines are
//! consumed; a line still being written is read again on the next poll.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::forward::SignalSink;
use super::parser::{decode_log, parse_unload_events};
use super::source::LogSource;
use super::state::TailState;
use crate::error::Result;

/// Log file name for a day.
pub fn log_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollStats {
    pub found: usize,
    pub sent: usize,
}

pub struct Tailer {
    source: Box<dyn LogSource>,
    sink: Box<dyn SignalSink>,
    state_path: PathBuf,
    state: TailState,
}

impl Tailer {
    /// Resume from the state saved at `state_path`, if any.
    pub fn new(
        source: impl LogSource + 'static,
        sink: impl SignalSink + 'static,
        state_path: impl Into<PathBuf>,
    ) -> Self {
        let state_path = state_path.into();
        let state = TailState::load(&state_path);
        Self {
            source: Box::new(source),
            sink: Box::new(sink),
            state_path,
            state,
        }
    }

    pub fn state(&self) -> &TailState {
        &self.state
    }

    /// Read new lines of `today`'s log and forward their unload events.
    pub fn poll_once(&mut self, today: NaiveDate) -> Result<PollStats> {
        let name = log_name(today);
        if self.state.roll_to(&name) {
            info!(file = %name, "following new day's log");
        }

        let chunk = self.source.read_from(&name, self.state.byte_offset)?;
        let consumed = chunk
            .bytes
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        let text = decode_log(&chunk.bytes[..consumed]);

        let events = parse_unload_events(&text);
        let mut stats = PollStats {
            found: events.len(),
            sent: 0,
        };
        for event in &events {
            match self.sink.send(event) {
                Ok(()) => stats.sent += 1,
                Err(e) => warn!(hanger = event.hanger, error = %e, "signal not delivered"),
            }
        }

        self.state.byte_offset = chunk.start + consumed as u64;
        self.state.file_size = chunk.total_size;
        self.state.save(&self.state_path)?;

        if stats.found > 0 {
            info!(found = stats.found, sent = stats.sent, "hanger unloads forwarded");
        } else {
            debug!(offset = self.state.byte_offset, "no new unloads");
        }
        Ok(stats)
    }

    /// Poll every `interval` forever. Read failures are logged and retried.
    pub fn run(&mut self, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "unload tailer started");
        loop {
            if let Err(e) = self.poll_once(Local::now().date_naive()) {
                warn!(error = %e, "log poll failed");
            }
            thread::sleep(interval);
        }
    }
}
