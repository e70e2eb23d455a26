//! In-memory log of hanger-unload signals posted by the tailer.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Signals kept before the oldest is dropped.
pub const SIGNAL_LOG_CAPACITY: usize = 200;

/// Body of a signal post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadSignal {
    pub hanger_number: u32,
    /// `HH:MM:SS` as written in the equipment log.
    pub exit_time: String,
}

/// A signal as stored, with the time it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceivedSignal {
    #[serde(flatten)]
    pub signal: UnloadSignal,
    pub received_at: String,
}

pub struct SignalLog {
    capacity: usize,
    entries: Mutex<VecDeque<ReceivedSignal>>,
}

impl Default for SignalLog {
    fn default() -> Self {
        Self::with_capacity(SIGNAL_LOG_CAPACITY)
    }
}

impl SignalLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append a signal, evicting the oldest past capacity. Returns the count held.
    pub fn push(&self, signal: UnloadSignal) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(ReceivedSignal {
            signal,
            received_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });
        entries.len()
    }

    /// Up to `limit` signals, newest first.
    pub fn newest(&self, limit: usize) -> Vec<ReceivedSignal> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(n: u32) -> UnloadSignal {
        UnloadSignal {
            hanger_number: n,
            exit_time: "08:15:00".into(),
        }
    }

    #[test]
    fn test_bounded_newest_first() {
        let log = SignalLog::with_capacity(3);
        for n in 1..=5 {
            log.push(signal(n));
        }
        assert_eq!(log.len(), 3);
        let hangers: Vec<u32> = log.newest(10).iter().map(|s| s.signal.hanger_number).collect();
        assert_eq!(hangers, vec![5, 4, 3]);
        assert_eq!(log.newest(1).len(), 1);
    }

    #[test]
    fn test_serializes_flat() {
        let log = SignalLog::default();
        log.push(signal(7));
        let v = serde_json::to_value(&log.newest(1)[0]).unwrap();
        assert_eq!(v["hanger_number"], 7);
        assert_eq!(v["exit_time"], "08:15:00");
        assert!(v["received_at"].is_string());
    }
}
