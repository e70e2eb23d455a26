//! Delivery of unload events to the server.

use std::time::Duration;

use serde_json::json;

use super::parser::UnloadEvent;
use crate::error::Result;

const SIGNAL_TIMEOUT: Duration = Duration::from_secs(5);

pub trait SignalSink: Send {
    fn send(&self, event: &UnloadEvent) -> Result<()>;
}

/// POSTs `{hanger_number, exit_time}` to the server's signal endpoint.
pub struct HttpSignalSink {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpSignalSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(SIGNAL_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl SignalSink for HttpSignalSink {
    fn send(&self, event: &UnloadEvent) -> Result<()> {
        self.client
            .post(&self.url)
            .json(&json!({
                "hanger_number": event.hanger,
                "exit_time": event.time,
            }))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}
