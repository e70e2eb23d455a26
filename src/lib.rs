//! Ekranchik: production-floor reporting over the production sheet, a
//! profile catalog with photos, a Telegram relay and hanger-unload signals.
//!
//! CHANGELOG:
//! - 14/11/2025 - Backup module
//! - 09/11/2025 - Telegram bot
//! - 06/11/2025 - Hanger-unload tailer
//! - 28/10/2025 - Initial library structure

pub mod backup;
pub mod bot;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logging;
pub mod matching;
pub mod output;
pub mod photos;
pub mod records;
pub mod server;
pub mod unload;

pub use error::{Error, Result};
