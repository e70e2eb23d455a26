//! Typed errors for the library layer.
//!
//! Commands and binaries wrap these in `anyhow` with context; library code
//! returns them directly so callers can match on contract violations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("page size must be greater than zero")]
    InvalidPage,

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("profile already exists: {0}")]
    ProfileExists(String),

    #[error("invalid profile name: {0:?}")]
    InvalidProfileName(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("FTP error: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Telegram(String),
}

pub type Result<T> = std::result::Result<T, Error>;
