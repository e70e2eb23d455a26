//! Logs read straight from the line controller's FTP server.
//!
//! Every read opens a fresh session: the controller drops idle
//! connections, and a poll happens once a minute at most.

use std::io::Read;
use std::net::ToSocketAddrs;
use std::time::Duration;

use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::debug;

use super::source::{resume_offset, LogChunk, LogSource};
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection details for the controller's FTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Directory holding the daily logs, e.g. `/MEMCARD1/messages/`.
    pub dir: Option<String>,
}

pub struct FtpLogSource {
    config: FtpConfig,
}

impl FtpLogSource {
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }

    fn connect(&self) -> Result<FtpStream> {
        let addr = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("cannot resolve {}", self.config.host),
                ))
            })?;
        let mut ftp = FtpStream::connect_timeout(addr, CONNECT_TIMEOUT)?;
        ftp.login(&self.config.user, &self.config.password)?;
        if let Some(dir) = self.config.dir.as_deref().filter(|d| !d.is_empty()) {
            ftp.cwd(dir)?;
        }
        ftp.transfer_type(FileType::Binary)?;
        Ok(ftp)
    }
}

impl LogSource for FtpLogSource {
    fn read_from(&self, name: &str, offset: u64) -> Result<LogChunk> {
        let mut ftp = self.connect()?;
        let total_size = ftp.size(name)? as u64;
        let start = resume_offset(name, total_size, offset);

        let mut bytes = Vec::new();
        if start < total_size {
            if start > 0 {
                ftp.resume_transfer(start as usize)?;
            }
            ftp.retr_as_buffer(name)?.read_to_end(&mut bytes)?;
        }
        if let Err(e) = ftp.quit() {
            debug!(error = %e, "ftp quit failed");
        }

        Ok(LogChunk {
            start,
            bytes,
            total_size,
        })
    }
}
