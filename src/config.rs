//! Runtime settings, read from `EKRANCHIK_*` environment variables (a `.env`
//! file in the working directory is loaded first).
//!
//! Paths left unset are placed under `data_dir`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::photos::PhotoSizes;
use crate::unload::FtpConfig;

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ekranchik")
}

fn default_bind_addr() -> String {
    "0.0.0.0:5000".into()
}

fn default_recent_window() -> usize {
    1500
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_bot_password() -> String {
    "1122".into()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".into()
}

fn default_tailer_interval_secs() -> u64 {
    60
}

fn default_ftp_port() -> u16 {
    21
}

fn default_ftp_user() -> String {
    "anonymous".into()
}

fn default_thumb_px() -> u32 {
    300
}

fn default_full_max_px() -> u32 {
    1600
}

fn default_photo_debounce_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// JSON export of the production sheet.
    #[serde(default)]
    pub records_file: Option<PathBuf>,
    #[serde(default)]
    pub catalog_db: Option<PathBuf>,
    #[serde(default)]
    pub photo_dir: Option<PathBuf>,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// How many of the newest records count as "recent".
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    #[serde(default = "default_thumb_px")]
    pub thumb_px: u32,
    #[serde(default = "default_full_max_px")]
    pub full_max_px: u32,
    #[serde(default = "default_photo_debounce_ms")]
    pub photo_debounce_ms: u64,

    /// Base URL the bot and the tailer use to reach the server.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default)]
    pub telegram_token: String,
    #[serde(default = "default_bot_password")]
    pub bot_password: String,
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Directory holding the equipment's daily logs, named `YYYY-MM-DD`.
    #[serde(default)]
    pub tailer_log_dir: Option<PathBuf>,
    #[serde(default)]
    pub tailer_state_file: Option<PathBuf>,
    #[serde(default = "default_tailer_interval_secs")]
    pub tailer_interval_secs: u64,
    /// Defaults to `{server_url}/api/signal`.
    #[serde(default)]
    pub signal_url: Option<String>,

    /// Controller FTP server. When set, logs are read over FTP instead of
    /// from `tailer_log_dir`.
    #[serde(default)]
    pub ftp_host: Option<String>,
    #[serde(default = "default_ftp_port")]
    pub ftp_port: u16,
    #[serde(default = "default_ftp_user")]
    pub ftp_user: String,
    #[serde(default)]
    pub ftp_password: String,
    #[serde(default)]
    pub ftp_dir: Option<String>,
}

impl Settings {
    /// Load from `.env` and the environment.
    pub fn new() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            config::Config::builder().add_source(
                config::Environment::with_prefix("EKRANCHIK").try_parsing(true),
            ),
        )
    }

    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn records_file(&self) -> PathBuf {
        self.records_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("records.json"))
    }

    pub fn catalog_db(&self) -> PathBuf {
        self.catalog_db
            .clone()
            .unwrap_or_else(|| self.data_dir.join("profiles.db"))
    }

    pub fn photo_dir(&self) -> PathBuf {
        self.photo_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("images"))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("backups"))
    }

    pub fn tailer_log_dir(&self) -> PathBuf {
        self.tailer_log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("ftp_logs"))
    }

    pub fn tailer_state_file(&self) -> PathBuf {
        self.tailer_state_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("tailer_state.json"))
    }

    pub fn signal_url(&self) -> String {
        self.signal_url.clone().unwrap_or_else(|| {
            format!("{}/api/signal", self.server_url.trim_end_matches('/'))
        })
    }

    pub fn ftp_config(&self) -> Option<FtpConfig> {
        let host = self.ftp_host.as_deref().map(str::trim).filter(|h| !h.is_empty())?;
        Some(FtpConfig {
            host: host.to_string(),
            port: self.ftp_port,
            user: self.ftp_user.clone(),
            password: self.ftp_password.clone(),
            dir: self.ftp_dir.clone(),
        })
    }

    pub fn photo_sizes(&self) -> PhotoSizes {
        PhotoSizes {
            thumb_px: self.thumb_px,
            full_max_px: self.full_max_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_builder(config::Config::builder()).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:5000");
        assert_eq!(settings.recent_window, 1500);
        assert_eq!(settings.bot_password, "1122");
        assert_eq!(settings.tailer_interval_secs, 60);
        assert_eq!(settings.signal_url(), "http://127.0.0.1:5000/api/signal");
        assert_eq!(settings.photo_dir(), settings.data_dir.join("images"));
        assert_eq!(settings.ftp_config(), None);
    }

    #[test]
    fn test_overrides() {
        let builder = config::Config::builder()
            .set_override("data_dir", "/srv/ekranchik")
            .unwrap()
            .set_override("recent_window", 300)
            .unwrap()
            .set_override("server_url", "http://10.0.0.5:5000/")
            .unwrap();
        let settings = Settings::from_builder(builder).unwrap();
        assert_eq!(settings.recent_window, 300);
        assert_eq!(settings.catalog_db(), PathBuf::from("/srv/ekranchik/profiles.db"));
        assert_eq!(settings.backup_dir(), PathBuf::from("/srv/ekranchik/backups"));
        assert_eq!(settings.signal_url(), "http://10.0.0.5:5000/api/signal");
    }

    #[test]
    fn test_ftp_config() {
        let builder = config::Config::builder()
            .set_override("ftp_host", "172.17.11.194")
            .unwrap()
            .set_override("ftp_user", "omron")
            .unwrap()
            .set_override("ftp_dir", "/MEMCARD1/messages/")
            .unwrap();
        let ftp = Settings::from_builder(builder).unwrap().ftp_config().unwrap();
        assert_eq!(ftp.host, "172.17.11.194");
        assert_eq!(ftp.port, 21);
        assert_eq!(ftp.user, "omron");
        assert_eq!(ftp.password, "");
        assert_eq!(ftp.dir.as_deref(), Some("/MEMCARD1/messages/"));

        let blank = config::Config::builder().set_override("ftp_host", " ").unwrap();
        assert_eq!(Settings::from_builder(blank).unwrap().ftp_config(), None);
    }
}
