//! Tracing setup shared by every binary.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` when it is set and valid, otherwise `default_level` for
/// everything.
fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.as_str()))
}

/// Install the global subscriber. Long-running services pass INFO, the CLI
/// stays at WARN.
pub fn init_tracing(default_level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_default_level_applies_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(env_filter(Level::WARN).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(env_filter(Level::INFO).max_level_hint(), Some(LevelFilter::INFO));
    }
}
