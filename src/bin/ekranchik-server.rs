//! ekranchik-server - HTTP API, floor screen data and photo hosting.
//!
//! CHANGELOG:
//! - 07/11/2025 - Photo folder watcher
//! - 29/10/2025 - Initial implementation

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ekranchik::config::Settings;
use ekranchik::logging::init_tracing;
use ekranchik::photos::PhotoWatcher;
use ekranchik::server::{http, Params, Service};
use tracing::{info, warn};

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing(tracing::Level::INFO);

    let settings = Settings::new().context("Invalid configuration")?;
    let service = Service::open(&settings).context("Failed to open data files")?;
    info!(
        records = %settings.records_file().display(),
        catalog = %settings.catalog_db().display(),
        photos = %settings.photo_dir().display(),
        "data sources"
    );

    match service.dispatch("sync_photos", Params::new()) {
        Ok(stats) => info!(%stats, "catalog photo refs synced"),
        Err(e) => warn!(error = %e, "initial photo sync failed"),
    }

    let service = Arc::new(service);
    let _watcher = PhotoWatcher::spawn(
        Arc::clone(service.photos()),
        Duration::from_millis(settings.photo_debounce_ms),
    )
    .context("Failed to watch the photo folder")?;

    http::serve(service, &settings.bind_addr)
        .await
        .context("HTTP server failed")
}
