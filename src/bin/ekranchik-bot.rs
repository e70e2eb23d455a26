//! ekranchik-bot - Telegram front end to the profile catalog.
//!
//! CHANGELOG:
//! - 09/11/2025 - Initial implementation

use anyhow::{Context, Result};
use ekranchik::bot::{Bot, HttpCatalogClient, TelegramApi};
use ekranchik::config::Settings;
use ekranchik::logging::init_tracing;
use tracing::{error, info};

fn main() -> Result<()> {
    init_tracing(tracing::Level::INFO);

    let settings = Settings::new().context("Invalid configuration")?;
    if settings.telegram_token.trim().is_empty() {
        error!("EKRANCHIK_TELEGRAM_TOKEN is not set; bot not started");
        return Ok(());
    }

    let api = TelegramApi::new(&settings.telegram_api_url, settings.telegram_token.trim())?;
    let catalog = HttpCatalogClient::new(&settings.server_url)?;
    info!(server = %settings.server_url, "catalog server");

    Bot::new(api, catalog, &settings.bot_password).run();
    Ok(())
}
