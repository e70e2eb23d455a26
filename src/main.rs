//! ekranchik - reports and catalog maintenance from the command line.
//!
//! Reads the same sheet export, catalog database and photo folder as the
//! server, configured through `EKRANCHIK_*` variables.
//!
//! CHANGELOG:
//! - 14/11/2025 - backup command
//! - 08/11/2025 - parse-log and tail-once
//! - 30/10/2025 - Initial CLI

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use ekranchik::commands;
use ekranchik::config::Settings;
use ekranchik::db::{ListOrder, ProfileUpdate};
use ekranchik::logging::init_tracing;
use ekranchik::output::{self, OutputControls};
use ekranchik::records::view::ProductQuery;

/// Production-floor reports, profile catalog and photo bookkeeping.
#[derive(Parser, Debug)]
#[command(name = "ekranchik")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Comma-separated field allowlist
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this many characters
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    // =========================================================================
    // SHEET REPORTS
    // =========================================================================
    /// Show the filtered product view
    Products {
        /// Max rows (newest first)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only rows from the last N days (0 = all)
        #[arg(short, long, default_value_t = 2)]
        days: u32,

        /// Only hangers still loading (no time yet)
        #[arg(long)]
        loading: bool,

        /// Only unloaded hangers
        #[arg(long)]
        unloading: bool,

        /// Rows in the loading list
        #[arg(long)]
        loading_limit: Option<usize>,

        /// Rows in the unloaded list
        #[arg(long)]
        unloading_limit: Option<usize>,
    },

    /// List sheet profiles that have no photo
    Missing {
        /// Page size
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Skip this many entries
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// List profiles from the newest rows with their photo status
    Recent {
        /// Page size
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        /// Skip this many entries
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Check whether a profile field has a photo
    HasPhoto {
        /// Profile field as written on the sheet (may name several profiles)
        profile: String,
    },

    /// Fuzzy search over every profile name used on the sheet
    HistorySearch {
        query: String,

        /// Max results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    // =========================================================================
    // CATALOG
    // =========================================================================
    /// Fuzzy search the profile catalog
    Search {
        query: String,

        /// Max results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Manage catalog entries
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Point catalog photo refs at the photo folder's contents
    SyncPhotos,

    /// Store per-profile usage counts from the sheet
    SyncUsage,

    /// Snapshot the catalog database and photos
    Backup,

    // =========================================================================
    // EQUIPMENT LOGS
    // =========================================================================
    /// Print hanger unloads found in a log file
    ParseLog { file: PathBuf },

    /// Poll today's log once and forward unloads to the server
    TailOnce,
}

#[derive(Subcommand, Debug)]
enum CatalogAction {
    /// List catalog profiles
    List {
        #[arg(short, long, value_enum, default_value_t = ListOrder::Updated)]
        order: ListOrder,

        /// Max profiles
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Add a profile, or update the given fields of an existing one
    Add {
        name: String,

        /// Pieces per hanger
        #[arg(short, long)]
        quantity: Option<i64>,

        /// Length in mm
        #[arg(short, long)]
        length: Option<f64>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Rename a profile
    Rename { old: String, new: String },

    /// Delete a profile
    Delete { name: String },

    /// Import `name,quantity,length,notes` rows from a CSV file
    Import { file: PathBuf },
}

fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    let out = OutputControls {
        json: cli.json,
        compact: cli.compact,
        fields: cli.fields,
        max_text_chars: cli.max_text_chars,
    };

    match cli.command {
        // Sheet reports
        Command::Products {
            limit,
            days,
            loading,
            unloading,
            loading_limit,
            unloading_limit,
        } => {
            let query = ProductQuery {
                limit,
                days: Some(days),
                loading,
                unloading,
                loading_limit,
                unloading_limit,
            };
            commands::reports::products(settings, &query, &out)
        }
        Command::Missing { limit, offset } => commands::reports::missing(settings, limit, offset, &out),
        Command::Recent { limit, offset } => commands::reports::recent(settings, limit, offset, &out),
        Command::HasPhoto { profile } => commands::reports::has_photo(settings, &profile, &out),
        Command::HistorySearch { query, limit } => {
            commands::reports::history_search(settings, &query, limit, &out)
        }

        // Catalog
        Command::Search { query, limit } => commands::catalog::search(settings, &query, limit, &out),
        Command::Catalog { action } => match action {
            CatalogAction::List { order, limit } => commands::catalog::list(settings, order, limit, &out),
            CatalogAction::Add {
                name,
                quantity,
                length,
                notes,
            } => {
                let update = ProfileUpdate {
                    name,
                    quantity_per_hanger: quantity,
                    length,
                    notes,
                    ..Default::default()
                };
                commands::catalog::add(settings, &update, &out)
            }
            CatalogAction::Rename { old, new } => commands::catalog::rename(settings, &old, &new, &out),
            CatalogAction::Delete { name } => commands::catalog::delete(settings, &name, &out),
            CatalogAction::Import { file } => commands::catalog::import(settings, &file, &out),
        },
        Command::SyncPhotos => commands::catalog::sync_photos(settings, &out),
        Command::SyncUsage => commands::catalog::sync_usage(settings, &out),
        Command::Backup => commands::catalog::backup(settings, &out),

        // Equipment logs
        Command::ParseLog { file } => commands::logs::parse_log(&file, &out),
        Command::TailOnce => commands::logs::tail_once(settings, &out),
    }
}

fn main() -> ExitCode {
    init_tracing(tracing::Level::WARN);

    let cli = Cli::parse();
    let json = cli.json || cli.compact;

    let result = Settings::new()
        .map_err(anyhow::Error::from)
        .and_then(|settings| run(cli, &settings));

    match result {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if json {
                println!("{}", output::format_error(&format!("{e:#}")));
            } else {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(1)
        }
    }
}
