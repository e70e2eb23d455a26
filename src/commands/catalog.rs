//! Catalog commands: search, list, add, rename, delete, import, sync-photos,
//! sync-usage, backup.
//!
//! CHANGELOG:
//! - 14/11/2025 - Added backup
//! - 04/11/2025 - Added sync-usage from the sheet
//! - 30/10/2025 - Initial implementation

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde_json::json;

use crate::backup;
use crate::config::Settings;
use crate::db::{helpers, open_catalog, CatalogProfile, ListOrder, ProfileUpdate};
use crate::engine;
use crate::output::OutputControls;
use crate::photos::PhotoIndex;
use crate::records::{JsonRecordSource, RecordSource};

fn open(settings: &Settings) -> Result<Connection> {
    let path = settings.catalog_db();
    open_catalog(&path).with_context(|| format!("Failed to open catalog {}", path.display()))
}

fn print_profile_line(p: &CatalogProfile, output: &OutputControls) {
    let marker = if p.photo_thumb.is_some() || p.photo_full.is_some() {
        "📷"
    } else {
        "❌"
    };
    let qty = p
        .quantity_per_hanger
        .map(|q| format!(" qty={q}"))
        .unwrap_or_default();
    let length = p.length.map(|l| format!(" len={l}")).unwrap_or_default();
    let notes = p
        .notes
        .as_deref()
        .filter(|n| !n.is_empty())
        .map(|n| format!("  {}", output.clip(n)))
        .unwrap_or_default();
    println!("{marker} {}{qty}{length}{notes}", p.name);
}

/// Fuzzy catalog search.
pub fn search(settings: &Settings, query: &str, limit: usize, output: &OutputControls) -> Result<()> {
    let conn = open(settings)?;
    let all = helpers::list_profiles(&conn, ListOrder::Name, None)?;
    let hits: Vec<_> = engine::search(query, &all).into_iter().take(limit).collect();

    if output.wants_json() {
        output.print(&hits);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No profiles matching '{query}'.");
        return Ok(());
    }
    for hit in &hits {
        print!("{:>3}  ", hit.score);
        print_profile_line(&hit.profile, output);
    }
    Ok(())
}

pub fn list(
    settings: &Settings,
    order: ListOrder,
    limit: Option<usize>,
    output: &OutputControls,
) -> Result<()> {
    let conn = open(settings)?;
    let profiles = helpers::list_profiles(&conn, order, limit)?;

    if output.wants_json() {
        output.print(&profiles);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }
    println!("Profiles ({}):", profiles.len());
    println!("{}", "-".repeat(50));
    for p in &profiles {
        print_profile_line(p, output);
    }
    Ok(())
}

/// Create a profile or change the given fields of an existing one.
pub fn add(settings: &Settings, update: &ProfileUpdate, output: &OutputControls) -> Result<()> {
    let conn = open(settings)?;
    let outcome = helpers::upsert_profile(&conn, update)
        .with_context(|| format!("Failed to save profile {:?}", update.name))?;
    let profile = helpers::get_profile(&conn, update.name.trim())?;

    if output.wants_json() {
        output.print(&json!({ "outcome": outcome, "profile": profile }));
    } else {
        let verb = match outcome {
            helpers::UpsertOutcome::Created => "Added",
            helpers::UpsertOutcome::Updated => "Updated",
        };
        println!("{verb} profile: {}", update.name.trim());
    }
    Ok(())
}

pub fn rename(settings: &Settings, old: &str, new: &str, output: &OutputControls) -> Result<()> {
    let conn = open(settings)?;
    helpers::rename_profile(&conn, old, new)?;
    if output.wants_json() {
        output.print(&json!({ "old": old, "new": new }));
    } else {
        println!("Renamed {old} -> {new}");
    }
    Ok(())
}

pub fn delete(settings: &Settings, name: &str, output: &OutputControls) -> Result<()> {
    let conn = open(settings)?;
    let deleted = helpers::delete_profile(&conn, name)?;
    if output.wants_json() {
        output.print(&json!({ "name": name, "deleted": deleted }));
        return Ok(());
    }
    if !deleted {
        bail!("profile not found: {name}");
    }
    println!("Deleted profile: {name}");
    Ok(())
}

/// Load `name,quantity,length,notes` lines from a CSV file.
pub fn import(settings: &Settings, file: &Path, output: &OutputControls) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
    );
    let mut conn = open(settings)?;
    let stats = helpers::import_csv(&mut conn, reader)?;

    if output.wants_json() {
        output.print(&stats);
    } else {
        println!("Imported {} profiles ({} skipped)", stats.imported, stats.skipped);
    }
    Ok(())
}

/// Point catalog photo refs at what is actually in the photo folder.
pub fn sync_photos(settings: &Settings, output: &OutputControls) -> Result<()> {
    let index = PhotoIndex::scan(&settings.photo_dir());
    let mut conn = open(settings)?;
    let stats = helpers::sync_photos(&mut conn, &index)?;

    if output.wants_json() {
        output.print(&json!({ "photos_indexed": index.len(), "catalog": stats }));
    } else {
        println!(
            "{} photos indexed; {} of {} profiles have photos ({} updated)",
            index.len(),
            stats.with_photo,
            stats.total_profiles,
            stats.updated
        );
    }
    Ok(())
}

/// Store how often each catalog profile appears on the sheet.
pub fn sync_usage(settings: &Settings, output: &OutputControls) -> Result<()> {
    let path = settings.records_file();
    let records = JsonRecordSource::new(&path)
        .read_all()
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let counts = engine::usage_counts(&records);
    let mut conn = open(settings)?;
    let updated = helpers::set_usage_counts(&mut conn, &counts)?;

    if output.wants_json() {
        output.print(&json!({ "distinct_profiles": counts.len(), "updated": updated }));
    } else {
        println!(
            "{} distinct profiles on the sheet; {} catalog entries updated",
            counts.len(),
            updated
        );
    }
    Ok(())
}

pub fn backup(settings: &Settings, output: &OutputControls) -> Result<()> {
    let report = backup::create_backup(
        &settings.catalog_db(),
        &settings.photo_dir(),
        &settings.backup_dir(),
    )
    .context("Backup failed")?;

    if output.wants_json() {
        output.print(&report);
        return Ok(());
    }
    let contents = if report.metadata.backed_up.is_empty() {
        "nothing".to_string()
    } else {
        report.metadata.backed_up.join(", ")
    };
    println!("Backup created: {}", report.path.display());
    println!("  Contents: {contents}");
    Ok(())
}
