//! Sheet reports: products, missing, recent, has-photo, history-search.
//!
//! CHANGELOG:
//! - 10/11/2025 - Text output clipped with --max-text-chars
//! - 30/10/2025 - Initial implementation

use anyhow::{Context, Result};
use chrono::Local;

use crate::config::Settings;
use crate::engine;
use crate::output::OutputControls;
use crate::photos::PhotoIndex;
use crate::records::view::{self, ProductQuery};
use crate::records::{JsonRecordSource, Record, RecordSource};

fn load_records(settings: &Settings) -> Result<Vec<Record>> {
    let path = settings.records_file();
    JsonRecordSource::new(&path)
        .read_all()
        .with_context(|| format!("Failed to read records from {}", path.display()))
}

fn load_photos(settings: &Settings) -> PhotoIndex {
    PhotoIndex::scan(&settings.photo_dir())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| view::PLACEHOLDER.to_string())
}

/// Filtered product view, as shown on the floor screen.
pub fn products(settings: &Settings, query: &ProductQuery, output: &OutputControls) -> Result<()> {
    let records = load_records(settings)?;
    let products = view::products(&records, query, Local::now().date_naive());

    if output.wants_json() {
        output.print(&products);
        return Ok(());
    }

    let print_rows = |rows: &[view::ProductRow]| {
        for p in rows {
            println!(
                "{:>5}  {}  {}  {}  {}  {}",
                p.number,
                p.date,
                p.time,
                output.clip(&p.profile),
                output.clip(&p.client),
                p.color
            );
        }
    };

    match &products.unloading_products {
        Some(unloading) => {
            println!("Loading ({}):", products.products.len());
            print_rows(&products.products);
            println!("\nUnloaded ({}):", unloading.len());
            print_rows(unloading);
        }
        None => {
            println!("Products ({} of {}):", products.total, products.total_all);
            println!("{}", "-".repeat(60));
            print_rows(&products.products);
        }
    }
    Ok(())
}

/// Profiles on the sheet with no photo.
pub fn missing(
    settings: &Settings,
    limit: usize,
    offset: usize,
    output: &OutputControls,
) -> Result<()> {
    let records = load_records(settings)?;
    let page = engine::missing_profiles(&records, &load_photos(settings), limit, offset)?;

    if output.wants_json() {
        output.print(&page);
        return Ok(());
    }

    if page.entries.is_empty() {
        println!("Every profile on the sheet has a photo.");
        return Ok(());
    }
    println!("Profiles without photos ({} total):", page.total);
    println!("{}", "-".repeat(50));
    for m in &page.entries {
        println!(
            "row {:>5}  {}  {}",
            m.row_number,
            or_dash(m.date.map(|d| d.format("%d.%m.%y"))),
            output.clip(&m.profile)
        );
    }
    if page.has_more {
        println!("... more with --offset {}", offset + page.entries.len());
    }
    Ok(())
}

/// Profiles from the newest rows and whether they have photos.
pub fn recent(
    settings: &Settings,
    limit: usize,
    offset: usize,
    output: &OutputControls,
) -> Result<()> {
    let records = load_records(settings)?;
    let page = engine::recent_profiles(
        &records,
        &load_photos(settings),
        settings.recent_window,
        limit,
        offset,
    )?;

    if output.wants_json() {
        output.print(&page);
        return Ok(());
    }

    println!("Recent profiles ({} total):", page.total);
    println!("{}", "-".repeat(50));
    for r in &page.entries {
        let marker = if r.has_photo { "📷" } else { "❌" };
        println!(
            "{marker} row {:>5}  {}",
            r.row_number,
            output.clip(&r.profile)
        );
    }
    Ok(())
}

/// Whether a profile field has a photo for any of its profiles.
pub fn has_photo(settings: &Settings, field: &str, output: &OutputControls) -> Result<()> {
    let index = load_photos(settings);
    let photo = engine::photo_for(Some(field), &index);

    if output.wants_json() {
        output.print(&serde_json::json!({
            "profile": field,
            "has_photo": photo.is_some(),
            "photo": photo,
        }));
        return Ok(());
    }

    match photo {
        Some(entry) => println!(
            "{field}: yes ({})",
            entry.full.as_deref().or(entry.thumbnail.as_deref()).unwrap_or_default()
        ),
        None => println!("{field}: no photo"),
    }
    Ok(())
}

/// Fuzzy search over every profile name that appears on the sheet.
pub fn history_search(
    settings: &Settings,
    query: &str,
    limit: usize,
    output: &OutputControls,
) -> Result<()> {
    let records = load_records(settings)?;
    let hits: Vec<_> = engine::search_history(query, &records)
        .into_iter()
        .take(limit)
        .collect();

    if output.wants_json() {
        output.print(&hits);
        return Ok(());
    }

    if hits.is_empty() {
        println!("No profiles matching '{query}'.");
        return Ok(());
    }
    for h in &hits {
        println!("{:>3}  {}  (used {}x)", h.score, h.profile, h.usage_count);
    }
    Ok(())
}
