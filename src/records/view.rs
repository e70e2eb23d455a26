//! Filtered product view for the shop-floor screen.
//!
//! Rows without a time of day are hangers still being loaded; rows with a
//! time have been unloaded. The screen shows either list or both side by side.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{Quantity, Record};

/// Shown for absent cells.
pub const PLACEHOLDER: &str = "—";

const DEFAULT_DAYS: u32 = 2;
const DEFAULT_SIDE_LIMIT: usize = 10;

/// Filter parameters for the product view.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductQuery {
    pub limit: Option<usize>,
    #[serde(default = "default_days")]
    pub days: Option<u32>,
    /// Only hangers still loading (no time of day yet).
    #[serde(default, alias = "no_time_filter")]
    pub loading: bool,
    /// Only unloaded hangers (time of day present).
    #[serde(default, alias = "unload_filter")]
    pub unloading: bool,
    pub loading_limit: Option<usize>,
    pub unloading_limit: Option<usize>,
}

fn default_days() -> Option<u32> {
    Some(DEFAULT_DAYS)
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: None,
            days: default_days(),
            loading: false,
            unloading: false,
            loading_limit: None,
            unloading_limit: None,
        }
    }
}

/// One display row.
#[derive(Debug, Clone, Serialize)]
pub struct ProductRow {
    pub number: String,
    pub date: String,
    pub time: String,
    pub client: String,
    pub profile: String,
    pub color: String,
    pub lamels_qty: Value,
    pub kpz_number: String,
    pub material_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductsView {
    pub products: Vec<ProductRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unloading_products: Option<Vec<ProductRow>>,
    pub total: usize,
    pub total_all: usize,
    pub days_filter: Option<u32>,
    pub dual_mode: bool,
}

impl ProductsView {
    pub fn empty(query: &ProductQuery) -> Self {
        Self {
            products: Vec::new(),
            unloading_products: None,
            total: 0,
            total_all: 0,
            days_filter: query.days,
            dual_mode: query.loading && query.unloading,
        }
    }
}

fn or_placeholder(value: Option<&str>) -> String {
    value.unwrap_or(PLACEHOLDER).to_string()
}

/// Format a record for display.
pub fn product_row(r: &Record) -> ProductRow {
    let lamels_qty = match &r.lamels_qty {
        Some(Quantity::Count(n)) => json!(n),
        Some(Quantity::Text(t)) => json!(t),
        None => json!(0),
    };
    ProductRow {
        number: or_placeholder(r.sequence_number.as_deref()),
        date: r
            .date
            .map(|d| d.format("%d.%m.%y").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        time: r
            .time_of_day
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        client: or_placeholder(r.client.as_deref()),
        profile: or_placeholder(r.profile()),
        color: or_placeholder(r.color.as_deref()),
        lamels_qty,
        kpz_number: or_placeholder(r.kpz_number.as_deref()),
        material_type: or_placeholder(r.material_type.as_deref()),
    }
}

fn is_loading(r: &Record) -> bool {
    r.time_of_day.is_none() && r.profile().is_some()
}

fn is_unloaded(r: &Record) -> bool {
    r.time_of_day.is_some()
}

fn tail<'a>(rows: &[&'a Record], n: usize) -> Vec<&'a Record> {
    rows[rows.len().saturating_sub(n)..].to_vec()
}

fn rows(records: &[&Record]) -> Vec<ProductRow> {
    records.iter().map(|r| product_row(r)).collect()
}

/// Build the product view as of `today`.
pub fn products(records: &[Record], query: &ProductQuery, today: NaiveDate) -> ProductsView {
    let total_all = records.len();

    let filtered: Vec<&Record> = match query.days.filter(|d| *d > 0) {
        Some(days) => {
            // `days` calendar days counting today
            let cutoff = today - Duration::days(i64::from(days));
            records
                .iter()
                .filter(|r| r.date.is_some_and(|d| d > cutoff))
                .collect()
        }
        None => records.iter().collect(),
    };

    let mut view = ProductsView {
        total_all,
        ..ProductsView::empty(query)
    };

    if query.loading && query.unloading {
        let loading: Vec<&Record> = filtered
            .iter()
            .copied()
            .filter(|r| is_loading(r))
            .take(query.loading_limit.unwrap_or(DEFAULT_SIDE_LIMIT))
            .collect();
        let unloaded: Vec<&Record> = filtered.iter().copied().filter(|r| is_unloaded(r)).collect();
        let unloaded = tail(&unloaded, query.unloading_limit.unwrap_or(DEFAULT_SIDE_LIMIT));

        view.products = rows(&loading);
        let unloading_products = rows(&unloaded);
        view.total = view.products.len() + unloading_products.len();
        view.unloading_products = Some(unloading_products);
        return view;
    }

    let selected: Vec<&Record> = if query.loading {
        let limit = query
            .loading_limit
            .or(query.limit)
            .unwrap_or(DEFAULT_SIDE_LIMIT);
        filtered.into_iter().filter(|r| is_loading(r)).take(limit).collect()
    } else if query.unloading {
        let unloaded: Vec<&Record> = filtered.into_iter().filter(|r| is_unloaded(r)).collect();
        tail(&unloaded, query.unloading_limit.unwrap_or(DEFAULT_SIDE_LIMIT))
    } else {
        let mut newest = match query.limit {
            Some(n) => tail(&filtered, n),
            None => filtered,
        };
        newest.reverse();
        newest
    };

    view.products = rows(&selected);
    view.total = view.products.len();
    view
}
