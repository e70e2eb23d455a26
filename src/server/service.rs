//! Service - dispatches API methods to handlers.
//!
//! Holds hot resources (catalog connection, record cache, photo library,
//! signal log) shared by every request.
//!
//! CHANGELOG:
//! - 14/11/2025 - Photo upload/delete keep catalog refs in sync
//! - 12/11/2025 - recent_profiles, history_search
//! - 06/11/2025 - Signals from the unload tailer
//! - 29/10/2025 - Initial implementation

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::protocol::{CODE_BAD_PARAMS, CODE_CONFLICT, CODE_ERROR, CODE_NOT_FOUND, CODE_UNKNOWN_METHOD};
use super::signals::{SignalLog, UnloadSignal};
use crate::config::Settings;
use crate::db::helpers::{self, ListOrder, ProfileUpdate};
use crate::db::open_catalog;
use crate::engine::{self, Page};
use crate::error::Error;
use crate::photos::{self, PhotoEntry, PhotoLibrary, PhotoSizes};
use crate::records::view::{self, ProductQuery, ProductsView};
use crate::records::{JsonRecordSource, Record, RecordCache};

const DEFAULT_PAGE_SIZE: usize = 50;
const DEFAULT_LIST_LIMIT: usize = 50;

pub type Params = HashMap<String, Value>;

/// Why a method call failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Core(#[from] Error),
}

impl ServiceError {
    /// Envelope error code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::UnknownMethod(_) => CODE_UNKNOWN_METHOD,
            ServiceError::InvalidParams(_) => CODE_BAD_PARAMS,
            ServiceError::Core(Error::InvalidPage)
            | ServiceError::Core(Error::InvalidProfileName(_))
            | ServiceError::Core(Error::Image(_)) => CODE_BAD_PARAMS,
            ServiceError::Core(Error::ProfileNotFound(_)) => CODE_NOT_FOUND,
            ServiceError::Core(Error::ProfileExists(_)) => CODE_CONFLICT,
            ServiceError::Core(_) => CODE_ERROR,
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        ServiceError::Core(Error::Database(e))
    }
}

pub type MethodResult = std::result::Result<Value, ServiceError>;

// ============================================================================
// Param Helpers
// ============================================================================

/// String param; numbers are accepted and rendered as text.
fn param_str(params: &Params, key: &str) -> Option<String> {
    match params.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required_str(params: &Params, key: &str) -> Result<String, ServiceError> {
    param_str(params, key)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidParams(format!("missing '{key}'")))
}

/// Non-negative integer param; numeric strings are accepted.
fn param_usize(params: &Params, key: &str, default: usize) -> Result<usize, ServiceError> {
    let invalid = || ServiceError::InvalidParams(format!("'{key}' must be a non-negative integer"));
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize).ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Query-string values arrive as text; read "true", "12" and "6.5" as
/// scalars.
fn coerce_scalar(value: Value) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    let t = s.trim();
    if let Ok(b) = t.parse::<bool>() {
        return Value::Bool(b);
    }
    if let Ok(i) = t.parse::<i64>() {
        return Value::from(i);
    }
    match t.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        Some(n) => Value::Number(n),
        None => value,
    }
}

/// Deserialize params as sent, retrying with scalar coercion.
fn from_params<T: DeserializeOwned>(params: Params) -> Result<T, ServiceError> {
    let object: serde_json::Map<String, Value> = params.into_iter().collect();
    match serde_json::from_value(Value::Object(object.clone())) {
        Ok(value) => Ok(value),
        Err(first) => {
            let coerced = object.into_iter().map(|(k, v)| (k, coerce_scalar(v))).collect();
            serde_json::from_value(Value::Object(coerced))
                .map_err(|_| ServiceError::InvalidParams(first.to_string()))
        }
    }
}

fn page_json<T: serde::Serialize>(page: &Page<T>) -> MethodResult {
    serde_json::to_value(page).map_err(|e| ServiceError::Core(Error::Json(e)))
}

/// Tuning knobs not tied to a resource.
#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub recent_window: usize,
    pub photo_sizes: PhotoSizes,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            recent_window: 1500,
            photo_sizes: PhotoSizes::default(),
        }
    }
}

/// API service with hot resources.
pub struct Service {
    catalog: Mutex<Connection>,
    records: RecordCache,
    photos: Arc<PhotoLibrary>,
    signals: SignalLog,
    options: ServiceOptions,
    started_at: String,
}

impl Service {
    pub fn new(
        catalog: Connection,
        records: RecordCache,
        photos: Arc<PhotoLibrary>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            records,
            photos,
            signals: SignalLog::default(),
            options,
            started_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Open every resource named in `settings`.
    pub fn open(settings: &Settings) -> crate::error::Result<Self> {
        let catalog = open_catalog(&settings.catalog_db())?;
        let records = RecordCache::new(JsonRecordSource::new(settings.records_file()));
        let photos = Arc::new(PhotoLibrary::open(settings.photo_dir()));
        photos.ensure_dir()?;
        Ok(Self::new(
            catalog,
            records,
            photos,
            ServiceOptions {
                recent_window: settings.recent_window,
                photo_sizes: settings.photo_sizes(),
            },
        ))
    }

    pub fn photos(&self) -> &Arc<PhotoLibrary> {
        &self.photos
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.catalog.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record snapshot, or `None` when the source cannot be read.
    fn records(&self) -> Option<Arc<[Record]>> {
        match self.records.snapshot() {
            Ok(records) => Some(records),
            Err(e) => {
                warn!(error = %e, "record source unavailable");
                None
            }
        }
    }

    /// Dispatch request to appropriate handler.
    pub fn dispatch(&self, method: &str, params: Params) -> MethodResult {
        match method {
            "health" => self.health(),
            "products" => self.products(params),
            "catalog" => self.catalog(params),
            "catalog_upsert" => self.catalog_upsert(params),
            "catalog_delete" => self.catalog_delete(params),
            "catalog_rename" => self.catalog_rename(params),
            "missing_profiles" => self.missing_profiles(params),
            "recent_profiles" => self.recent_profiles(params),
            "history_search" => self.history_search(params),
            "has_photo" => self.has_photo(params),
            "sync_photos" => self.sync_photos(),
            "signal" => self.signal(params),
            "signals" => self.signals(params),
            _ => Err(ServiceError::UnknownMethod(method.to_string())),
        }
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    fn health(&self) -> MethodResult {
        Ok(json!({
            "pid": std::process::id(),
            "started_at": self.started_at,
            "version": env!("CARGO_PKG_VERSION"),
            "records_key": self.records.cache_key(),
            "photos_indexed": self.photos.current().len(),
            "signals": self.signals.len(),
        }))
    }

    // ========================================================================
    // Records: products view and reconciliation
    // ========================================================================

    /// Params: limit, days (default 2), loading, unloading, loading_limit,
    /// unloading_limit
    fn products(&self, params: Params) -> MethodResult {
        let query: ProductQuery = from_params(params)?;
        let view = match self.records() {
            Some(records) => view::products(&records, &query, Local::now().date_naive()),
            None => ProductsView::empty(&query),
        };
        serde_json::to_value(view).map_err(|e| ServiceError::Core(Error::Json(e)))
    }

    /// Params: page_size (default 50), offset (default 0)
    fn missing_profiles(&self, params: Params) -> MethodResult {
        let page_size = param_usize(&params, "page_size", DEFAULT_PAGE_SIZE)?;
        let offset = param_usize(&params, "offset", 0)?;
        let Some(records) = self.records() else {
            return page_json(&Page::<engine::MissingProfile>::empty());
        };
        let page = engine::missing_profiles(&records, &self.photos.current(), page_size, offset)?;
        page_json(&page)
    }

    /// Params: page_size (default 50), offset (default 0), window
    fn recent_profiles(&self, params: Params) -> MethodResult {
        let page_size = param_usize(&params, "page_size", DEFAULT_PAGE_SIZE)?;
        let offset = param_usize(&params, "offset", 0)?;
        let window = param_usize(&params, "window", self.options.recent_window)?;
        let Some(records) = self.records() else {
            return page_json(&Page::<engine::RecentProfile>::empty());
        };
        let page =
            engine::recent_profiles(&records, &self.photos.current(), window, page_size, offset)?;
        page_json(&page)
    }

    /// Params: query, limit (default 50)
    fn history_search(&self, params: Params) -> MethodResult {
        let query = param_str(&params, "query").unwrap_or_default();
        let limit = param_usize(&params, "limit", DEFAULT_LIST_LIMIT)?;
        let hits = match self.records() {
            Some(records) => engine::search_history(&query, &records),
            None => Vec::new(),
        };
        let total = hits.len();
        let results: Vec<_> = hits.into_iter().take(limit).collect();
        Ok(json!({ "results": results, "total": total }))
    }

    /// Params: profile (raw field, may name several profiles)
    fn has_photo(&self, params: Params) -> MethodResult {
        let field = required_str(&params, "profile")?;
        let index = self.photos.current();
        let entry = engine::photo_for(Some(&field), &index).cloned().unwrap_or_default();
        Ok(json!({
            "profile": field,
            "has_photo": entry.has_photo(),
            "thumbnail": entry.thumbnail,
            "full": entry.full,
        }))
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Params: search (fuzzy by name), lookup (substring over name, notes,
    /// quantity, length), order, limit (default 50)
    fn catalog(&self, params: Params) -> MethodResult {
        let limit = param_usize(&params, "limit", DEFAULT_LIST_LIMIT)?;
        let search = param_str(&params, "search").filter(|s| !s.trim().is_empty());
        let lookup = param_str(&params, "lookup").filter(|s| !s.trim().is_empty());
        let order: ListOrder = match params.get("order") {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|_| ServiceError::InvalidParams(format!("unknown order {v}")))?,
            None => ListOrder::default(),
        };

        let conn = self.conn();
        if let Some(query) = search {
            let all = helpers::list_profiles(&conn, ListOrder::Name, None)?;
            let hits = engine::search(&query, &all);
            let total = hits.len();
            let profiles: Vec<_> = hits.into_iter().take(limit).collect();
            return Ok(json!({ "profiles": profiles, "total": total }));
        }
        if let Some(query) = lookup {
            let found = helpers::search_profiles(&conn, &query)?;
            let total = found.len();
            let profiles: Vec<_> = found.into_iter().take(limit).collect();
            return Ok(json!({ "profiles": profiles, "total": total }));
        }

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;
        let profiles = helpers::list_profiles(&conn, order, Some(limit))?;
        Ok(json!({ "profiles": profiles, "total": total }))
    }

    /// Params: name plus any of quantity_per_hanger, length, notes,
    /// photo_thumb, photo_full, usage_count
    fn catalog_upsert(&self, params: Params) -> MethodResult {
        let update: ProfileUpdate = from_params(params)?;
        let conn = self.conn();
        let outcome = helpers::upsert_profile(&conn, &update)?;
        let profile = helpers::get_profile(&conn, &update.name)?;
        Ok(json!({ "outcome": outcome, "profile": profile }))
    }

    /// Params: name
    fn catalog_delete(&self, params: Params) -> MethodResult {
        let name = required_str(&params, "name")?;
        let deleted = helpers::delete_profile(&self.conn(), &name)?;
        Ok(json!({ "name": name, "deleted": deleted }))
    }

    /// Params: old, new
    fn catalog_rename(&self, params: Params) -> MethodResult {
        let old = required_str(&params, "old")?;
        let new = required_str(&params, "new")?;
        helpers::rename_profile(&self.conn(), &old, &new)?;
        Ok(json!({ "old": old, "new": new }))
    }

    // ========================================================================
    // Photos
    // ========================================================================

    /// Rescan the photo folder and mirror it into the catalog.
    fn sync_photos(&self) -> MethodResult {
        let index = self.photos.rebuild();
        let stats = helpers::sync_photos(&mut self.conn(), &index)?;
        Ok(json!({ "photos_indexed": index.len(), "catalog": stats }))
    }

    /// Store an uploaded photo and point the catalog profile at it, creating
    /// the profile when it does not exist yet.
    pub fn upload_photo(&self, name: &str, bytes: &[u8]) -> MethodResult {
        let name = name.trim();
        let entry = photos::save_photo(&self.photos, name, bytes, self.options.photo_sizes)?;
        let conn = self.conn();
        helpers::upsert_profile(
            &conn,
            &ProfileUpdate {
                name: name.to_string(),
                photo_thumb: entry.thumbnail.clone(),
                photo_full: entry.full.clone(),
                ..Default::default()
            },
        )?;
        info!(profile = %name, "photo uploaded");
        Ok(json!({ "name": name, "thumbnail": entry.thumbnail, "full": entry.full }))
    }

    /// Remove a photo and clear the catalog's refs to it.
    pub fn remove_photo(&self, name: &str) -> MethodResult {
        let removed = photos::delete_photo(&self.photos, name)?;
        helpers::set_photos(&self.conn(), name, &PhotoEntry::default())?;
        Ok(json!({ "name": name, "deleted": removed }))
    }

    // ========================================================================
    // Unload signals
    // ========================================================================

    /// Params: hanger_number, exit_time
    fn signal(&self, params: Params) -> MethodResult {
        let signal: UnloadSignal = from_params(params)?;
        info!(hanger = signal.hanger_number, exit_time = %signal.exit_time, "unload signal");
        let total = self.signals.push(signal);
        Ok(json!({ "stored": true, "total": total }))
    }

    /// Params: limit (default 50)
    fn signals(&self, params: Params) -> MethodResult {
        let limit = param_usize(&params, "limit", DEFAULT_LIST_LIMIT)?;
        Ok(json!({ "signals": self.signals.newest(limit), "total": self.signals.len() }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use std::path::Path;

    pub(crate) const SHEET: &str = r#"[
        {"date": "2025-11-20", "number": 1, "profile": "ЮП-1625"},
        {"date": "2025-11-21", "number": 2, "profile": "CP-100 + ЮП-1625"},
        {"date": "2025-11-22", "number": 3, "time": "09:10", "profile": "КОРПУС"},
        {"date": "2025-11-23", "number": 4, "profile": "ЮП-1625"}
    ]"#;

    /// Service over a temp dir holding `records.json` and an `images/` folder.
    pub(crate) fn service_in(dir: &Path, sheet: Option<&str>) -> Service {
        let records_path = dir.join("records.json");
        if let Some(sheet) = sheet {
            std::fs::write(&records_path, sheet).unwrap();
        }
        let images = dir.join("images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("CP-100-thumb.jpg"), b"x").unwrap();
        Service::new(
            open_in_memory().unwrap(),
            RecordCache::new(JsonRecordSource::new(records_path)),
            Arc::new(PhotoLibrary::open(images)),
            ServiceOptions::default(),
        )
    }

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_query_string_params_coerced() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        let result = service
            .dispatch(
                "products",
                params(&[("days", json!("0")), ("loading", json!("true"))]),
            )
            .unwrap();
        assert_eq!(result["days_filter"], 0);
        let upserted = service
            .dispatch(
                "catalog_upsert",
                params(&[("name", json!("A-1")), ("quantity_per_hanger", json!("40"))]),
            )
            .unwrap();
        assert_eq!(upserted["profile"]["quantity_per_hanger"], 40);
    }

    #[test]
    fn test_unknown_method() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        let err = service.dispatch("nope", Params::new()).unwrap_err();
        assert_eq!(err.code(), CODE_UNKNOWN_METHOD);
    }

    #[test]
    fn test_missing_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        let result = service
            .dispatch("missing_profiles", params(&[("page_size", json!("10"))]))
            .unwrap();
        let names: Vec<&str> = result["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["profile"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["ЮП-1625", "КОРПУС"]);
        assert_eq!(result["total"], 2);
        assert_eq!(result["entries"][0]["row_number"], 5);
    }

    #[test]
    fn test_unavailable_source_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), None);
        let missing = service.dispatch("missing_profiles", Params::new()).unwrap();
        assert_eq!(missing["total"], 0);
        assert_eq!(missing["has_more"], false);
        let products = service.dispatch("products", Params::new()).unwrap();
        assert_eq!(products["total"], 0);
        let history = service
            .dispatch("history_search", params(&[("query", json!("юп"))]))
            .unwrap();
        assert_eq!(history["total"], 0);
    }

    #[test]
    fn test_zero_page_size_is_bad_params() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        let err = service
            .dispatch("missing_profiles", params(&[("page_size", json!(0))]))
            .unwrap_err();
        assert_eq!(err.code(), CODE_BAD_PARAMS);
    }

    #[test]
    fn test_recent_profiles_reports_photos() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        let result = service
            .dispatch("recent_profiles", params(&[("window", json!(3))]))
            .unwrap();
        let entries = result["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2]["profile"], "CP-100 + ЮП-1625");
        assert_eq!(entries[2]["has_photo"], true);
        assert_eq!(entries[2]["thumbnail"], "/static/images/CP-100-thumb.jpg");
    }

    #[test]
    fn test_catalog_flow() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        for (name, usage) in [("ЮП-1625", 5), ("юп-1625b", 9)] {
            service
                .dispatch(
                    "catalog_upsert",
                    params(&[("name", json!(name)), ("usage_count", json!(usage))]),
                )
                .unwrap();
        }

        let found = service
            .dispatch("catalog", params(&[("search", json!("юп-1625"))]))
            .unwrap();
        assert_eq!(found["total"], 2);
        assert_eq!(found["profiles"][0]["name"], "ЮП-1625");
        assert_eq!(found["profiles"][0]["score"], 100);

        let err = service
            .dispatch(
                "catalog_rename",
                params(&[("old", json!("ЮП-1625")), ("new", json!("юп-1625b"))]),
            )
            .unwrap_err();
        assert_eq!(err.code(), CODE_CONFLICT);

        let deleted = service
            .dispatch("catalog_delete", params(&[("name", json!("юп-1625b"))]))
            .unwrap();
        assert_eq!(deleted["deleted"], true);

        let listed = service.dispatch("catalog", Params::new()).unwrap();
        assert_eq!(listed["total"], 1);
    }

    #[test]
    fn test_has_photo() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        let result = service
            .dispatch("has_photo", params(&[("profile", json!("X-1 + cp-100"))]))
            .unwrap();
        assert_eq!(result["has_photo"], true);
        let err = service.dispatch("has_photo", Params::new()).unwrap_err();
        assert_eq!(err.code(), CODE_BAD_PARAMS);
    }

    #[test]
    fn test_signals() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        for n in [12, 13] {
            service
                .dispatch(
                    "signal",
                    params(&[("hanger_number", json!(n)), ("exit_time", json!("10:00:01"))]),
                )
                .unwrap();
        }
        let result = service.dispatch("signals", Params::new()).unwrap();
        assert_eq!(result["total"], 2);
        assert_eq!(result["signals"][0]["hanger_number"], 13);

        let err = service
            .dispatch("signal", params(&[("exit_time", json!("10:00:01"))]))
            .unwrap_err();
        assert_eq!(err.code(), CODE_BAD_PARAMS);
    }

    #[test]
    fn test_upload_rejects_name_that_is_not_a_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        let err = service.upload_photo("A:B", b"jpeg").unwrap_err();
        assert_eq!(err.code(), CODE_BAD_PARAMS);

        let listed = service.dispatch("catalog", Params::new()).unwrap();
        assert_eq!(listed["total"], 0);
        let result = service
            .dispatch("has_photo", params(&[("profile", json!("A_B"))]))
            .unwrap();
        assert_eq!(result["has_photo"], false);
    }

    #[test]
    fn test_sync_photos() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(dir.path(), Some(SHEET));
        service
            .dispatch("catalog_upsert", params(&[("name", json!("CP-100"))]))
            .unwrap();
        let result = service.dispatch("sync_photos", Params::new()).unwrap();
        assert_eq!(result["catalog"]["with_photo"], 1);
        assert_eq!(result["catalog"]["updated"], 1);
    }
}
