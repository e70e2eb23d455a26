//! HTTP routes over `Service`.
//!
//! `GET|POST /api/{method}` feeds query-string and JSON-body params to
//! `Service::dispatch` and wraps the outcome in the response envelope.
//! Service calls block (SQLite, image codecs) and run on actix's blocking
//! pool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::Value;
use tracing::{info, warn};

use super::protocol::{Response, CODE_BAD_PARAMS, CODE_ERROR};
use super::service::{MethodResult, Params, Service};

/// Largest accepted upload.
const MAX_PHOTO_BYTES: usize = 20 * 1024 * 1024;

fn request_id(req: &HttpRequest) -> String {
    req.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn envelope(response: Response) -> HttpResponse {
    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(response)
}

/// Run `call` on the blocking pool and wrap its outcome.
async fn respond<F>(req: &HttpRequest, call: F) -> HttpResponse
where
    F: FnOnce() -> MethodResult + Send + 'static,
{
    let id = request_id(req);
    let started = Instant::now();
    let outcome = web::block(call).await;
    let server_ms = started.elapsed().as_secs_f64() * 1000.0;

    let response = match outcome {
        Ok(Ok(result)) => Response::success(id, result, server_ms),
        Ok(Err(e)) => {
            warn!(path = %req.path(), code = e.code(), error = %e, "request failed");
            Response::error(id, e.code(), e.to_string(), server_ms)
        }
        Err(e) => Response::error(id, CODE_ERROR, e.to_string(), server_ms),
    };
    envelope(response)
}

fn query_params(query: HashMap<String, String>) -> Params {
    query.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

// ============================================================================
// Handlers
// ============================================================================

async fn health(req: HttpRequest, service: web::Data<Service>) -> HttpResponse {
    let service = service.into_inner();
    respond(&req, move || service.dispatch("health", Params::new())).await
}

async fn api_get(
    req: HttpRequest,
    method: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
    service: web::Data<Service>,
) -> HttpResponse {
    let method = method.into_inner();
    let params = query_params(query.into_inner());
    let service = service.into_inner();
    respond(&req, move || service.dispatch(&method, params)).await
}

async fn api_post(
    req: HttpRequest,
    method: web::Path<String>,
    query: web::Query<HashMap<String, String>>,
    body: web::Bytes,
    service: web::Data<Service>,
) -> HttpResponse {
    let method = method.into_inner();
    let mut params = query_params(query.into_inner());

    if !body.iter().all(u8::is_ascii_whitespace) {
        match serde_json::from_slice::<Value>(&body) {
            Ok(Value::Object(fields)) => params.extend(fields),
            _ => {
                let response = Response::error(
                    request_id(&req),
                    CODE_BAD_PARAMS,
                    "body must be a JSON object".to_string(),
                    0.0,
                );
                return envelope(response);
            }
        }
    }

    let service = service.into_inner();
    respond(&req, move || service.dispatch(&method, params)).await
}

async fn upload_photo(
    req: HttpRequest,
    name: web::Path<String>,
    body: web::Bytes,
    service: web::Data<Service>,
) -> HttpResponse {
    let name = name.into_inner();
    let service = service.into_inner();
    respond(&req, move || service.upload_photo(&name, &body)).await
}

async fn delete_photo(
    req: HttpRequest,
    name: web::Path<String>,
    service: web::Data<Service>,
) -> HttpResponse {
    let name = name.into_inner();
    let service = service.into_inner();
    respond(&req, move || service.remove_photo(&name)).await
}

fn content_type(file: &str) -> &'static str {
    let ext = file.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Plain file names only; anything that could leave the photo folder is
/// refused.
fn is_plain_file_name(file: &str) -> bool {
    !file.is_empty()
        && !file.starts_with('.')
        && !file.contains(['/', '\\'])
        && !file.contains("..")
}

async fn static_image(file: web::Path<String>, service: web::Data<Service>) -> HttpResponse {
    let file = file.into_inner();
    if !is_plain_file_name(&file) {
        return HttpResponse::NotFound().finish();
    }
    let path = service.photos().dir().join(&file);
    match web::block(move || std::fs::read(path)).await {
        Ok(Ok(bytes)) => HttpResponse::Ok()
            .content_type(content_type(&file))
            .body(bytes),
        _ => HttpResponse::NotFound().finish(),
    }
}

// ============================================================================
// Wiring
// ============================================================================

/// Register every route. `Service` must be in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_PHOTO_BYTES))
        .route("/health", web::get().to(health))
        .route("/api/photos/{name}", web::post().to(upload_photo))
        .route("/api/photos/{name}", web::delete().to(delete_photo))
        .route("/api/{method}", web::get().to(api_get))
        .route("/api/{method}", web::post().to(api_post))
        .route("/static/images/{file}", web::get().to(static_image));
}

/// Serve until the process is stopped.
pub async fn serve(service: Arc<Service>, bind_addr: &str) -> std::io::Result<()> {
    let data = web::Data::from(service);
    info!(bind = %bind_addr, "HTTP server listening");
    HttpServer::new(move || App::new().app_data(data.clone()).configure(configure))
        .bind(bind_addr)?
        .run()
        .await
}
