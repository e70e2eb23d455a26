//! Catalog access over the server's `/api` envelope.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::conversation::CatalogLookup;
use crate::db::CatalogProfile;
use crate::engine::SearchHit;
use crate::error::{Error, Result};
use crate::server::Response;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const PHOTO_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct ProfilesResult<T> {
    profiles: Vec<T>,
}

pub struct HttpCatalogClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_profiles<T: DeserializeOwned>(&self, query: &[(&str, String)]) -> Result<Vec<T>> {
        let response: Response = self
            .client
            .get(self.url("/api/catalog"))
            .query(query)
            .send()?
            .json()?;
        unwrap_envelope::<ProfilesResult<T>>(response).map(|r| r.profiles)
    }

    /// Download a photo served by the server, `url` being its path.
    pub fn fetch_photo(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .get(self.url(url))
            .timeout(PHOTO_TIMEOUT)
            .send()?
            .error_for_status()?
            .bytes()?;
        Ok(bytes.to_vec())
    }
}

fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.ok {
        let message = response
            .error
            .map(|e| format!("{}: {}", e.code, e.message))
            .unwrap_or_else(|| "request failed".into());
        return Err(Error::Telegram(format!("server: {message}")));
    }
    let result = response.result.unwrap_or_default();
    Ok(serde_json::from_value(result)?)
}

impl CatalogLookup for HttpCatalogClient {
    fn list(&self, limit: usize) -> Result<Vec<CatalogProfile>> {
        self.get_profiles(&[("limit", limit.to_string())])
    }

    fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.get_profiles(&[("search", query.to_string())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(result: serde_json::Value) -> Response {
        Response::success("req".into(), result, 0.5)
    }

    #[test]
    fn test_unwrap_search_hits() {
        let response = envelope(json!({
            "profiles": [{"name": "ЮП-1625", "photo_full": "/static/images/ЮП-1625.jpg", "score": 100}],
            "total": 1
        }));
        let hits = unwrap_envelope::<ProfilesResult<SearchHit>>(response)
            .unwrap()
            .profiles;
        assert_eq!(hits[0].score, 100);
        assert_eq!(hits[0].profile.name, "ЮП-1625");
        assert_eq!(hits[0].profile.quantity_per_hanger, None);
    }

    #[test]
    fn test_unwrap_error_envelope() {
        let response = Response::error("req".into(), "ERROR", "boom".into(), 0.1);
        let err = unwrap_envelope::<ProfilesResult<CatalogProfile>>(response).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpCatalogClient::new("http://127.0.0.1:5000/").unwrap();
        assert_eq!(client.url("/api/catalog"), "http://127.0.0.1:5000/api/catalog");
    }
}
