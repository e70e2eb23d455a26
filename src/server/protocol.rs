//! Response envelope shared by every `/api` route.
//!
//! CHANGELOG:
//! - 06/11/2025 - Status codes carried by error code
//! - 29/10/2025 - Initial implementation

use serde::{Deserialize, Serialize};

/// Current envelope version.
pub const PROTOCOL_VERSION: u8 = 1;

/// Error codes.
pub const CODE_UNKNOWN_METHOD: &str = "UNKNOWN_METHOD";
pub const CODE_BAD_PARAMS: &str = "BAD_PARAMS";
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";
pub const CODE_CONFLICT: &str = "CONFLICT";
pub const CODE_ERROR: &str = "ERROR";

/// API response.
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// Request ID, echoed from `X-Request-Id` or generated
    pub id: String,
    /// Success flag
    pub ok: bool,
    /// Result data (if successful)
    pub result: Option<serde_json::Value>,
    /// Error information (if failed)
    pub error: Option<ErrorInfo>,
    /// Response metadata
    pub meta: ResponseMeta,
}

/// Error details in response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (e.g., "ERROR", "NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    pub details: Option<serde_json::Value>,
}

/// Response metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Server execution time in milliseconds
    pub server_ms: f64,
    /// Protocol version
    pub protocol_v: u8,
}

impl Response {
    /// Create a success response.
    pub fn success(id: String, result: serde_json::Value, server_ms: f64) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    /// Create an error response.
    pub fn error(id: String, code: &str, message: String, server_ms: f64) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(ErrorInfo {
                code: code.to_string(),
                message,
                details: None,
            }),
            meta: ResponseMeta {
                server_ms,
                protocol_v: PROTOCOL_VERSION,
            },
        }
    }

    /// HTTP status for this response.
    pub fn status_code(&self) -> u16 {
        match self.error.as_ref().map(|e| e.code.as_str()) {
            None => 200,
            Some(CODE_UNKNOWN_METHOD) | Some(CODE_NOT_FOUND) => 404,
            Some(CODE_BAD_PARAMS) => 400,
            Some(CODE_CONFLICT) => 409,
            Some(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let ok = Response::success("1".into(), serde_json::json!({}), 0.1);
        assert_eq!(ok.status_code(), 200);
        for (code, status) in [
            (CODE_UNKNOWN_METHOD, 404),
            (CODE_NOT_FOUND, 404),
            (CODE_BAD_PARAMS, 400),
            (CODE_CONFLICT, 409),
            (CODE_ERROR, 500),
        ] {
            assert_eq!(Response::error("1".into(), code, "x".into(), 0.1).status_code(), status);
        }
    }

    #[test]
    fn test_envelope_shape() {
        let v = serde_json::to_value(Response::error("abc".into(), CODE_ERROR, "boom".into(), 1.5))
            .unwrap();
        assert_eq!(v["id"], "abc");
        assert_eq!(v["ok"], false);
        assert_eq!(v["error"]["code"], "ERROR");
        assert_eq!(v["meta"]["protocol_v"], 1);
        assert!(v["result"].is_null());
    }
}
