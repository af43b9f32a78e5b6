use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::TransportError;

/// Main error type for the catalog client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Durable store errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP client construction/transport errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Normalized catalog API failure
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Response arrived for a navigation generation that is no longer current
    #[error("Response discarded: navigation generation {0} superseded")]
    Superseded(u64),

    /// Cache/store errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// HTTP status of a normalized API failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(err) => err.status,
            _ => None,
        }
    }
}

impl From<String> for ClientError {
    fn from(s: String) -> Self {
        ClientError::Other(s)
    }
}

impl From<&str> for ClientError {
    fn from(s: &str) -> Self {
        ClientError::Other(s.to_string())
    }
}

/// Uniform `{reason, status}` failure shape handed to UI callers.
///
/// `reason` is the server's `detail` message when it sent one, otherwise a
/// fixed per-operation message. `status` is absent for failures that never
/// produced an HTTP response (connection refused, undecodable body, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{reason}")]
pub struct ApiError {
    pub reason: String,
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(reason: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            reason: reason.into(),
            status,
        }
    }

    /// Normalize a transport failure, preferring the body's `detail` string
    pub fn from_transport(err: TransportError, default_reason: &str) -> Self {
        let reason = err
            .body
            .as_ref()
            .and_then(|body| body.get("detail"))
            .and_then(|detail| detail.as_str())
            .filter(|detail| !detail.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_reason.to_string());

        Self {
            reason,
            status: err.status,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_becomes_reason() {
        let err = TransportError::new(Some(404), Some(json!({"detail": "User not found."})), "HTTP 404");
        let api = ApiError::from_transport(err, "Unable to load games.");

        assert_eq!(api.reason, "User not found.");
        assert_eq!(api.status, Some(404));
        assert!(api.is_not_found());
    }

    #[test]
    fn test_default_reason_without_detail() {
        let err = TransportError::new(Some(500), Some(json!({"oops": 1})), "HTTP 500");
        let api = ApiError::from_transport(err, "Unable to load games.");

        assert_eq!(api.reason, "Unable to load games.");
        assert_eq!(api.status, Some(500));

        let offline = TransportError::new(None, None, "connection refused");
        let api = ApiError::from_transport(offline, "Unable to load game.");
        assert_eq!(api.reason, "Unable to load game.");
        assert_eq!(api.status, None);
    }

    #[test]
    fn test_client_error_status() {
        let err: ClientError = ApiError::new("boom", Some(502)).into();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "boom");
        assert_eq!(ClientError::from("plain").status(), None);
    }
}
