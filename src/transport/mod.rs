pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use http::ReqwestTransport;
pub use mock::MockTransport;

/// Query pairs in send order; repeated keys encode list values.
pub type QueryPairs = Vec<(String, String)>;

/// Failure raised by a transport, carried out-of-band from the JSON body.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    /// Decoded error body, if the server sent JSON
    pub body: Option<Value>,
    pub message: String,
}

impl TransportError {
    pub fn new(status: Option<u16>, body: Option<Value>, message: impl Into<String>) -> Self {
        Self {
            status,
            body,
            message: message.into(),
        }
    }

    /// Error with an HTTP status and a `{"detail": ...}` body
    pub fn with_detail(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            status: Some(status),
            body: Some(serde_json::json!({ "detail": detail.clone() })),
            message: format!("HTTP {status}: {detail}"),
        }
    }
}

/// The sole network primitive: `GET url?query` returning the JSON body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value, TransportError>;

    /// Transport name for logging
    fn name(&self) -> &str;
}
