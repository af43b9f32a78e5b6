use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::Result;
use crate::transport::{HttpTransport, TransportError};

/// reqwest-backed catalog transport
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create new transport with a request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("rg-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> std::result::Result<Value, TransportError> {
        tracing::debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError::new(e.status().map(|s| s.as_u16()), None, format!("Request failed: {e}")))?;

        let status = response.status();

        if !status.is_success() {
            // Error bodies are JSON (`{"detail": ...}`) when the API produced them
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<Value>(&text).ok();
            return Err(TransportError::new(
                Some(status.as_u16()),
                body,
                format!("HTTP {status}"),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::new(Some(status.as_u16()), None, format!("Invalid JSON: {e}")))
    }

    fn name(&self) -> &str {
        "reqwest"
    }
}
