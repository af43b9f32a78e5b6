use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use crate::transport::{HttpTransport, QueryPairs, TransportError};

/// A recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub query: QueryPairs,
}

impl RecordedRequest {
    /// First value of a query key
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

type Responder = Box<dyn Fn(&RecordedRequest) -> Result<Value, TransportError> + Send + Sync>;

/// Scripted in-process transport for tests and offline runs.
///
/// Responses are matched by URL. Queued responses for a URL are consumed in
/// order; a responder installed with [`MockTransport::respond_with`] answers
/// any request for that URL once its queue is empty. Unmatched requests fail
/// with a 404.
#[derive(Default)]
pub struct MockTransport {
    queued: Mutex<HashMap<String, VecDeque<Result<Value, TransportError>>>>,
    responders: Mutex<HashMap<String, Responder>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful body for the next request to `url`
    pub fn push_ok(&self, url: impl Into<String>, body: Value) {
        self.push(url, Ok(body));
    }

    /// Queue a failure for the next request to `url`
    pub fn push_err(&self, url: impl Into<String>, err: TransportError) {
        self.push(url, Err(err));
    }

    fn push(&self, url: impl Into<String>, response: Result<Value, TransportError>) {
        self.queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.into())
            .or_default()
            .push_back(response);
    }

    /// Answer every request to `url` through `responder`
    pub fn respond_with<F>(&self, url: impl Into<String>, responder: F)
    where
        F: Fn(&RecordedRequest) -> Result<Value, TransportError> + Send + Sync + 'static,
    {
        self.responders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.into(), Box::new(responder));
    }

    /// All requests seen so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Requests made to one URL
    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<Value, TransportError> {
        let request = RecordedRequest {
            url: url.to_string(),
            query: query.to_vec(),
        };
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        // Let concurrent callers interleave like a real network round trip
        tokio::task::yield_now().await;

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        if let Some(response) = queued {
            return response;
        }

        let responders = self.responders.lock().unwrap_or_else(PoisonError::into_inner);
        match responders.get(url) {
            Some(responder) => responder(&request),
            None => Err(TransportError::with_detail(404, "Not found.")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queue_then_responder() {
        let mock = MockTransport::new();
        mock.push_ok("/a", json!({"n": 1}));
        mock.respond_with("/a", |req| Ok(json!({"page": req.param("page")})));

        let query = vec![("page".to_string(), "2".to_string())];
        assert_eq!(mock.get("/a", &query).await.unwrap(), json!({"n": 1}));
        assert_eq!(mock.get("/a", &query).await.unwrap(), json!({"page": "2"}));
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let mock = MockTransport::new();
        let err = mock.get("/missing", &[]).await.unwrap_err();
        assert_eq!(err.status, Some(404));
    }
}
