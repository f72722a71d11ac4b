//! Shared fixtures for unit tests that need a backend.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::app::Result;
use crate::config::CacheConfig;
use crate::fetcher::{RawResponse, RequestCache, Transport};

type Handler = dyn Fn(&Url) -> RawResponse + Send + Sync;

/// In-process backend answering every GET through a closure.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&Url) -> RawResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose path ends with `suffix`.
    pub fn hits(&self, suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter_map(|r| Url::parse(r).ok())
            .filter(|u| u.path().ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let parsed = Url::parse(url)?;
        Ok((self.handler)(&parsed))
    }
}

pub fn json(status: u16, body: &Value) -> RawResponse {
    RawResponse {
        status,
        retry_after: None,
        body: body.to_string().into_bytes(),
    }
}

pub fn query_u64(url: &Url, key: &str) -> Option<u64> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.parse().ok())
}

pub fn cache(transport: Arc<MockTransport>) -> Arc<RequestCache> {
    Arc::new(RequestCache::new(transport, &CacheConfig::default()))
}

pub const BASE_URL: &str = "https://api.example.com/api";
