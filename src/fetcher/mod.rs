pub mod cache;
pub mod clock;
pub mod http_fetcher;
pub mod retry;

use async_trait::async_trait;

use crate::app::Result;

pub use cache::RequestCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use http_fetcher::HttpTransport;
pub use retry::RetryPolicy;

/// A response as seen by the cache layer, before any status handling.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Raw `Retry-After` header, if any
    pub retry_after: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One JSON GET against the backend. Dropping the future aborts the request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<RawResponse>;
}
