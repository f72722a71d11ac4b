//! Page-by-page and fetch-all iteration over list endpoints.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::app::{LecternError, Result};
use crate::config::PaginationConfig;
use crate::domain::fields::{is_truthy, scalar_to_string};
use crate::domain::ListResponse;
use crate::fetcher::RequestCache;
use crate::normalizer::{Normalizer, PageRequest};

const PUBLISH_KEYS: [&str; 3] = ["is_published", "isPublished", "published"];

/// Predicate over a raw list item.
pub type ItemFilter = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Default publish predicate. Items without any publish flag are visible.
pub fn is_published(raw: &Value) -> bool {
    PUBLISH_KEYS
        .iter()
        .find_map(|key| raw.get(*key).filter(|v| !v.is_null()))
        .map(is_truthy)
        .unwrap_or(true)
}

/// Options for [`PaginationWalker::list_all`]. Unset values come from config.
#[derive(Clone, Default)]
pub struct ListAllOptions {
    pub limit: Option<u64>,
    pub published_only: bool,
    /// Replaces the default publish predicate
    pub filter: Option<ItemFilter>,
    pub hard_page_cap: Option<u64>,
}

impl ListAllOptions {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    fn keeps(&self, item: &Value) -> bool {
        match (&self.filter, self.published_only) {
            (Some(filter), _) => filter(item),
            (None, true) => is_published(item),
            (None, false) => true,
        }
    }
}

pub struct PaginationWalker {
    cache: Arc<RequestCache>,
    normalizer: Normalizer,
    base_url: String,
    config: PaginationConfig,
}

impl PaginationWalker {
    pub fn new(cache: Arc<RequestCache>, base_url: &str, config: PaginationConfig) -> Self {
        Self {
            cache,
            normalizer: Normalizer::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Absolute URL for a resource path.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Ok(Url::parse(&joined)?)
    }

    fn page_url(&self, path: &str, page: u64, limit: u64) -> Result<String> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        Ok(url.into())
    }

    fn detail_url(&self, path: &str, id: &str) -> Result<String> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| LecternError::Config(format!("Base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .push(id);
        Ok(url.into())
    }

    /// Fetch and normalize a single page.
    pub async fn list_page(
        &self,
        path: &str,
        page: u64,
        limit: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<ListResponse<Value>> {
        let page = page.max(1);
        let limit = limit.max(1);
        let url = self.page_url(path, page, limit)?;
        let payload = self.cache.get_value(&url, cancel).await?;
        Ok(self
            .normalizer
            .normalize_page(&payload, Some(PageRequest { page, limit })))
    }

    /// Walk pages until exhausted or the page cap is reached, returning every kept item.
    pub async fn list_all(
        &self,
        path: &str,
        options: &ListAllOptions,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Value>> {
        let limit = options.limit.unwrap_or(self.config.default_limit).max(1);
        let cap = options.hard_page_cap.unwrap_or(self.config.hard_page_cap).max(1);

        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let response = self.list_page(path, page, limit, cancel).await?;
            let pagination = response.pagination;
            let exhausted = response.data.is_empty();

            items.extend(response.data.into_iter().filter(|item| options.keeps(item)));

            if exhausted || !pagination.has_next_page || page >= pagination.total_pages {
                break;
            }
            if page >= cap {
                warn!("Stopped listing {} at the {} page cap", path, cap);
                break;
            }
            page += 1;
        }

        debug!("Listed {} items from {} in {} pages", items.len(), path, page);
        Ok(items)
    }

    /// Walk up to `max_pages` pages looking for the first item matching `predicate`.
    pub async fn scan_for<F>(
        &self,
        path: &str,
        predicate: F,
        max_pages: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<Option<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        let limit = self.config.default_limit.max(1);

        for page in 1..=max_pages.max(1) {
            let response = self.list_page(path, page, limit, cancel).await?;
            let pagination = response.pagination;
            let exhausted = response.data.is_empty();

            if let Some(found) = response.data.into_iter().find(|item| predicate(item)) {
                return Ok(Some(found));
            }
            if exhausted || !pagination.has_next_page || page >= pagination.total_pages {
                break;
            }
        }

        Ok(None)
    }

    /// Find an item by id by walking the list endpoint.
    pub async fn scan_by_id(&self, path: &str, id: &str, cancel: Option<&CancellationToken>) -> Result<Value> {
        let wanted = id.trim();
        self.scan_for(
            path,
            |item| item.get("id").and_then(scalar_to_string).as_deref() == Some(wanted),
            self.config.scan_max_pages,
            cancel,
        )
        .await?
        .ok_or_else(|| LecternError::NotFound(format!("{} with id {}", path, wanted)))
    }

    /// Fetch `path/id` directly; on any failure other than cancellation, fall
    /// back to scanning the list.
    pub async fn detail_or_scan(&self, path: &str, id: &str, cancel: Option<&CancellationToken>) -> Result<Value> {
        let url = self.detail_url(path, id.trim())?;

        match self.cache.get_value(&url, cancel).await {
            Ok(payload) => {
                if let Some(record) = self.normalizer.unwrap_record(&payload) {
                    return Ok(record);
                }
                debug!("{} carried no record, scanning {}", url, path);
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => warn!("Detail request {} failed ({}), scanning {}", url, e, path),
        }

        self.scan_by_id(path, id, cancel).await
    }
}
