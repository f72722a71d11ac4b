//! Typed facades over the backend's list and detail endpoints.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::app::{LecternError, Result};
use crate::domain::{
    Article, ListResponse, Magazine, Monologue, ResearchPaper, ShopItem, TimelineEntry, TimelineMeta,
    VideoLink,
};
use crate::pagination::{is_published, ListAllOptions, PaginationWalker};
use crate::sanitizer::Sanitizer;

/// A record type served by one backend collection.
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    /// Collection name, also the default endpoint path segment
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn slug(&self) -> Option<&str> {
        None
    }

    /// Id of the owning record for nested collections.
    fn parent_id(&self) -> Option<&str> {
        None
    }

    /// Run every HTML-bearing field through the sanitizer.
    fn sanitize_html(&mut self, _sanitizer: &Sanitizer) {}

    /// Whether a raw list item is shown on public listings.
    fn is_visible(raw: &Value) -> bool {
        is_published(raw)
    }

    fn path() -> String {
        format!("/{}", Self::KIND)
    }
}

pub struct ResourceFacade<R> {
    walker: Arc<PaginationWalker>,
    sanitizer: Sanitizer,
    path: String,
    _record: PhantomData<fn() -> R>,
}

pub type Articles = ResourceFacade<Article>;
pub type Magazines = ResourceFacade<Magazine>;
pub type Research = ResourceFacade<ResearchPaper>;
pub type Monologues = ResourceFacade<Monologue>;
pub type Shop = ResourceFacade<ShopItem>;
pub type Timeline = ResourceFacade<TimelineEntry>;
pub type TimelineMetas = ResourceFacade<TimelineMeta>;
pub type VideoLinks = ResourceFacade<VideoLink>;

impl<R: Resource> ResourceFacade<R> {
    pub fn new(walker: Arc<PaginationWalker>, sanitizer: Sanitizer) -> Self {
        Self {
            walker,
            sanitizer,
            path: R::path(),
            _record: PhantomData,
        }
    }

    /// Serve this collection from another path, e.g. an admin route.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Every visible record across all pages. A record repeated on a later
    /// page (the listing shifted mid-walk) is kept once.
    pub async fn list(&self, cancel: Option<&CancellationToken>) -> Result<Vec<R>> {
        let options = ListAllOptions::published().with_filter(R::is_visible);
        let raw = self.walker.list_all(&self.path, &options, cancel).await?;
        let mut seen = HashSet::new();
        Ok(decode_all::<R>(raw)
            .into_iter()
            .filter(|record| seen.insert(record.id().to_string()))
            .collect())
    }

    /// One page, unfiltered.
    pub async fn list_paginated(
        &self,
        page: u64,
        limit: u64,
        cancel: Option<&CancellationToken>,
    ) -> Result<ListResponse<R>> {
        let response = self.walker.list_page(&self.path, page, limit, cancel).await?;
        Ok(ListResponse {
            success: response.success,
            message: response.message,
            data: decode_all(response.data),
            pagination: response.pagination,
        })
    }

    /// Direct detail lookup, falling back to a bounded list scan.
    pub async fn detail_by_id(&self, id: &str, cancel: Option<&CancellationToken>) -> Result<R> {
        let raw = self.walker.detail_or_scan(&self.path, id, cancel).await?;
        self.decode_detail(raw)
    }

    /// Find a visible record by slug, trimmed and case-insensitive.
    pub async fn detail_by_slug(&self, slug: &str, cancel: Option<&CancellationToken>) -> Result<R> {
        let wanted = slug.trim().to_lowercase();
        let matches = |raw: &Value| {
            R::is_visible(raw)
                && serde_json::from_value::<R>(raw.clone())
                    .ok()
                    .and_then(|record| record.slug().map(|s| s.trim().to_lowercase()))
                    .is_some_and(|s| s == wanted)
        };

        let max_pages = self.walker.config().scan_max_pages;
        let raw = self
            .walker
            .scan_for(&self.path, matches, max_pages, cancel)
            .await?
            .ok_or_else(|| LecternError::NotFound(format!("{} with slug {}", R::KIND, slug.trim())))?;
        self.decode_detail(raw)
    }

    /// Visible records belonging to `parent_id`.
    pub async fn by_parent_id(&self, parent_id: &str, cancel: Option<&CancellationToken>) -> Result<Vec<R>> {
        let parent_id = parent_id.trim();
        Ok(self
            .list(cancel)
            .await?
            .into_iter()
            .filter(|record| record.parent_id() == Some(parent_id))
            .collect())
    }

    fn decode_detail(&self, raw: Value) -> Result<R> {
        let mut record: R = serde_json::from_value(raw.clone())
            .map_err(|e| LecternError::decode(200, e, raw.to_string().as_bytes()))?;
        record.sanitize_html(&self.sanitizer);
        Ok(record)
    }
}

impl ResourceFacade<Article> {
    /// Published articles flagged as featured.
    pub async fn list_featured(&self, cancel: Option<&CancellationToken>) -> Result<Vec<Article>> {
        Ok(self
            .list(cancel)
            .await?
            .into_iter()
            .filter(|article| article.featured)
            .collect())
    }
}

/// Decode list items, skipping any that don't fit the record type.
fn decode_all<R: Resource>(raw: Vec<Value>) -> Vec<R> {
    raw.into_iter()
        .filter_map(|item| match serde_json::from_value::<R>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed {} record: {}", R::KIND, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaginationConfig;
    use crate::test_support::{cache, json, query_u64, MockTransport, BASE_URL};
    use serde_json::json;

    fn facade<R: Resource>(transport: Arc<MockTransport>) -> ResourceFacade<R> {
        let walker = PaginationWalker::new(cache(transport), BASE_URL, PaginationConfig::default());
        ResourceFacade::new(Arc::new(walker), Sanitizer::new())
    }

    fn articles_backend() -> Arc<MockTransport> {
        MockTransport::new(|url| {
            if url.path() == "/api/articles/1" {
                return json(
                    200,
                    &json!({"data": {"id": 1, "title": "Hello", "content": "<p onclick=\"x()\">Hi<script>bad()</script></p>"}}),
                );
            }
            let page = query_u64(url, "page").unwrap_or(1);
            let data = match page {
                1 => json!([
                    {"id": 1, "title": "Hello", "slug": "hello-world", "is_published": "1", "is_featured": true},
                    {"id": 2, "title": "Draft", "slug": "draft", "is_published": "0", "is_featured": true},
                ]),
                _ => json!([
                    {"id": 3, "title": "Later", "slug": " Later-Post ", "is_published": true,
                     "content": "<div><b>bold</b></div>"},
                    {"id": "broken"},
                    {"id": {"nested": true}, "title": "Undecodable"},
                ]),
            };
            json(
                200,
                &json!({
                    "success": true,
                    "data": data,
                    "pagination": {"page": page, "totalPages": 2, "hasNextPage": page < 2}
                }),
            )
        })
    }

    #[tokio::test]
    async fn test_list_hides_unpublished_but_paginated_keeps_them() {
        let articles: Articles = facade(articles_backend());

        let listed = articles.list(None).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "broken"]);

        let page = articles.list_paginated(1, 20, None).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[1].id, "2");
        assert!(!page.data[1].published);
        assert!(page.pagination.has_next_page);
    }

    #[tokio::test]
    async fn test_featured_applies_after_publish_filter() {
        let articles: Articles = facade(articles_backend());

        let featured = articles.list_featured(None).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].title, "Hello");
    }

    #[tokio::test]
    async fn test_detail_by_id_is_sanitized() {
        let articles: Articles = facade(articles_backend());

        let article = articles.detail_by_id("1", None).await.unwrap();
        assert_eq!(article.content.as_deref(), Some("<p>Hi</p>"));
    }

    #[tokio::test]
    async fn test_detail_by_slug_trims_and_ignores_case() {
        let articles: Articles = facade(articles_backend());

        let article = articles.detail_by_slug("  later-POST", None).await.unwrap();
        assert_eq!(article.id, "3");
        assert_eq!(article.content.as_deref(), Some("<strong>bold</strong>"));

        // Unpublished records are not reachable by slug
        let err = articles.detail_by_slug("draft", None).await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_detail_by_slug_uses_decoded_slug() {
        let transport = MockTransport::new(|_| {
            json(200, &json!({"data": [{"id": 7, "name": "Mug", "slug": " MUG "}]}))
        });
        let shop: Shop = facade(transport);

        let item = shop.detail_by_slug("mug", None).await.unwrap();
        assert_eq!(item.id, "7");
    }

    #[tokio::test]
    async fn test_list_keeps_records_repeated_across_pages_once() {
        let transport = MockTransport::new(|url| {
            let page = query_u64(url, "page").unwrap_or(1);
            let data = match page {
                1 => json!([{"id": 1, "title": "A"}, {"id": 2, "title": "B"}]),
                _ => json!([{"id": 2, "title": "B"}, {"id": 3, "title": "C"}]),
            };
            json(
                200,
                &json!({"data": data, "pagination": {"page": page, "totalPages": 2}}),
            )
        });
        let articles: Articles = facade(transport);

        let listed = articles.list(None).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_shop_uses_availability() {
        let transport = MockTransport::new(|_| {
            json(
                200,
                &json!({"rows": [
                    {"id": 1, "name": "Mug", "is_published": false, "is_available": true},
                    {"id": 2, "name": "Tote", "is_available": "0"},
                    {"id": 3, "name": "Pin"},
                ]}),
            )
        });
        let shop: Shop = facade(transport.clone());

        let items = shop.list(None).await.unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Mug", "Pin"]);
        assert!(transport.requests()[0].starts_with("https://api.example.com/api/shop?"));
    }

    #[tokio::test]
    async fn test_by_parent_id_filters_children() {
        let transport = MockTransport::new(|_| {
            json(
                200,
                &json!([
                    {"id": 1, "monologue_id": 5, "url": "https://v.example.com/1"},
                    {"id": 2, "monologue_id": "6", "url": "https://v.example.com/2"},
                    {"id": 3, "parentId": "5", "url": "https://v.example.com/3", "is_published": 0},
                    {"id": 4, "parent_id": 5, "url": "https://v.example.com/4"},
                ]),
            )
        });
        let links: VideoLinks = facade(transport.clone());

        let children = links.by_parent_id("5", None).await.unwrap();
        let ids: Vec<_> = children.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert!(transport.requests()[0].contains("/api/video-links?"));
    }

    #[tokio::test]
    async fn test_with_path_targets_admin_route() {
        let transport = MockTransport::new(|_| json(200, &json!({"data": []})));
        let magazines: Magazines = facade::<Magazine>(transport.clone()).with_path("/admin/magazines");

        assert!(magazines.list(None).await.unwrap().is_empty());
        assert_eq!(magazines.path(), "/admin/magazines");
        assert_eq!(transport.hits("/admin/magazines"), 1);
    }

    #[tokio::test]
    async fn test_detail_decode_failure_is_reported() {
        let transport = MockTransport::new(|_| json(200, &json!({"data": {"id": [1, 2]}})));
        let research: Research = facade(transport);

        let err = research.detail_by_id("1", None).await.unwrap_err();
        assert!(matches!(err, LecternError::Decode { .. }));
    }
}
