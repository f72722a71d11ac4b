//! # Lectern
//!
//! Client-side content retrieval for a JSON CMS backend: articles,
//! magazines, research, monologues, shop items, the timeline and video links.
//!
//! ## Architecture
//!
//! ```text
//! Transport → RequestCache → Normalizer → PaginationWalker → ResourceFacade
//!                                                              ↓
//!                                                          Sanitizer (detail views)
//! ```
//!
//! - [`fetcher`]: transport seam and the coalescing request cache
//! - [`normalizer`]: turns every list payload shape into one canonical page
//! - [`pagination`]: single-page and fetch-all iteration, scan fallbacks
//! - [`resources`]: typed facades per collection
//! - [`sanitizer`]: allow-list HTML cleanup for backend-authored rich text
//!
//! ## Quick Start
//!
//! ```bash
//! # Every published article
//! lectern list articles
//!
//! # One raw page
//! lectern list shop --page 2 --limit 10
//!
//! # A sanitized detail record
//! lectern get articles --slug hello-world
//!
//! # Clean up an HTML fragment
//! lectern sanitize body.html
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the transport,
/// cache, walker, sanitizer and every resource facade.
pub mod app;

/// Configuration loaded from `~/.config/lectern/config.toml`.
pub mod config;

/// Command-line interface using clap.
pub mod cli;

/// Typed records and lenient field decoding.
pub mod domain;

/// HTTP transport and the time-boxed, coalescing request cache.
///
/// - [`Transport`](fetcher::Transport): async seam for one JSON GET
/// - [`HttpTransport`](fetcher::HttpTransport): reqwest implementation
/// - [`RequestCache`](fetcher::RequestCache): TTL cache with per-key coalescing
///   and reference-counted cancellation
pub mod fetcher;

/// List payload normalization into [`ListResponse`](domain::ListResponse).
pub mod normalizer;

/// Page-by-page and fetch-all listing with bounded scan fallbacks.
pub mod pagination;

/// Typed list and detail facades, one per backend collection.
pub mod resources;

/// Allow-list sanitizer for backend HTML.
pub mod sanitizer;

#[cfg(test)]
pub(crate) mod test_support;
