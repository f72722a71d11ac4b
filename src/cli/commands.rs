use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, LecternError, Result};
use crate::cli::ResourceKind;
use crate::resources::{Resource, ResourceFacade};

/// Run `$body` with `$facade` bound to the facade for `$kind`.
macro_rules! with_facade {
    ($ctx:expr, $kind:expr, |$facade:ident| $body:expr) => {
        match $kind {
            ResourceKind::Articles => { let $facade = &$ctx.articles; $body }
            ResourceKind::Magazines => { let $facade = &$ctx.magazines; $body }
            ResourceKind::Research => { let $facade = &$ctx.research; $body }
            ResourceKind::Monologues => { let $facade = &$ctx.monologues; $body }
            ResourceKind::Shop => { let $facade = &$ctx.shop; $body }
            ResourceKind::Timeline => { let $facade = &$ctx.timeline; $body }
            ResourceKind::TimelineMeta => { let $facade = &$ctx.timeline_meta; $body }
            ResourceKind::VideoLinks => { let $facade = &$ctx.video_links; $body }
        }
    };
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| LecternError::Config(format!("Could not render output: {e}")))?;
    println!("{}", text);
    Ok(())
}

async fn list_with<R: Resource + Serialize>(
    facade: &ResourceFacade<R>,
    page: Option<u64>,
    limit: Option<u64>,
    default_limit: u64,
    cancel: &CancellationToken,
) -> Result<()> {
    match page {
        Some(page) => {
            let response = facade
                .list_paginated(page, limit.unwrap_or(default_limit), Some(cancel))
                .await?;
            print_json(&response)
        }
        None => {
            let records = facade.list(Some(cancel)).await?;
            eprintln!("{} {}", records.len(), R::KIND);
            print_json(&records)
        }
    }
}

async fn get_with<R: Resource + Serialize>(
    facade: &ResourceFacade<R>,
    id: Option<&str>,
    slug: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    let record = match (id, slug) {
        (Some(id), _) => facade.detail_by_id(id, Some(cancel)).await?,
        (None, Some(slug)) => facade.detail_by_slug(slug, Some(cancel)).await?,
        (None, None) => return Err(LecternError::Config("Either --id or --slug is required".into())),
    };
    print_json(&record)
}

pub async fn list(
    ctx: &AppContext,
    kind: ResourceKind,
    page: Option<u64>,
    limit: Option<u64>,
    cancel: &CancellationToken,
) -> Result<()> {
    let default_limit = ctx.config.pagination.default_limit;
    with_facade!(ctx, kind, |facade| list_with(facade, page, limit, default_limit, cancel).await)
}

pub async fn get(
    ctx: &AppContext,
    kind: ResourceKind,
    id: Option<&str>,
    slug: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    with_facade!(ctx, kind, |facade| get_with(facade, id, slug, cancel).await)
}

pub async fn featured(ctx: &AppContext, cancel: &CancellationToken) -> Result<()> {
    let articles = ctx.articles.list_featured(Some(cancel)).await?;
    print_json(&articles)
}

pub async fn children(
    ctx: &AppContext,
    kind: ResourceKind,
    parent_id: &str,
    cancel: &CancellationToken,
) -> Result<()> {
    match kind {
        ResourceKind::Timeline => print_json(&ctx.timeline.by_parent_id(parent_id, Some(cancel)).await?),
        ResourceKind::VideoLinks => print_json(&ctx.video_links.by_parent_id(parent_id, Some(cancel)).await?),
        other => Err(LecternError::Config(format!(
            "{other:?} records have no parent; use timeline or video-links"
        ))),
    }
}

pub fn sanitize(ctx: &AppContext, input: &Path) -> Result<()> {
    let raw = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };

    println!("{}", ctx.sanitizer.sanitize(&raw));
    Ok(())
}
