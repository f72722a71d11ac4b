use std::sync::Arc;

use tracing::debug;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{Clock, HttpTransport, RequestCache, SystemClock, Transport};
use crate::pagination::PaginationWalker;
use crate::resources::{
    Articles, Magazines, Monologues, Research, ResourceFacade, Shop, Timeline, TimelineMetas, VideoLinks,
};
use crate::sanitizer::Sanitizer;

/// Everything a caller needs to read content, wired from one [`Config`].
pub struct AppContext {
    pub config: Config,
    pub cache: Arc<RequestCache>,
    pub walker: Arc<PaginationWalker>,
    pub sanitizer: Sanitizer,
    pub articles: Articles,
    pub magazines: Magazines,
    pub research: Research,
    pub monologues: Monologues,
    pub shop: Shop,
    pub timeline: Timeline,
    pub timeline_meta: TimelineMetas,
    pub video_links: VideoLinks,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.api)?);
        Ok(Self::with_transport(config, transport, Arc::new(SystemClock)))
    }

    /// Wire the context over an arbitrary transport and clock.
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        debug!("Using backend at {}", config.api.base_url);

        let cache = Arc::new(RequestCache::with_clock(transport, &config.cache, clock));
        let walker = Arc::new(PaginationWalker::new(
            cache.clone(),
            &config.api.base_url,
            config.pagination.clone(),
        ));
        let sanitizer = Sanitizer::new();

        Self {
            articles: ResourceFacade::new(walker.clone(), sanitizer),
            magazines: ResourceFacade::new(walker.clone(), sanitizer),
            research: ResourceFacade::new(walker.clone(), sanitizer),
            monologues: ResourceFacade::new(walker.clone(), sanitizer),
            shop: ResourceFacade::new(walker.clone(), sanitizer),
            timeline: ResourceFacade::new(walker.clone(), sanitizer),
            timeline_meta: ResourceFacade::new(walker.clone(), sanitizer),
            video_links: ResourceFacade::new(walker.clone(), sanitizer),
            config,
            cache,
            walker,
            sanitizer,
        }
    }
}
