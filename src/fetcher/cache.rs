//! Time-boxed cache and coalescer for JSON GET requests.
//!
//! At most one request per URL is in flight. Every caller asking for a URL
//! while its entry is live attaches as a counted consumer of the same shared
//! outcome. When the last consumer detaches before the fetch completes, the
//! fetch is cancelled and the entry evicted.
//!
//! Lock order is always `entries` before an entry's `state`.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::{LecternError, Result};
use crate::config::CacheConfig;
use crate::fetcher::clock::{Clock, SystemClock};
use crate::fetcher::retry::{cache_bust, RetryPolicy};
use crate::fetcher::Transport;

type Outcome = std::result::Result<Arc<Value>, LecternError>;
type EntryMap = Mutex<HashMap<String, Arc<CacheEntry>>>;

#[derive(Debug, Default)]
struct EntryState {
    consumers: usize,
    completed: bool,
}

struct CacheEntry {
    key: String,
    expires_at: Instant,
    outcome: Shared<BoxFuture<'static, Outcome>>,
    cancel: CancellationToken,
    state: Mutex<EntryState>,
}

impl CacheEntry {
    fn state(&self) -> MutexGuard<'_, EntryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a new caller may share this entry at `now`.
    fn is_live(&self, now: Instant) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        // An unfinished fetch is never superseded, even past its TTL.
        now < self.expires_at || !self.state().completed
    }
}

fn lock(entries: &EntryMap) -> MutexGuard<'_, HashMap<String, Arc<CacheEntry>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Remove `entry` from the map unless it has already been replaced.
fn evict_if_current(map: &mut HashMap<String, Arc<CacheEntry>>, entry: &Arc<CacheEntry>) {
    if map.get(&entry.key).is_some_and(|current| Arc::ptr_eq(current, entry)) {
        map.remove(&entry.key);
    }
}

/// A caller's attachment to an entry. Dropping it detaches.
struct Consumer {
    entries: Arc<EntryMap>,
    entry: Arc<CacheEntry>,
}

impl Drop for Consumer {
    fn drop(&mut self) {
        let mut map = lock(&self.entries);
        let abandoned = {
            let mut state = self.entry.state();
            state.consumers = state.consumers.saturating_sub(1);
            state.consumers == 0 && !state.completed
        };

        if abandoned {
            debug!("Last consumer left {}, cancelling fetch", self.entry.key);
            self.entry.cancel.cancel();
            evict_if_current(&mut map, &self.entry);
        }
    }
}

pub struct RequestCache {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    retry: RetryPolicy,
    entries: Arc<EntryMap>,
}

impl RequestCache {
    pub fn new(transport: Arc<dyn Transport>, config: &CacheConfig) -> Self {
        Self::with_clock(transport, config, Arc::new(SystemClock))
    }

    pub fn with_clock(transport: Arc<dyn Transport>, config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            clock,
            ttl: config.ttl(),
            retry: RetryPolicy::from(config),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Fetch `url` and decode the shared JSON body as `T`.
    pub async fn get<T: DeserializeOwned>(&self, url: &str, cancel: Option<&CancellationToken>) -> Result<T> {
        let value = self.get_value(url, cancel).await?;
        T::deserialize(value.as_ref())
            .map_err(|e| LecternError::decode(200, e, value.to_string().as_bytes()))
    }

    /// Fetch `url`, sharing any live entry for it.
    ///
    /// When `cancel` fires, this call returns [`LecternError::Cancelled`]
    /// immediately; the shared fetch keeps running while other consumers
    /// remain attached.
    pub async fn get_value(&self, url: &str, cancel: Option<&CancellationToken>) -> Result<Arc<Value>> {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(LecternError::Cancelled);
        }

        let consumer = self.attach(url);
        let outcome = consumer.entry.outcome.clone();

        let result = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(LecternError::Cancelled),
                outcome = outcome => outcome,
            },
            None => outcome.await,
        };

        drop(consumer);
        result
    }

    /// Whether a live entry exists for `url`.
    pub fn has(&self, url: &str) -> bool {
        let now = self.clock.now();
        lock(&self.entries)
            .get(url)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Forget every entry. Fetches already in flight still deliver to their consumers.
    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn consumers(&self, url: &str) -> usize {
        lock(&self.entries)
            .get(url)
            .map(|entry| entry.state().consumers)
            .unwrap_or(0)
    }

    fn attach(&self, url: &str) -> Consumer {
        let now = self.clock.now();
        let mut map = lock(&self.entries);

        if let Some(entry) = map.get(url).filter(|entry| entry.is_live(now)) {
            entry.state().consumers += 1;
            debug!("Cache hit for {}", url);
            return Consumer {
                entries: self.entries.clone(),
                entry: entry.clone(),
            };
        }

        let (tx, rx) = oneshot::channel::<Outcome>();
        let key = url.to_string();
        let outcome = rx
            .map(move |received| received.unwrap_or(Err(LecternError::Aborted(key))))
            .boxed()
            .shared();

        let entry = Arc::new(CacheEntry {
            key: url.to_string(),
            expires_at: now + self.ttl,
            outcome,
            cancel: CancellationToken::new(),
            state: Mutex::new(EntryState {
                consumers: 1,
                completed: false,
            }),
        });
        map.insert(url.to_string(), entry.clone());
        drop(map);

        debug!("Cache miss for {}, fetching", url);
        self.spawn_fetch(entry.clone(), tx);

        Consumer {
            entries: self.entries.clone(),
            entry,
        }
    }

    fn spawn_fetch(&self, entry: Arc<CacheEntry>, tx: oneshot::Sender<Outcome>) {
        let transport = self.transport.clone();
        let entries = self.entries.clone();
        let retry = self.retry;

        tokio::spawn(async move {
            let fetch = AssertUnwindSafe(fetch_json(transport.as_ref(), &retry, &entry.key, &entry.cancel))
                .catch_unwind();
            let result = tokio::select! {
                _ = entry.cancel.cancelled() => Err(LecternError::Cancelled),
                fetched = fetch => fetched.unwrap_or_else(|_| Err(LecternError::Aborted(entry.key.clone()))),
            };

            {
                let mut map = lock(&entries);
                entry.state().completed = true;
                if let Err(e) = &result {
                    if !e.is_cancelled() {
                        warn!("Fetch of {} failed, evicting: {}", entry.key, e);
                    }
                    evict_if_current(&mut map, &entry);
                }
            }

            // Nobody left to receive is fine.
            let _ = tx.send(result);
        });
    }
}

/// GET `url` as JSON, reissuing once with a cache-bust parameter on 304 and
/// retrying once after backoff on 429.
async fn fetch_json(
    transport: &dyn Transport,
    retry: &RetryPolicy,
    url: &str,
    cancel: &CancellationToken,
) -> Outcome {
    let mut target = url.to_string();
    let mut busted = false;
    let mut rate_limited = false;

    loop {
        let response = transport.get(&target).await?;

        match response.status {
            _ if response.is_success() => {
                return serde_json::from_slice::<Value>(&response.body)
                    .map(Arc::new)
                    .map_err(|e| LecternError::decode(response.status, e, &response.body));
            }
            304 if !busted => {
                busted = true;
                target = cache_bust(url, chrono::Utc::now().timestamp_millis());
                info!("{} not modified, reissuing as {}", url, target);
            }
            429 if !rate_limited => {
                rate_limited = true;
                let delay = retry.delay(response.retry_after.as_deref());
                info!("{} rate limited, retrying in {:?}", target, delay);
                tokio::select! {
                    _ = cancel.cancelled() => return Err(LecternError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            status => return Err(LecternError::http(status, &target, &response.body)),
        }
    }
}
