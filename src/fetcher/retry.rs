//! Rate-limit backoff and stale-cache busting.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;

use crate::config::CacheConfig;

/// Query parameter appended when a 304 forces a re-fetch.
pub const CACHE_BUST_PARAM: &str = "__cb";

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Backoff when the server sends no usable `Retry-After`
    pub backoff: Duration,
    /// Upper bound of the random jitter added to every backoff
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for RetryPolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            backoff: config.rate_limit_backoff(),
            max_jitter: Duration::from_millis(config.retry_jitter_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying a 429.
    pub fn delay(&self, retry_after: Option<&str>) -> Duration {
        let base = retry_after
            .and_then(|value| parse_retry_after(value, Utc::now()))
            .unwrap_or(self.backoff);
        base + self.jitter()
    }

    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

/// Parse `Retry-After` as delta-seconds or an HTTP-date relative to `now`.
/// Dates in the past clamp to zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(seconds) = value.parse::<f64>() {
        if seconds.is_nan() {
            return None;
        }
        // Out-of-range values fall back to the default backoff
        return Duration::try_from_secs_f64(seconds.max(0.0)).ok();
    }

    let at = DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%A, %d-%b-%y %H:%M:%S GMT")
                .ok()
                .map(|dt| dt.and_utc())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%a %b %e %H:%M:%S %Y")
                .ok()
                .map(|dt| dt.and_utc())
        })?;

    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

/// Append the cache-bust parameter to `url`.
pub fn cache_bust(url: &str, stamp: i64) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed
                .query_pairs_mut()
                .append_pair(CACHE_BUST_PARAM, &stamp.to_string());
            parsed.to_string()
        }
        Err(_) => {
            let sep = if url.contains('?') { '&' } else { '?' };
            format!("{url}{sep}{CACHE_BUST_PARAM}={stamp}")
        }
    }
}
