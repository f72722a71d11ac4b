use std::sync::Arc;

use thiserror::Error;

/// Longest body excerpt carried inside an error.
pub const EXCERPT_LEN: usize = 200;

#[derive(Error, Debug, Clone)]
pub enum LecternError {
    #[error("HTTP {status} for {url}: {excerpt}")]
    Http {
        status: u16,
        url: String,
        excerpt: String,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    #[error("Invalid JSON response (HTTP {status}): {reason}: {excerpt}")]
    Decode {
        status: u16,
        reason: String,
        excerpt: String,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Fetch of {0} ended without a result")]
    Aborted(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LecternError {
    /// True when the caller asked to stop, as opposed to the operation failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LecternError::Cancelled)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            LecternError::Http { status, .. } | LecternError::Decode { status, .. } => {
                Some(*status)
            }
            LecternError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub(crate) fn http(status: u16, url: &str, body: &[u8]) -> Self {
        LecternError::Http {
            status,
            url: url.to_string(),
            excerpt: excerpt(body),
        }
    }

    pub(crate) fn decode(status: u16, reason: impl ToString, body: &[u8]) -> Self {
        LecternError::Decode {
            status,
            reason: reason.to_string(),
            excerpt: excerpt(body),
        }
    }
}

impl From<reqwest::Error> for LecternError {
    fn from(e: reqwest::Error) -> Self {
        LecternError::Transport(Arc::new(e))
    }
}

impl From<std::io::Error> for LecternError {
    fn from(e: std::io::Error) -> Self {
        LecternError::Io(Arc::new(e))
    }
}

/// Lossy UTF-8 prefix of a response body, cut on a char boundary.
pub fn excerpt(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

pub type Result<T> = std::result::Result<T, LecternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short_body() {
        assert_eq!(excerpt(b"  not json \n"), "not json");
    }

    #[test]
    fn test_excerpt_truncates_long_body() {
        let body = "é".repeat(EXCERPT_LEN + 50);
        let out = excerpt(body.as_bytes());
        assert_eq!(out.chars().count(), EXCERPT_LEN + 1);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn test_http_error_embeds_status_and_body() {
        let err = LecternError::http(503, "https://api.example.com/articles", b"upstream down");
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("upstream down"));
        assert_eq!(err.status(), Some(503));
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_cancelled_is_distinct() {
        assert!(LecternError::Cancelled.is_cancelled());
        assert_eq!(LecternError::Cancelled.status(), None);
    }
}
