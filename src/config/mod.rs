//! Configuration management for Lectern.
//!
//! Configuration is read from `~/.config/lectern/config.toml`.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub pagination: PaginationConfig,
}

/// Backend location and request identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every resource path is joined onto
    pub base_url: String,
    pub user_agent: String,
    /// Opaque bearer token forwarded as `Authorization: Bearer <token>`
    pub bearer_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".to_string(),
            user_agent: concat!("lectern/", env!("CARGO_PKG_VERSION")).to_string(),
            bearer_token: None,
        }
    }
}

/// Request cache and rate-limit recovery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of a cache entry in seconds (default: 15)
    pub ttl_secs: u64,
    /// Backoff after a 429 without `Retry-After`, in milliseconds (default: 1500)
    pub rate_limit_backoff_ms: u64,
    /// Upper bound of the random jitter added to every 429 backoff (default: 250)
    pub retry_jitter_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 15,
            rate_limit_backoff_ms: 1500,
            retry_jitter_ms: 250,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

/// Pagination walker limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size requested when the caller doesn't specify one (default: 20)
    pub default_limit: u64,
    /// Maximum pages fetched by a single "fetch all" walk (default: 50)
    pub hard_page_cap: u64,
    /// Maximum pages scanned when looking up a record by id or slug (default: 20)
    pub scan_max_pages: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            hard_page_cap: 50,
            scan_max_pages: 20,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/lectern/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("lectern").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Lectern Configuration

[api]
# Every resource path (e.g. /articles) is appended to this URL
base_url = "http://localhost:4000/api"

# Optional bearer token forwarded verbatim in the Authorization header
# bearer_token = "..."

[cache]
# Seconds a fetched URL is served from cache
ttl_secs = 15

# Backoff after HTTP 429 when the server sends no Retry-After (milliseconds)
rate_limit_backoff_ms = 1500

# Random jitter added to every 429 backoff (milliseconds)
retry_jitter_ms = 250

[pagination]
# Page size used when none is requested
default_limit = 20

# Maximum pages fetched when assembling a full collection
hard_page_cap = 50

# Maximum pages scanned when looking a record up by id or slug
scan_max_pages = 20
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.cache.ttl_secs, 15);
        assert_eq!(config.cache.rate_limit_backoff_ms, 1500);
        assert_eq!(config.pagination.hard_page_cap, 50);
        assert_eq!(config.api.bearer_token, None);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[api]
base_url = "https://example.com/api"

[pagination]
hard_page_cap = 5
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.api.base_url, "https://example.com/api");
        assert_eq!(config.pagination.hard_page_cap, 5);
        // Defaults fill the rest
        assert_eq!(config.pagination.default_limit, 20);
        assert_eq!(config.cache.ttl(), Duration::from_secs(15));
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.cache.retry_jitter_ms, 250);
        assert!(config.api.user_agent.starts_with("lectern/"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache]\nttl_secs = 3\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache.ttl_secs, 3);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[cache\nttl_secs = ").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
