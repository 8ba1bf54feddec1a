//! Cache configuration
//!
//! Plain serde structures; loading from the environment or a file lives in
//! the infra crate.

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_POOL_SIZE, DEFAULT_RECYCLE,
    DEFAULT_URL, MAX_POOL_SIZE,
};
use crate::errors::{DataCacheError, Result};

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
}

/// Settings for one cache instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Store locator, e.g. `sqlite:///cache.db`
    pub url: String,

    /// Versions kept per `(kind, id)`; `None` keeps every version
    #[serde(deserialize_with = "deserialize_recycle")]
    pub recycle: Option<u32>,

    pub pool_size: u32,

    /// How long a caller blocks waiting for the pooled connection
    pub connection_timeout_secs: u64,

    pub busy_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            recycle: Some(DEFAULT_RECYCLE),
            pool_size: DEFAULT_POOL_SIZE,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()
    }
}

impl CacheConfig {
    /// Configuration for `url` with every other setting at its default
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    /// Set the retention depth
    pub fn with_recycle(mut self, recycle: Option<u32>) -> Self {
        self.recycle = recycle;
        self
    }

    /// Validate field ranges
    ///
    /// A retention depth of zero is rejected: it would evict the version a
    /// `set` has just written.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(DataCacheError::Config("cache.url must not be empty".into()));
        }
        if self.recycle == Some(0) {
            return Err(DataCacheError::Config(
                "cache.recycle must be at least 1 (use none to keep every version)".into(),
            ));
        }
        if self.pool_size == 0 || self.pool_size > MAX_POOL_SIZE {
            return Err(DataCacheError::Config(format!(
                "cache.pool_size must be between 1 and {MAX_POOL_SIZE}"
            )));
        }
        if self.connection_timeout_secs == 0 {
            return Err(DataCacheError::Config(
                "cache.connection_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err(DataCacheError::Config("cache.busy_timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Parse a textual retention setting
///
/// Accepts a count, or `none`/`off`/an empty string to disable eviction.
pub fn parse_recycle(raw: &str) -> std::result::Result<Option<u32>, String> {
    let trimmed = raw.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "none" | "off" => Ok(None),
        _ => trimmed
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("invalid recycle value '{trimmed}': expected a count or 'none'")),
    }
}

fn deserialize_recycle<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Recycle {
        Count(u32),
        Keyword(String),
    }

    match Option::<Recycle>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Recycle::Count(n)) => Ok(Some(n)),
        Some(Recycle::Keyword(s)) => parse_recycle(&s).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache.url, "sqlite:///cache.db");
        assert_eq!(config.cache.recycle, Some(5));
        assert_eq!(config.cache.pool_size, 1);
        assert_eq!(config.cache.connection_timeout_secs, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_recycle_rejected() {
        let config = CacheConfig::default().with_recycle(Some(0));
        assert!(matches!(config.validate(), Err(DataCacheError::Config(_))));

        assert!(CacheConfig::default().with_recycle(None).validate().is_ok());
    }

    #[test]
    fn test_pool_size_bounds() {
        let mut config = CacheConfig::default();
        config.pool_size = 0;
        assert!(config.validate().is_err());
        config.pool_size = MAX_POOL_SIZE + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_recycle() {
        assert_eq!(parse_recycle("3"), Ok(Some(3)));
        assert_eq!(parse_recycle(" none "), Ok(None));
        assert_eq!(parse_recycle("OFF"), Ok(None));
        assert_eq!(parse_recycle(""), Ok(None));
        assert!(parse_recycle("-1").is_err());
        assert!(parse_recycle("five").is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[cache]\nurl = \"sqlite:///prices.db\"\n").unwrap();
        assert_eq!(config.cache.url, "sqlite:///prices.db");
        assert_eq!(config.cache.recycle, Some(5));
        assert_eq!(config.cache.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_recycle_keyword_and_null() {
        let config: Config = toml::from_str("[cache]\nrecycle = \"none\"\n").unwrap();
        assert_eq!(config.cache.recycle, None);

        let config: Config = serde_json::from_str(r#"{"cache": {"recycle": null}}"#).unwrap();
        assert_eq!(config.cache.recycle, None);

        let config: Config = serde_json::from_str(r#"{"cache": {"recycle": 2}}"#).unwrap();
        assert_eq!(config.cache.recycle, Some(2));

        assert!(serde_json::from_str::<Config>(r#"{"cache": {"recycle": "lots"}}"#).is_err());
    }
}
