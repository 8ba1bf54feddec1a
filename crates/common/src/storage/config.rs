//! Storage configuration
//!
//! Connection pool settings and SQLite pragmas for the cache database.
//!
//! The defaults favour blocking correctness over throughput: a single pooled
//! connection serializes every reader and writer, and a caller waiting for it
//! blocks for up to an hour instead of failing.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Where the database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    /// On-disk database file
    File(PathBuf),

    /// Private in-memory database (lives as long as its single connection)
    Memory,
}

impl fmt::Display for StorageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => write!(f, ":memory:"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database location
    pub target: StorageTarget,

    /// Connection pool size (default: 1)
    pub pool_size: u32,

    /// Connection acquisition timeout in seconds (default: 3600)
    pub connection_timeout_secs: u64,

    /// Busy timeout in milliseconds (default: 5000)
    pub busy_timeout_ms: u64,

    /// Enable WAL mode (default: true, ignored for in-memory databases)
    pub enable_wal: bool,

    /// Enable foreign keys (default: true)
    pub enable_foreign_keys: bool,
}

/// Largest pool the storage layer accepts
pub const MAX_POOL_SIZE: u32 = 64;

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            target: StorageTarget::File(PathBuf::from("cache.db")),
            pool_size: 1,
            connection_timeout_secs: 3600,
            busy_timeout_ms: 5000,
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl StorageConfig {
    /// Create a new configuration for the given target
    pub fn new(target: StorageTarget) -> Self {
        Self { target, ..Default::default() }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), super::error::StorageError> {
        use super::error::StorageError;

        if self.pool_size == 0 {
            return Err(StorageError::InvalidConfig(
                "pool_size must be greater than 0".to_string(),
            ));
        }
        if self.pool_size > MAX_POOL_SIZE {
            return Err(StorageError::InvalidConfig(format!(
                "pool_size too large (max: {MAX_POOL_SIZE})"
            )));
        }
        // Every in-memory connection is a distinct database
        if self.target == StorageTarget::Memory && self.pool_size != 1 {
            return Err(StorageError::InvalidConfig(
                "in-memory databases require pool_size = 1".to_string(),
            ));
        }

        if self.connection_timeout_secs == 0 {
            return Err(StorageError::InvalidConfig(
                "connection_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err(StorageError::InvalidConfig(
                "busy_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if let StorageTarget::File(path) = &self.target {
            if path.as_os_str().is_empty() {
                return Err(StorageError::InvalidConfig(
                    "database path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Set the connection pool size
    pub fn with_pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the connection acquisition timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the busy timeout
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Disable WAL mode
    pub fn without_wal(mut self) -> Self {
        self.enable_wal = false;
        self
    }

    /// Create a builder for more complex configurations
    pub fn builder(target: StorageTarget) -> StorageConfigBuilder {
        StorageConfigBuilder::new(target)
    }
}

/// Builder for StorageConfig with validation
#[derive(Debug)]
pub struct StorageConfigBuilder {
    config: StorageConfig,
}

impl StorageConfigBuilder {
    /// Create a new builder
    pub fn new(target: StorageTarget) -> Self {
        Self { config: StorageConfig::new(target) }
    }

    /// Set pool size
    pub fn pool_size(mut self, size: u32) -> Self {
        self.config.pool_size = size;
        self
    }

    /// Set connection acquisition timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout_secs = timeout.as_secs();
        self
    }

    /// Set busy timeout
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.busy_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Disable WAL mode
    pub fn disable_wal(mut self) -> Self {
        self.config.enable_wal = false;
        self
    }

    /// Disable foreign keys
    pub fn disable_foreign_keys(mut self) -> Self {
        self.config.enable_foreign_keys = false;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<StorageConfig, crate::storage::error::StorageError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
