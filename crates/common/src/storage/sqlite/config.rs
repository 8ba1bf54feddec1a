//! SQLite connection pool configuration

use std::time::Duration;

use crate::storage::config::StorageConfig;

/// SQLite pool configuration
///
/// `StorageConfig` expressed in the units r2d2 and rusqlite take.
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long `get` blocks waiting for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite lock contention
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,

    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
}

impl From<&StorageConfig> for SqlitePoolConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            max_size: config.pool_size,
            connection_timeout: Duration::from_secs(config.connection_timeout_secs),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
            enable_wal: config.enable_wal,
            enable_foreign_keys: config.enable_foreign_keys,
        }
    }
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}
