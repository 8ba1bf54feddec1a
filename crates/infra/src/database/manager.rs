//! Store connection manager
//!
//! Opens the pool lazily on first use, reuses it for every later call, and
//! can be closed explicitly; the next operation then reconnects.

use std::sync::{Arc, PoisonError, RwLock};

use datacache_common::storage::{
    ConnectionPool, HealthStatus, PoolMetrics, SqliteConnection, SqlitePool, SqlitePoolConfig,
    StorageConfig, StorageTarget,
};
use datacache_domain::{CacheConfig, DataCacheError, Result};
use tracing::{debug, info, warn};

use super::locator::parse_locator;
use crate::errors::InfraError;

/// Lazily connected handle to the cache store
#[derive(Debug)]
pub struct DbManager {
    config: CacheConfig,
    pool: RwLock<Option<Arc<SqlitePool>>>,
}

impl DbManager {
    /// Create a manager; no connection is made until first use
    pub fn new(config: CacheConfig) -> Self {
        Self { config, pool: RwLock::new(None) }
    }

    /// Store locator this manager connects to
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Open the pool if needed and return it
    ///
    /// Idempotent: once open, the same pool is returned until [`close`].
    ///
    /// [`close`]: DbManager::close
    pub fn connect(&self) -> Result<Arc<SqlitePool>> {
        if let Some(pool) = self.pool.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            return Ok(Arc::clone(pool));
        }

        let mut slot = self.pool.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have connected while we waited for the lock
        if let Some(pool) = slot.as_ref() {
            return Ok(Arc::clone(pool));
        }

        let storage = self.storage_config().inspect_err(|e| {
            warn!(url = %self.config.url, error = %e, "Invalid cache store settings");
        })?;
        let pool = SqlitePool::new(&storage.target, SqlitePoolConfig::from(&storage))
            .map_err(|e| {
                warn!(url = %self.config.url, error = %e, "Failed to open cache store");
                DataCacheError::from(InfraError::from(e))
            })
            .map(Arc::new)?;

        info!(
            url = %self.config.url,
            target = %storage.target,
            pool_size = storage.pool_size,
            "Cache store connected"
        );
        *slot = Some(Arc::clone(&pool));
        Ok(pool)
    }

    /// Acquire the pooled connection, connecting first if needed
    ///
    /// Blocks up to the configured acquisition timeout when the connection
    /// is in use.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        let pool = self.connect()?;
        pool.get_sqlite_connection().map_err(|e| InfraError::from(e).into())
    }

    /// Drop the pool; the next operation reconnects
    ///
    /// Connections already handed out stay valid until dropped. An in-memory
    /// store loses its contents.
    pub fn close(&self) {
        let previous = self.pool.write().unwrap_or_else(PoisonError::into_inner).take();
        if previous.is_some() {
            info!(url = %self.config.url, "Cache store closed");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.pool.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Run `SELECT 1` against the store
    pub fn health_check(&self) -> Result<HealthStatus> {
        let pool = self.connect()?;
        pool.health_check().map_err(|e| InfraError::from(e).into())
    }

    /// Counters of the open pool; zeroed when disconnected
    pub fn metrics(&self) -> PoolMetrics {
        self.current_pool().map(|pool| pool.metrics()).unwrap_or_default()
    }

    /// Count a query outcome against the open pool
    pub fn record_query<T, E>(&self, result: &std::result::Result<T, E>) {
        if let Some(pool) = self.current_pool() {
            pool.storage_metrics().record_query(result);
        }
    }

    fn current_pool(&self) -> Option<Arc<SqlitePool>> {
        self.pool.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn storage_config(&self) -> Result<StorageConfig> {
        let target = parse_locator(&self.config.url)?;

        let mut pool_size = self.config.pool_size;
        if target == StorageTarget::Memory && pool_size != 1 {
            debug!(pool_size, "In-memory store uses a single connection");
            pool_size = 1;
        }

        let storage = StorageConfig {
            pool_size,
            connection_timeout_secs: self.config.connection_timeout_secs,
            busy_timeout_ms: self.config.busy_timeout_ms,
            ..StorageConfig::new(target)
        };
        storage.validate().map_err(|e| DataCacheError::from(InfraError::from(e)))?;
        Ok(storage)
    }
}
