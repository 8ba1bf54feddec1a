//! SQLite connection pool
//!
//! r2d2 pool over `r2d2_sqlite`, with pragmas applied by the manager's init
//! hook. With the default single-connection configuration every caller is
//! serialized through one connection and waits up to the acquisition timeout
//! instead of failing under contention.

use std::sync::Arc;
use std::time::Instant;

use r2d2::{ManageConnection, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::connection::SqliteConnection;
use super::pragmas::apply_connection_pragmas;
use crate::storage::config::StorageTarget;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::metrics::StorageMetrics;
use crate::storage::types::{ConnectionPool, HealthStatus, PoolMetrics};

/// SQLite connection pool
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
    metrics: Arc<StorageMetrics>,
}

impl SqlitePool {
    /// Open a pool on `target`
    ///
    /// # Process
    /// 1. Create the connection manager with the pragma init hook
    /// 2. Open one connection directly so a bad path fails immediately
    /// 3. Build the r2d2 pool with the configured size and timeout
    ///
    /// # Errors
    /// Returns `StorageError::Connection` if the database cannot be opened or
    /// the pragmas cannot be applied, and `StorageError::InvalidConfig` for a
    /// multi-connection in-memory pool.
    #[instrument(skip(config), fields(target = %target, pool_size = config.max_size))]
    pub fn new(target: &StorageTarget, config: SqlitePoolConfig) -> StorageResult<Self> {
        info!("Creating SQLite connection pool");

        if *target == StorageTarget::Memory && config.max_size != 1 {
            return Err(StorageError::InvalidConfig(
                "in-memory databases require a single pooled connection".to_string(),
            ));
        }

        let metrics = Arc::new(StorageMetrics::new(config.max_size));

        let pragma_config = config.clone();
        let manager = match target {
            StorageTarget::File(path) => SqliteConnectionManager::file(path),
            StorageTarget::Memory => SqliteConnectionManager::memory(),
        }
        .with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        // r2d2's checked build retries for the whole acquisition timeout, so
        // verify connectivity up front. In-memory databases skip this: a
        // probe would create and discard a separate database.
        if let StorageTarget::File(_) = target {
            manager.connect().map_err(|e| {
                warn!(error = %e, "Failed to open database");
                StorageError::Connection(format!("Failed to open {}: {}", target, e))
            })?;
        }

        // Idle reaping and max lifetime are disabled so a pooled in-memory
        // database is never dropped behind the caller's back.
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .build_unchecked(manager);

        {
            let conn = pool.get().map_err(|e| {
                warn!(error = %e, "Failed to get initial connection");
                StorageError::Connection(format!("Failed to get initial connection: {}", e))
            })?;
            conn.execute_batch("SELECT 1;").map_err(|e| {
                StorageError::Connection(format!("Connection verification failed: {}", e))
            })?;
            debug!("Initial connection verified");
        }

        info!("SQLite pool created with {} connection(s)", config.max_size);

        Ok(Self { pool, config, metrics })
    }

    /// Get the shared metrics tracker
    pub fn storage_metrics(&self) -> &Arc<StorageMetrics> {
        &self.metrics
    }

    /// Pool configuration
    pub fn config(&self) -> &SqlitePoolConfig {
        &self.config
    }

    /// Acquire a connection, blocking up to the configured timeout
    #[instrument(skip(self), fields(pool_size = self.config.max_size))]
    pub fn get_sqlite_connection(&self) -> StorageResult<SqliteConnection> {
        let start = Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                self.metrics.record_connection_acquired(duration_ms);
                debug!("Connection acquired in {}ms", duration_ms);
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();

                if err_str.contains("timed out") || err_str.contains("timeout") {
                    self.metrics.record_connection_timeout();
                    warn!("Connection timeout after {:?}", self.config.connection_timeout);
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    self.metrics.record_connection_error();
                    warn!("Connection error: {}", e);
                    Err(StorageError::Connection(format!("Failed to get connection: {}", e)))
                }
            }
        }
    }
}

impl ConnectionPool for SqlitePool {
    type Connection = SqliteConnection;

    fn get_connection(&self) -> StorageResult<SqliteConnection> {
        self.get_sqlite_connection()
    }

    #[instrument(skip(self))]
    fn health_check(&self) -> StorageResult<HealthStatus> {
        let conn = match self.get_sqlite_connection() {
            Ok(conn) => conn,
            Err(e) => return Ok(HealthStatus::unhealthy(format!("Pool unhealthy: {}", e))),
        };

        let probe = conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0));
        self.metrics.record_query(&probe);
        drop(conn);

        let state = self.pool.state();
        match probe {
            Ok(1) => Ok(HealthStatus::healthy(
                state.connections as usize,
                state.idle_connections as usize,
                self.config.max_size as usize,
            )),
            Ok(other) => Ok(HealthStatus::unhealthy(format!("SELECT 1 returned {}", other))),
            Err(e) => Ok(HealthStatus::unhealthy(format!("Health probe failed: {}", e))),
        }
    }

    fn metrics(&self) -> PoolMetrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    fn file_target(dir: &TempDir) -> StorageTarget {
        StorageTarget::File(dir.path().join("cache.db"))
    }

    #[test]
    fn test_pool_creation() {
        let temp_dir = TempDir::new().unwrap();
        let pool = SqlitePool::new(&file_target(&temp_dir), SqlitePoolConfig::default()).unwrap();

        let conn = pool.get_connection().unwrap();
        conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", []).unwrap();
        assert!(temp_dir.path().join("cache.db").exists());
    }

    #[test]
    fn test_missing_directory_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let target = StorageTarget::File(temp_dir.path().join("missing").join("cache.db"));

        let started = Instant::now();
        let result = SqlitePool::new(&target, SqlitePoolConfig::default());

        assert!(matches!(result, Err(StorageError::Connection(_))));
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    /// The in-memory database must survive between acquisitions.
    #[test]
    fn test_memory_pool_keeps_data() {
        let pool = SqlitePool::new(&StorageTarget::Memory, SqlitePoolConfig::default()).unwrap();

        {
            let conn = pool.get_connection().unwrap();
            conn.execute("CREATE TABLE t (v INTEGER)", []).unwrap();
            conn.execute("INSERT INTO t VALUES (42)", []).unwrap();
        }

        let conn = pool.get_connection().unwrap();
        let v: i64 = conn.query_row("SELECT v FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn test_memory_pool_rejects_multiple_connections() {
        let config = SqlitePoolConfig { max_size: 2, ..Default::default() };
        let result = SqlitePool::new(&StorageTarget::Memory, config);
        assert!(matches!(result, Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_single_connection_times_out_while_held() {
        let config = SqlitePoolConfig {
            connection_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let pool = SqlitePool::new(&StorageTarget::Memory, config).unwrap();

        let _held = pool.get_connection().unwrap();
        let result = pool.get_connection();

        assert!(matches!(result, Err(StorageError::Timeout(_))));
        assert_eq!(pool.metrics().connections_timeout, 1);
    }

    #[test]
    fn test_serialized_writers_across_threads() {
        let temp_dir = TempDir::new().unwrap();
        let pool =
            Arc::new(SqlitePool::new(&file_target(&temp_dir), SqlitePoolConfig::default()).unwrap());

        pool.get_connection()
            .unwrap()
            .execute("CREATE TABLE test (id INTEGER PRIMARY KEY, value TEXT)", [])
            .unwrap();

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    let conn = pool.get_connection().unwrap();
                    conn.execute("INSERT INTO test (value) VALUES (?1)", [format!("thread_{i}")])
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let conn = pool.get_connection().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM test", [], |row| row.get(0)).unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_health_check() {
        let pool = SqlitePool::new(&StorageTarget::Memory, SqlitePoolConfig::default()).unwrap();

        let health = pool.health_check().unwrap();
        assert!(health.healthy);
        assert_eq!(health.max_connections, 1);
        assert_eq!(pool.metrics().queries_executed, 1);
    }
}
