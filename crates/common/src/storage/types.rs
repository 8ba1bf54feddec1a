//! Pool-level trait and reporting types

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::error::StorageResult;

/// Connection pool behaviour shared by storage backends
pub trait ConnectionPool: Send + Sync + Debug {
    /// Pooled connection handle
    type Connection;

    /// Get a connection from the pool
    ///
    /// Blocks while the pool is exhausted, up to the configured timeout.
    fn get_connection(&self) -> StorageResult<Self::Connection>;

    /// Check pool health by running a trivial query
    fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get pool metrics
    fn metrics(&self) -> PoolMetrics;
}

/// Health status of the storage system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub healthy: bool,

    /// Number of open connections
    pub active_connections: usize,

    /// Number of idle connections
    pub idle_connections: usize,

    /// Maximum pool size
    pub max_connections: usize,

    /// Error message if unhealthy
    pub message: Option<String>,
}

impl HealthStatus {
    /// Create a healthy status
    pub fn healthy(active: usize, idle: usize, max: usize) -> Self {
        Self {
            healthy: true,
            active_connections: active,
            idle_connections: idle,
            max_connections: max,
            message: None,
        }
    }

    /// Create an unhealthy status
    pub fn unhealthy(message: String) -> Self {
        Self {
            healthy: false,
            active_connections: 0,
            idle_connections: 0,
            max_connections: 0,
            message: Some(message),
        }
    }
}

/// Connection pool metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolMetrics {
    /// Total connections acquired
    pub connections_acquired: u64,

    /// Total connection timeouts
    pub connections_timeout: u64,

    /// Total connection errors
    pub connections_error: u64,

    /// Average connection acquisition time (milliseconds)
    pub avg_acquisition_time_ms: u64,

    /// Total queries executed
    pub queries_executed: u64,

    /// Total query failures
    pub queries_failed: u64,
}
