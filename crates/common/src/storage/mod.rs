//! Storage primitives for the embedded cache database
//!
//! This module provides the r2d2-backed SQLite pool, its configuration, and
//! the storage error type.

pub mod config;
pub mod error;
pub mod metrics;
pub mod sqlite;
pub mod types;

// Re-export commonly used types
pub use config::{StorageConfig, StorageConfigBuilder, StorageTarget};
pub use error::{StorageError, StorageResult};
pub use metrics::StorageMetrics;
pub use sqlite::{apply_connection_pragmas, SqliteConnection, SqlitePool, SqlitePoolConfig};
pub use types::{ConnectionPool, HealthStatus, PoolMetrics};
