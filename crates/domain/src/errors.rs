//! Error types used throughout the cache

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for DataCache
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum DataCacheError {
    /// The backing store could not be opened or reused
    #[error("Connection error: {0}")]
    Connection(String),

    /// A `set` failed to durably append its version
    #[error("Storage write error: {0}")]
    StorageWrite(String),

    /// Retention cleanup failed
    #[error("Eviction error: {0}")]
    Eviction(String),

    /// The origin behind a read-through loader failed to produce data
    #[error("Source error: {0}")]
    Source(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for DataCache operations
pub type Result<T> = std::result::Result<T, DataCacheError>;
