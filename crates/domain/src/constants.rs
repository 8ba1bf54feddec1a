//! Cache constants
//!
//! Reserved names and default settings shared by every layer.

// Table layout
pub const TABLE_PREFIX: &str = "DataCache__";
pub const RESERVED_COLUMN_PREFIX: &str = "__DataCache_";
pub const ID_COLUMN: &str = "__DataCache_id";
pub const TIME_COLUMN: &str = "__DataCache_time";
pub const MAX_KIND_LENGTH: usize = 128;

/// Fixed-width UTC layout for capture times; text order equals time order
pub const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// Configuration defaults
pub const DEFAULT_URL: &str = "sqlite:///cache.db";
pub const DEFAULT_RECYCLE: u32 = 5;
pub const DEFAULT_POOL_SIZE: u32 = 1;
pub const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;
pub const MAX_POOL_SIZE: u32 = 64;
