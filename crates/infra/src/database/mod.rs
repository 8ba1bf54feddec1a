//! SQLite store: locator parsing, lazy connection management and the
//! dataset cache itself

pub mod dataset_cache;
pub mod locator;
pub mod manager;
mod sql;

pub use dataset_cache::SqliteDataCache;
pub use locator::parse_locator;
pub use manager::DbManager;
