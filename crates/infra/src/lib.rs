//! # DataCache Infrastructure
//!
//! Infrastructure implementations of the core cache ports.
//!
//! This crate contains:
//! - `SqliteDataCache`, the SQLite implementation of `DatasetCache`
//! - Store locator parsing and lazy connection management
//! - Configuration loading from the environment or JSON/TOML files
//!
//! ## Architecture
//! - Implements traits defined in `datacache-core`
//! - Storage primitives (pool, pragmas, metrics) come from `datacache-common`
//! - Contains all "impure" code (file system, SQLite)

pub mod config;
pub mod database;
pub mod errors;

// Re-export commonly used items
pub use database::{parse_locator, DbManager, SqliteDataCache};
pub use errors::InfraError;
