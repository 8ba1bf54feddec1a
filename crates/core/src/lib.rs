//! # DataCache Core
//!
//! Cache contract and read-through service; no storage code.
//!
//! This crate contains:
//! - The `DatasetCache` port implemented by storage adapters
//! - The `DatasetSource` port implemented by origin fetchers
//! - `CachedLoader`, the read-through service loaders build on
//!
//! ## Architecture Principles
//! - Depends only on `datacache-common` and `datacache-domain`
//! - All storage access via traits

pub mod cache;

pub use cache::ports::{DatasetCache, DatasetSource};
pub use cache::service::{CachedLoader, RefreshPolicy};
