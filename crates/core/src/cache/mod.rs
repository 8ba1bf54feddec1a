//! Dataset cache ports and the read-through loader

pub mod ports;
pub mod service;

pub use ports::{DatasetCache, DatasetSource};
pub use service::{CachedLoader, RefreshPolicy};
