//! # DataCache Domain
//!
//! Domain types for the time-versioned dataset cache.
//!
//! This crate contains:
//! - Dataset model (`Kind`, `Value`, `ColumnType`, `Dataset`)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Reserved table/column names and defaults
//!
//! ## Architecture
//! - No dependencies on other DataCache crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
