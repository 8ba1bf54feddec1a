//! Modular common utilities shared across DataCache crates.
//!
//! # Feature Tiers
//!
//! - always on: errors, wall-clock abstraction
//! - `platform`: SQLite storage primitives (r2d2 pool, connection wrapper)
//! - `test-utils`: temporary directories and a controllable clock

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
pub mod error;
pub mod time;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod storage;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use error::{ErrorClassification, ErrorSeverity};
pub use time::{Clock, SystemClock};
