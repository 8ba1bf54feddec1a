//! Testing utilities and helpers
//!
//! - **[`temp`]**: temporary database files that clean up on drop
//! - **[`time`]**: a controllable wall clock for deterministic capture times
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use chrono::{TimeZone, Utc};
//! use datacache_common::testing::MockClock;
//! use datacache_common::Clock;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
//! let clock = MockClock::at(start);
//! clock.advance(chrono::Duration::seconds(5));
//! assert_eq!(clock.now_utc(), start + chrono::Duration::seconds(5));
//! # }
//! ```

pub mod temp;
pub mod time;

pub use temp::TempDatabase;
pub use time::MockClock;
