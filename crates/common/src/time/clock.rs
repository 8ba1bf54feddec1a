//! Wall-clock abstraction
//!
//! Cache versions are stamped with the UTC time at write. Reading the clock
//! through a trait keeps that deterministic under test.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Source of the current UTC wall-clock time
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real system clock implementation
///
/// Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient sharing
impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_utc(&self) -> DateTime<Utc> {
        (**self).now_utc()
    }
}
