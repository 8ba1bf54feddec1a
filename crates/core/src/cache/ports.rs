//! Port interfaces for the dataset cache
//!
//! These traits define the boundary between the read-through logic and the
//! storage and origin implementations.

use chrono::{DateTime, Utc};
use datacache_domain::{Dataset, Result};

/// Time-versioned store of datasets keyed by `(kind, id)`
///
/// Every operation is synchronous and may block while waiting for the
/// backing store. Reads never fail: structural problems (unknown kind,
/// unreachable store) are logged by the implementation and reported as a
/// miss.
pub trait DatasetCache: Send + Sync {
    /// Capture time of the newest version, if any
    fn last(&self, kind: &str, id: &str) -> Option<DateTime<Utc>>;

    /// Rows of the newest version captured at or before `as_of`
    ///
    /// Without `as_of` the newest version is returned. Reserved columns are
    /// stripped.
    fn get(&self, kind: &str, id: &str, as_of: Option<DateTime<Utc>>) -> Option<Dataset>;

    /// Append `data` as a new version and apply retention
    ///
    /// Returns the capture time assigned to the version, or `None` when
    /// `data` has no rows (nothing is written).
    fn set(&self, kind: &str, id: &str, data: &Dataset) -> Result<Option<DateTime<Utc>>>;

    /// Drop versions beyond the retention depth; returns rows deleted
    fn clean_old(&self, kind: &str, id: &str) -> Result<usize>;

    /// Capture times of every stored version, newest first
    fn versions(&self, kind: &str, id: &str) -> Vec<DateTime<Utc>>;
}

/// Origin fetcher for one kind of dataset (market index, currency pair,
/// portfolio ledger)
pub trait DatasetSource: Send + Sync {
    /// Kind under which fetched datasets are cached
    fn kind(&self) -> &str;

    /// Fetch the current dataset for `id` from the origin
    fn fetch(&self, id: &str) -> Result<Dataset>;
}
