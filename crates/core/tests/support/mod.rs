//! Shared test helpers for `datacache-core` integration tests.
//!
//! In-memory stand-ins for the cache and origin ports so the read-through
//! behaviour can be tested without a database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use datacache_common::Clock;
use datacache_core::{DatasetCache, DatasetSource};
use datacache_domain::{DataCacheError, Dataset, Result, Value};

type Versions = Vec<(DateTime<Utc>, Dataset)>;

/// In-memory `DatasetCache` keeping versions per `(kind, id)` in capture order.
pub struct InMemoryCache {
    clock: Arc<dyn Clock>,
    recycle: Option<usize>,
    versions: Mutex<HashMap<(String, String), Versions>>,
    fail_writes: bool,
}

impl InMemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, recycle: None, versions: Mutex::new(HashMap::new()), fail_writes: false }
    }

    /// Cache whose `set` always fails, for write-back error paths.
    pub fn failing(clock: Arc<dyn Clock>) -> Self {
        Self { fail_writes: true, ..Self::new(clock) }
    }

    pub fn with_recycle(mut self, recycle: usize) -> Self {
        self.recycle = Some(recycle);
        self
    }

    fn key(kind: &str, id: &str) -> (String, String) {
        (kind.to_string(), id.to_string())
    }
}

impl DatasetCache for InMemoryCache {
    fn last(&self, kind: &str, id: &str) -> Option<DateTime<Utc>> {
        let versions = self.versions.lock().expect("cache lock poisoned");
        versions.get(&Self::key(kind, id)).and_then(|v| v.last()).map(|(at, _)| *at)
    }

    fn get(&self, kind: &str, id: &str, as_of: Option<DateTime<Utc>>) -> Option<Dataset> {
        let versions = self.versions.lock().expect("cache lock poisoned");
        versions
            .get(&Self::key(kind, id))?
            .iter()
            .rev()
            .find(|(at, _)| as_of.map_or(true, |limit| *at <= limit))
            .map(|(_, data)| data.clone())
    }

    fn set(&self, kind: &str, id: &str, data: &Dataset) -> Result<Option<DateTime<Utc>>> {
        if self.fail_writes {
            return Err(DataCacheError::StorageWrite("disk full".into()));
        }
        if data.is_empty() {
            return Ok(None);
        }

        let mut versions = self.versions.lock().expect("cache lock poisoned");
        let entry = versions.entry(Self::key(kind, id)).or_default();
        let mut now = self.clock.now_utc();
        if let Some((newest, _)) = entry.last() {
            if now <= *newest {
                now = *newest + Duration::microseconds(1);
            }
        }
        entry.push((now, data.clone()));
        drop(versions);

        self.clean_old(kind, id)?;
        Ok(Some(now))
    }

    fn clean_old(&self, kind: &str, id: &str) -> Result<usize> {
        let Some(recycle) = self.recycle else {
            return Ok(0);
        };
        let mut versions = self.versions.lock().expect("cache lock poisoned");
        let Some(entry) = versions.get_mut(&Self::key(kind, id)) else {
            return Ok(0);
        };
        let excess = entry.len().saturating_sub(recycle);
        let rows = entry.drain(..excess).map(|(_, data)| data.len()).sum();
        Ok(rows)
    }

    fn versions(&self, kind: &str, id: &str) -> Vec<DateTime<Utc>> {
        let versions = self.versions.lock().expect("cache lock poisoned");
        versions
            .get(&Self::key(kind, id))
            .map(|v| v.iter().rev().map(|(at, _)| *at).collect())
            .unwrap_or_default()
    }
}

/// Origin fetcher returning one closing price per fetch, counting calls.
pub struct CountingSource {
    kind: String,
    fetches: AtomicUsize,
    fail: bool,
    empty: bool,
}

impl CountingSource {
    pub fn new(kind: &str) -> Self {
        Self { kind: kind.to_string(), fetches: AtomicUsize::new(0), fail: false, empty: false }
    }

    pub fn failing(kind: &str) -> Self {
        Self { fail: true, ..Self::new(kind) }
    }

    /// Source whose origin currently has no rows.
    pub fn empty(kind: &str) -> Self {
        Self { empty: true, ..Self::new(kind) }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DatasetSource for CountingSource {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn fetch(&self, id: &str) -> Result<Dataset> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(DataCacheError::Source(format!("origin unavailable for {id}")));
        }
        let rows = if self.empty {
            Vec::new()
        } else {
            vec![vec![Value::from(id), Value::Integer(n as i64)]]
        };
        Dataset::with_rows(["symbol", "fetch"], rows)
    }
}

/// Fetch counter stamped into the row by `CountingSource`.
pub fn fetch_number(data: &Dataset) -> Option<i64> {
    data.value(0, "fetch").and_then(Value::as_i64)
}
