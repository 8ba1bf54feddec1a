//! Read-through loading - cached data first, origin on miss or refresh

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use datacache_common::{Clock, SystemClock};
use datacache_domain::{Dataset, Result};
use tracing::{debug, warn};

use super::ports::{DatasetCache, DatasetSource};

/// When a cached version may be served instead of fetching from the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Serve any cached version
    #[default]
    CacheFirst,

    /// Serve the cached version only if it is at most this old
    MaxAge(Duration),

    /// Always fetch from the origin
    Always,
}

/// Read-through loader for one dataset source
///
/// Write-back failures are logged and never surface to the caller: the
/// freshly fetched data is still returned.
pub struct CachedLoader {
    cache: Arc<dyn DatasetCache>,
    source: Arc<dyn DatasetSource>,
    clock: Arc<dyn Clock>,
    policy: RefreshPolicy,
}

impl CachedLoader {
    /// Create a loader serving any cached version
    pub fn new(cache: Arc<dyn DatasetCache>, source: Arc<dyn DatasetSource>) -> Self {
        Self { cache, source, clock: Arc::new(SystemClock), policy: RefreshPolicy::default() }
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the clock used to judge cache age
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Kind of the wrapped source
    pub fn kind(&self) -> &str {
        self.source.kind()
    }

    /// Load the dataset for `id`
    ///
    /// `refresh` forces an origin fetch regardless of policy. Origin errors
    /// propagate; cache errors do not.
    pub fn load(&self, id: &str, refresh: bool) -> Result<Dataset> {
        let kind = self.source.kind();

        if !refresh {
            if let Some(data) = self.cached_if_fresh(kind, id) {
                debug!(kind, id, rows = data.len(), "Serving cached dataset");
                return Ok(data);
            }
        }

        let data = self.source.fetch(id).inspect_err(|err| {
            warn!(kind, id, error = %err, "Origin fetch failed");
        })?;

        match self.cache.set(kind, id, &data) {
            Ok(Some(captured_at)) => {
                debug!(kind, id, rows = data.len(), %captured_at, "Cached fetched dataset");
            }
            Ok(None) => debug!(kind, id, "Origin returned no rows; nothing cached"),
            Err(err) => warn!(kind, id, error = %err, "Failed to write fetched dataset to cache"),
        }

        Ok(data)
    }

    /// Cached version as it stood at `as_of`; never contacts the origin
    pub fn load_as_of(&self, id: &str, as_of: DateTime<Utc>) -> Option<Dataset> {
        self.cache.get(self.source.kind(), id, Some(as_of))
    }

    /// Newest cached version regardless of age
    pub fn cached(&self, id: &str) -> Option<Dataset> {
        self.cache.get(self.source.kind(), id, None)
    }

    fn cached_if_fresh(&self, kind: &str, id: &str) -> Option<Dataset> {
        let max_age = match self.policy {
            RefreshPolicy::Always => return None,
            RefreshPolicy::CacheFirst => None,
            RefreshPolicy::MaxAge(age) => Some(age),
        };

        if let Some(max_age) = max_age {
            let captured_at = self.cache.last(kind, id)?;
            let age = self.clock.now_utc() - captured_at;
            if age > max_age {
                debug!(kind, id, %captured_at, "Cached dataset is stale");
                return None;
            }
        }

        self.cache.get(kind, id, None)
    }
}

impl std::fmt::Debug for CachedLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedLoader")
            .field("kind", &self.source.kind())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
