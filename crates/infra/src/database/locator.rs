//! Store locators
//!
//! Accepted forms:
//! - `sqlite:///relative/path.db`
//! - `sqlite:////absolute/path.db`
//! - `sqlite://`, `sqlite:///:memory:` or `:memory:` for a private in-memory
//!   database
//! - a bare filesystem path

use std::path::PathBuf;

use datacache_common::storage::StorageTarget;
use datacache_domain::{DataCacheError, Result};

const SCHEME_SEPARATOR: &str = "://";
const MEMORY: &str = ":memory:";

/// Resolve a locator into a storage target
///
/// # Errors
/// Returns `DataCacheError::Connection` for an empty locator, a scheme other
/// than `sqlite`, or a locator naming a host.
pub fn parse_locator(url: &str) -> Result<StorageTarget> {
    let url = url.trim();
    if url.is_empty() {
        return Err(DataCacheError::Connection("store locator is empty".into()));
    }
    if url == MEMORY {
        return Ok(StorageTarget::Memory);
    }

    let Some((scheme, rest)) = url.split_once(SCHEME_SEPARATOR) else {
        return Ok(StorageTarget::File(PathBuf::from(url)));
    };

    if !scheme.eq_ignore_ascii_case("sqlite") {
        return Err(DataCacheError::Connection(format!(
            "unsupported store scheme '{scheme}' in '{url}'"
        )));
    }
    if rest.is_empty() {
        return Ok(StorageTarget::Memory);
    }

    // Everything before the next '/' is a host, which SQLite has no use for
    let Some(path) = rest.strip_prefix('/') else {
        return Err(DataCacheError::Connection(format!(
            "sqlite locator '{url}' names a host; expected sqlite:///path"
        )));
    };

    match path {
        "" | MEMORY => Ok(StorageTarget::Memory),
        path => Ok(StorageTarget::File(PathBuf::from(path))),
    }
}
