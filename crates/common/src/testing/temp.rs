//! Temporary database helpers
//!
//! RAII wrapper around a temporary directory holding a single SQLite file.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary SQLite database location, deleted when dropped
///
/// # Examples
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use datacache_common::testing::TempDatabase;
///
/// let db = TempDatabase::new("cache-test").unwrap();
/// assert!(db.url().starts_with("sqlite:///"));
/// # }
/// ```
#[derive(Debug)]
pub struct TempDatabase {
    dir: TempDir,
    path: PathBuf,
}

impl TempDatabase {
    /// Create a temporary directory with a prefix and reserve `cache.db` in it
    pub fn new(prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
        let path = dir.path().join("cache.db");
        Ok(Self { dir, path })
    }

    /// Path of the database file (it may not exist until first connect)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the database file
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute `sqlite:////abs/path` locator for the database file
    pub fn url(&self) -> String {
        format!("sqlite:///{}", self.path.display())
    }
}
