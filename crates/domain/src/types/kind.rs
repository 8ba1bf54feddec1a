//! Dataset kinds
//!
//! A kind names one backing table, so it is spliced into SQL text. Only a
//! conservative character set is accepted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_KIND_LENGTH, TABLE_PREFIX};
use crate::errors::{DataCacheError, Result};

/// Validated dataset category (`MarketIndex`, `CurrencyConverter`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Kind(String);

impl Kind {
    /// Validate and wrap a kind
    ///
    /// Allowed: ASCII alphanumerics, `_`, `-`, `.`, `^`; 1 to 128 characters.
    pub fn new(kind: impl Into<String>) -> Result<Self> {
        let kind = kind.into();

        if kind.is_empty() {
            return Err(DataCacheError::InvalidInput("kind must not be empty".into()));
        }
        if kind.len() > MAX_KIND_LENGTH {
            return Err(DataCacheError::InvalidInput(format!(
                "kind exceeds {MAX_KIND_LENGTH} characters"
            )));
        }
        if let Some(bad) = kind.chars().find(|c| !is_kind_char(*c)) {
            return Err(DataCacheError::InvalidInput(format!(
                "kind '{kind}' contains invalid character {bad:?}"
            )));
        }

        Ok(Self(kind))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backing table name, `DataCache__{kind}`
    ///
    /// SQLite compares table names without regard to case, so two kinds
    /// differing only in case resolve to the same table. The store keeps
    /// whichever was written first and refuses the other.
    pub fn table_name(&self) -> String {
        format!("{TABLE_PREFIX}{}", self.0)
    }
}

fn is_kind_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '^')
}

/// Reject empty ids
///
/// Ids are always bound as parameters, so any other content is allowed.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(DataCacheError::InvalidInput("id must not be empty".into()));
    }
    Ok(())
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Kind {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Kind {
    type Error = DataCacheError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Kind {
    type Error = DataCacheError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        kind.0
    }
}
