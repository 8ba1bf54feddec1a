//! Cell values and declared column types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_sql_keyword_conversions;

/// One cell of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    /// Stored as fixed-width UTC text; precision below one microsecond is
    /// dropped on write
    Timestamp(DateTime<Utc>),
    Blob(Vec<u8>),
}

/// Declared SQL type of a payload column
///
/// Recorded in the table definition so values read back with the logical
/// type they were written with (SQLite itself has no boolean or timestamp
/// storage class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    Integer,
    Real,
    Text,
    Timestamp,
    Blob,
}

impl_sql_keyword_conversions!(ColumnType {
    Boolean => "BOOLEAN",
    Integer => "INTEGER",
    Real => "REAL",
    Text => "TEXT",
    Timestamp => "TIMESTAMP",
    Blob => "BLOB",
});

impl ColumnType {
    /// Map a declared type from the schema; `None` for anything unrecognised
    pub fn from_declared(declared: &str) -> Option<Self> {
        declared.parse().ok()
    }

    /// Whether SQLite keeps values of this type in a storage class of their
    /// own, so they survive a column with no declared type unchanged
    ///
    /// Booleans are stored as integers and timestamps as text.
    pub fn is_native(self) -> bool {
        matches!(self, Self::Integer | Self::Real | Self::Text | Self::Blob)
    }
}

impl Value {
    /// Column type this value implies, `None` for `Null`
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ColumnType::Boolean),
            Self::Integer(_) => Some(ColumnType::Integer),
            Self::Real(_) => Some(ColumnType::Real),
            Self::Text(_) => Some(ColumnType::Text),
            Self::Timestamp(_) => Some(ColumnType::Timestamp),
            Self::Blob(_) => Some(ColumnType::Blob),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
