//! Conversions from storage errors into domain errors.

use datacache_common::storage::StorageError;
use datacache_domain::DataCacheError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub DataCacheError);

impl From<InfraError> for DataCacheError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<DataCacheError> for InfraError {
    fn from(value: DataCacheError) -> Self {
        InfraError(value)
    }
}

impl InfraError {
    /// Re-tag a storage failure as a retention failure
    ///
    /// Validation errors keep their variant.
    pub fn into_eviction(self) -> DataCacheError {
        match self.0 {
            DataCacheError::StorageWrite(message)
            | DataCacheError::Connection(message)
            | DataCacheError::Internal(message) => DataCacheError::Eviction(message),
            other => other,
        }
    }
}

trait IntoDataCacheError {
    fn into_datacache(self) -> DataCacheError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → DataCacheError */
/* -------------------------------------------------------------------------- */

impl IntoDataCacheError for SqlError {
    fn into_datacache(self) -> DataCacheError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match err.code {
                    ErrorCode::DatabaseBusy => {
                        DataCacheError::StorageWrite("database is busy".into())
                    }
                    ErrorCode::DatabaseLocked => {
                        DataCacheError::StorageWrite("database is locked".into())
                    }
                    ErrorCode::ReadOnly => {
                        DataCacheError::StorageWrite("database is read-only".into())
                    }
                    ErrorCode::DiskFull => DataCacheError::StorageWrite("disk is full".into()),
                    ErrorCode::CannotOpen => {
                        DataCacheError::Connection(format!("unable to open database: {message}"))
                    }
                    ErrorCode::NotADatabase => {
                        DataCacheError::Connection("file is not a database".into())
                    }
                    _ => DataCacheError::StorageWrite(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                DataCacheError::StorageWrite(format!("failed to convert sqlite value: {cause}"))
            }
            RE::ToSqlConversionFailure(cause) => {
                DataCacheError::StorageWrite(format!("failed to bind value: {cause}"))
            }
            RE::InvalidPath(path) => DataCacheError::Connection(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => DataCacheError::StorageWrite(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_datacache())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → DataCacheError */
/* -------------------------------------------------------------------------- */

impl IntoDataCacheError for StorageError {
    fn into_datacache(self) -> DataCacheError {
        match self {
            StorageError::Connection(message) => DataCacheError::Connection(message),
            StorageError::Timeout(secs) => DataCacheError::Connection(format!(
                "timed out after {secs}s waiting for a database connection"
            )),
            StorageError::R2d2(err) => DataCacheError::Connection(err.to_string()),
            StorageError::Io(err) => DataCacheError::Connection(err.to_string()),
            StorageError::InvalidConfig(message) => DataCacheError::Config(message),
            StorageError::Query(message) => DataCacheError::StorageWrite(message),
            StorageError::Rusqlite(err) => err.into_datacache(),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        InfraError(value.into_datacache())
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::ffi;

    use super::*;

    fn sqlite_failure(code: i32, message: Option<&str>) -> SqlError {
        SqlError::SqliteFailure(ffi::Error::new(code), message.map(str::to_string))
    }

    #[test]
    fn busy_and_locked_map_to_storage_write() {
        let err: DataCacheError = InfraError::from(sqlite_failure(ffi::SQLITE_BUSY, None)).into();
        assert_eq!(err, DataCacheError::StorageWrite("database is busy".into()));

        let err: DataCacheError = InfraError::from(sqlite_failure(ffi::SQLITE_LOCKED, None)).into();
        assert_eq!(err, DataCacheError::StorageWrite("database is locked".into()));
    }

    #[test]
    fn open_failures_map_to_connection() {
        let err: DataCacheError =
            InfraError::from(sqlite_failure(ffi::SQLITE_CANTOPEN, Some("no such directory")))
                .into();
        assert!(matches!(err, DataCacheError::Connection(msg) if msg.contains("no such directory")));
    }

    #[test]
    fn storage_errors_map_by_variant() {
        let err: DataCacheError = InfraError::from(StorageError::Timeout(3600)).into();
        assert!(matches!(err, DataCacheError::Connection(msg) if msg.contains("3600s")));

        let err: DataCacheError =
            InfraError::from(StorageError::InvalidConfig("pool_size".into())).into();
        assert!(matches!(err, DataCacheError::Config(_)));

        let err: DataCacheError =
            InfraError::from(StorageError::Rusqlite(sqlite_failure(ffi::SQLITE_FULL, None))).into();
        assert_eq!(err, DataCacheError::StorageWrite("disk is full".into()));
    }

    #[test]
    fn into_eviction_retags_storage_failures_only() {
        let err = InfraError(DataCacheError::StorageWrite("database is locked".into()));
        assert_eq!(err.into_eviction(), DataCacheError::Eviction("database is locked".into()));

        let err = InfraError(DataCacheError::InvalidInput("bad kind".into()));
        assert_eq!(err.into_eviction(), DataCacheError::InvalidInput("bad kind".into()));
    }
}
