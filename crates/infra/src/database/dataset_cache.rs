//! SQLite-backed dataset cache
//!
//! One table per kind (`DataCache__{kind}`), two reserved columns for the id
//! and the capture time, and one column per payload field. Every `set`
//! appends a new version inside a single `IMMEDIATE` transaction and then
//! evicts versions beyond the retention depth.
//!
//! SQLite resolves table and column names without regard to case. A kind or
//! column that matches a stored one only up to case is rejected on write and
//! treated as absent on read, so it never reaches another kind's rows.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use datacache_common::storage::{HealthStatus, PoolMetrics, StorageError};
use datacache_common::{Clock, ErrorClassification, SystemClock};
use datacache_core::cache::DatasetCache;
use datacache_domain::constants::TABLE_PREFIX;
use datacache_domain::{
    format_captured_at, parse_captured_at, truncate_to_micros, validate_id, CacheConfig,
    ColumnType, DataCacheError, Dataset, Kind, Result, Value,
};
use rusqlite::{Connection, Row, ToSql};
use tracing::{debug, error, instrument, warn};

use super::manager::DbManager;
use super::sql::{
    add_column_sql, create_index_sql, create_table_sql, decode_value, delete_through,
    eviction_cutoff, insert_sql, newest_version, select_newest_sql, stored_table_name,
    stores_verbatim, table_columns, version_times, SqlValue,
};
use crate::errors::InfraError;

/// Time-versioned dataset cache over a SQLite store
///
/// Connects lazily on first use. Share it across threads behind an `Arc`;
/// the pooled connection serializes every operation.
pub struct SqliteDataCache {
    db: Arc<DbManager>,
    recycle: Option<u32>,
    clock: Arc<dyn Clock>,
}

impl SqliteDataCache {
    /// Cache on `url` keeping `recycle` versions per id (`None` keeps all)
    ///
    /// # Errors
    /// `DataCacheError::Config` when `recycle` is `Some(0)` or `url` is
    /// empty. The store itself is not opened until first use.
    pub fn new(url: impl Into<String>, recycle: Option<u32>) -> Result<Self> {
        Self::from_config(&CacheConfig::new(url).with_recycle(recycle))
    }

    /// Cache built from a loaded configuration section
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            db: Arc::new(DbManager::new(config.clone())),
            recycle: config.recycle,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock that stamps new versions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn url(&self) -> &str {
        self.db.url()
    }

    pub fn recycle(&self) -> Option<u32> {
        self.recycle
    }

    /// Open the store now instead of on first use
    ///
    /// Idempotent; later calls reuse the open pool.
    pub fn connect(&self) -> Result<()> {
        self.db.connect().map(|_| ())
    }

    /// Drop the open pool; the next operation reconnects
    pub fn close(&self) {
        self.db.close();
    }

    pub fn is_connected(&self) -> bool {
        self.db.is_connected()
    }

    pub fn health_check(&self) -> Result<HealthStatus> {
        self.db.health_check()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.db.metrics()
    }

    /// Run a read against the kind's table, degrading every failure to `None`
    ///
    /// The table lookup and the query share one read transaction, so they
    /// see the same snapshot even when another connection writes meanwhile.
    fn read<T>(
        &self,
        operation: &'static str,
        kind: &str,
        id: &str,
        query: impl FnOnce(&Connection, &str) -> rusqlite::Result<Option<T>>,
    ) -> Option<T> {
        let kind = match Kind::new(kind).and_then(|kind| validate_id(id).map(|()| kind)) {
            Ok(kind) => kind,
            Err(err) => {
                warn!(operation, kind, id, error = %err, "Rejected cache read");
                return None;
            }
        };

        let conn = match self.db.get_connection() {
            Ok(conn) => conn,
            Err(err) => {
                warn!(operation, %kind, id, error = %err, "Cache store unavailable");
                return None;
            }
        };

        let table = kind.table_name();
        let result = conn.unchecked_transaction().and_then(|tx| {
            let found = match table_state(&tx, &table)? {
                TableState::Ready => query(&*tx, &table)?,
                TableState::Missing => {
                    debug!(operation, %kind, id, "No table for kind");
                    None
                }
                TableState::Conflict(stored) => {
                    debug!(
                        operation,
                        %kind,
                        id,
                        %stored,
                        "Kind differs only in case from a stored kind"
                    );
                    None
                }
            };
            tx.commit()?;
            Ok(found)
        });
        self.db.record_query(&result);
        result.unwrap_or_else(|err| {
            log_storage_failure("Cache read failed", &kind, id, &StorageError::from(err));
            None
        })
    }

    /// Delete versions of `id` beyond the retention depth
    fn evict(&self, conn: &Connection, table: &str, id: &str) -> rusqlite::Result<usize> {
        let Some(keep) = self.recycle else {
            return Ok(0);
        };
        match eviction_cutoff(conn, table, id, keep)? {
            Some(cutoff) => delete_through(conn, table, id, &cutoff),
            None => Ok(0),
        }
    }
}

impl DatasetCache for SqliteDataCache {
    fn last(&self, kind: &str, id: &str) -> Option<DateTime<Utc>> {
        self.read("last", kind, id, |conn, table| {
            let newest = newest_version(conn, table, id, None)?;
            Ok(newest.as_deref().and_then(parse_stored_time))
        })
    }

    fn get(&self, kind: &str, id: &str, as_of: Option<DateTime<Utc>>) -> Option<Dataset> {
        let as_of = as_of.map(|at| format_captured_at(&truncate_to_micros(at)));
        let (columns, rows) = self.read("get", kind, id, |conn, table| {
            read_newest(conn, table, id, as_of.as_deref())
        })?;

        match Dataset::with_rows(columns, rows) {
            Ok(dataset) => {
                debug!(kind, id, rows = dataset.len(), "Cache hit");
                Some(dataset)
            }
            Err(err) => {
                warn!(kind, id, error = %err, "Stored version is not a valid dataset");
                None
            }
        }
    }

    #[instrument(skip(self, data), fields(rows = data.len()))]
    fn set(&self, kind: &str, id: &str, data: &Dataset) -> Result<Option<DateTime<Utc>>> {
        let kind = Kind::new(kind)?;
        validate_id(id)?;
        data.validate()?;

        if data.is_empty() {
            debug!("Empty dataset; nothing written");
            return Ok(None);
        }

        let now = truncate_to_micros(self.clock.now_utc());
        let table = kind.table_name();
        let conn = self.db.get_connection()?;

        let written = write_version(&conn, &table, id, data, now);
        self.db.record_query(&written);
        let captured_at = written.map_err(|err| match err {
            WriteError::Rejected(reason) => {
                warn!(%reason, "Cache write rejected");
                DataCacheError::InvalidInput(reason)
            }
            WriteError::Storage(err) => {
                let err = StorageError::from(err);
                log_storage_failure("Cache write rolled back", &kind, id, &err);
                DataCacheError::from(InfraError::from(err))
            }
        })?;
        debug!(captured_at = %format_captured_at(&captured_at), "Stored new version");

        // Same connection: the pool may hold only one
        match self.evict(&conn, &table, id) {
            Ok(0) => {}
            Ok(deleted) => debug!(deleted, "Evicted old versions"),
            Err(err) => {
                let err = StorageError::from(err);
                log_storage_failure("Eviction after write failed", &kind, id, &err);
            }
        }

        Ok(Some(captured_at))
    }

    fn clean_old(&self, kind: &str, id: &str) -> Result<usize> {
        let kind = Kind::new(kind)?;
        validate_id(id)?;
        if self.recycle.is_none() {
            return Ok(0);
        }

        let conn = self.db.get_connection().map_err(|err| InfraError(err).into_eviction())?;
        let table = kind.table_name();
        let result = table_state(&conn, &table).and_then(|state| match state {
            TableState::Ready => self.evict(&conn, &table, id),
            TableState::Missing | TableState::Conflict(_) => Ok(0),
        });
        self.db.record_query(&result);
        match result {
            Ok(deleted) => {
                if deleted > 0 {
                    debug!(%kind, id, deleted, "Evicted old versions");
                }
                Ok(deleted)
            }
            Err(err) => {
                let err = StorageError::from(err);
                log_storage_failure("Eviction failed", &kind, id, &err);
                Err(InfraError::from(err).into_eviction())
            }
        }
    }

    fn versions(&self, kind: &str, id: &str) -> Vec<DateTime<Utc>> {
        self.read("versions", kind, id, |conn, table| {
            let times = version_times(conn, table, id)?;
            Ok(Some(times.iter().map(String::as_str).filter_map(parse_stored_time).collect()))
        })
        .unwrap_or_default()
    }
}

impl fmt::Display for SqliteDataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.recycle {
            Some(n) => write!(f, "DataCache(url={}, recycle={})", self.url(), n),
            None => write!(f, "DataCache(url={}, recycle=None)", self.url()),
        }
    }
}

impl fmt::Debug for SqliteDataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Log a storage failure at the level its severity calls for
fn log_storage_failure(message: &str, kind: &Kind, id: &str, err: &StorageError) {
    if err.is_critical() {
        error!(%kind, id, error = %err, severity = %err.severity(), "{message}");
    } else {
        warn!(
            %kind,
            id,
            error = %err,
            severity = %err.severity(),
            retryable = err.is_retryable(),
            "{message}"
        );
    }
}

fn parse_stored_time(raw: &str) -> Option<DateTime<Utc>> {
    let parsed = parse_captured_at(raw);
    if parsed.is_none() {
        warn!(raw, "Unparseable capture time in cache table");
    }
    parsed
}

/// How the store resolves a kind's table name
enum TableState {
    Missing,
    Ready,
    /// A table exists under a name differing only in case
    Conflict(String),
}

fn table_state(conn: &Connection, table: &str) -> rusqlite::Result<TableState> {
    Ok(match stored_table_name(conn, table)? {
        None => TableState::Missing,
        Some(stored) if stored == table => TableState::Ready,
        Some(stored) => TableState::Conflict(stored),
    })
}

/// Failure inside the write transaction
#[derive(Debug)]
enum WriteError {
    /// The payload does not fit what is already stored
    Rejected(String),
    Storage(rusqlite::Error),
}

impl From<rusqlite::Error> for WriteError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err)
    }
}

/// Append one version in an `IMMEDIATE` transaction
///
/// Creates or widens the table, assigns a capture time strictly after the
/// newest stored version of `id`, and inserts every row. Rolls back on any
/// failure.
fn write_version(
    conn: &Connection,
    table: &str,
    id: &str,
    data: &Dataset,
    now: DateTime<Utc>,
) -> std::result::Result<DateTime<Utc>, WriteError> {
    conn.execute_batch("BEGIN IMMEDIATE")?;

    match append_rows(conn, table, id, data, now) {
        Ok(captured_at) => {
            if let Err(err) = conn.execute_batch("COMMIT") {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(err.into());
            }
            Ok(captured_at)
        }
        Err(err) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(err)
        }
    }
}

fn append_rows(
    conn: &Connection,
    table: &str,
    id: &str,
    data: &Dataset,
    now: DateTime<Utc>,
) -> std::result::Result<DateTime<Utc>, WriteError> {
    if let TableState::Conflict(stored) = table_state(conn, table)? {
        let strip = |name: &str| name.strip_prefix(TABLE_PREFIX).unwrap_or(name).to_string();
        return Err(WriteError::Rejected(format!(
            "kind '{}' differs only in case from stored kind '{}'",
            strip(table),
            strip(&stored)
        )));
    }
    ensure_columns(conn, table, data)?;

    let captured_at = match newest_version(conn, table, id, None)?
        .as_deref()
        .and_then(parse_captured_at)
    {
        Some(latest) if now <= latest => {
            debug!(table, id, "Clock reading not after newest version; bumped");
            latest + Duration::microseconds(1)
        }
        _ => now,
    };
    let stamp = format_captured_at(&captured_at);

    let mut stmt = conn.prepare(&insert_sql(table, data.columns()))?;
    for row in data.rows() {
        let values: Vec<SqlValue<'_>> = row.iter().map(SqlValue).collect();
        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(values.len() + 2);
        params.push(&id);
        params.push(&stamp);
        params.extend(values.iter().map(|v| v as &dyn ToSql));
        stmt.execute(params.as_slice())?;
    }

    Ok(captured_at)
}

/// Create the table on first write, or add payload columns it lacks
///
/// Values must read back unchanged from the columns they land in: a column
/// matching a stored one only up to case, or a value the stored column's
/// type would convert, rejects the write.
fn ensure_columns(
    conn: &Connection,
    table: &str,
    data: &Dataset,
) -> std::result::Result<(), WriteError> {
    let existing = table_columns(conn, table)?;
    let declared = data.inferred_types();

    if existing.is_empty() {
        let payload: Vec<(String, Option<ColumnType>)> =
            data.columns().iter().cloned().zip(declared).collect();
        conn.execute(&create_table_sql(table, &payload), [])?;
        conn.execute(&create_index_sql(table), [])?;
        debug!(table, columns = payload.len(), "Created cache table");
        return Ok(());
    }

    for (index, (name, ty)) in data.columns().iter().zip(declared).enumerate() {
        let Some(column) = existing.iter().find(|c| c.name.eq_ignore_ascii_case(name)) else {
            conn.execute(&add_column_sql(table, name, ty), [])?;
            debug!(table, column = %name, "Added column to cache table");
            continue;
        };

        if column.name != *name {
            return Err(WriteError::Rejected(format!(
                "column '{name}' differs only in case from stored column '{}'",
                column.name
            )));
        }
        if let Some(bad) =
            data.column_types(index).into_iter().find(|ty| !stores_verbatim(column.declared, *ty))
        {
            let stored = column.declared.map_or_else(|| "untyped".to_string(), |ty| ty.to_string());
            return Err(WriteError::Rejected(format!(
                "column '{name}' is stored as {stored} and cannot hold {bad} values"
            )));
        }
    }
    Ok(())
}

/// Payload columns and rows of the newest version of `id` at or before
/// `as_of`; `None` when no version qualifies
fn read_newest(
    conn: &Connection,
    table: &str,
    id: &str,
    as_of: Option<&str>,
) -> rusqlite::Result<Option<(Vec<String>, Vec<Vec<Value>>)>> {
    let columns: Vec<_> =
        table_columns(conn, table)?.into_iter().filter(|c| !c.is_reserved()).collect();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();

    let mut stmt = conn.prepare(&select_newest_sql(table, &names, as_of.is_some()))?;
    let decode = |row: &Row<'_>| {
        columns
            .iter()
            .enumerate()
            .map(|(i, column)| Ok(decode_value(row.get_ref(i)?, column.declared)))
            .collect::<rusqlite::Result<Vec<_>>>()
    };
    let rows = match as_of {
        Some(as_of) => stmt.query_map([id, as_of], decode)?.collect::<rusqlite::Result<Vec<_>>>()?,
        None => stmt.query_map([id], decode)?.collect::<rusqlite::Result<Vec<_>>>()?,
    };

    if rows.is_empty() {
        return Ok(None);
    }
    let names = names.into_iter().map(str::to_string).collect();
    Ok(Some((names, rows)))
}
