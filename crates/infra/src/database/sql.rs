//! SQL text helpers for the dynamic per-kind tables
//!
//! Table and column names are spliced into SQL only after validation and
//! double-quote escaping. Every value travels as a bound parameter.

use datacache_domain::constants::{ID_COLUMN, TIME_COLUMN};
use datacache_domain::{format_captured_at, parse_captured_at, ColumnType, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql};

/// Quote an identifier for SQLite
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Payload column as declared in an existing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared: Option<ColumnType>,
}

impl ColumnInfo {
    pub fn is_reserved(&self) -> bool {
        self.name == ID_COLUMN || self.name == TIME_COLUMN
    }
}

/// Stored name of the table SQLite resolves `table` to
///
/// Table names are case-insensitive, so the stored name may differ from
/// `table` in case. `None` when no such table exists.
pub fn stored_table_name(conn: &Connection, table: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        [table],
        |row| row.get(0),
    )
    .optional()
}

/// Columns of `table` in definition order; empty when the table is missing
pub fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare_cached("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| {
            let name: String = row.get(0)?;
            let declared: String = row.get(1)?;
            Ok(ColumnInfo { name, declared: ColumnType::from_declared(&declared) })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(columns)
}

/// Column definition for `CREATE TABLE` / `ALTER TABLE ... ADD COLUMN`
///
/// A column that was null in every row gets no declared type.
pub fn column_definition(name: &str, declared: Option<ColumnType>) -> String {
    match declared {
        Some(ty) => format!("{} {}", quote_ident(name), ty),
        None => quote_ident(name),
    }
}

pub fn create_table_sql(table: &str, payload: &[(String, Option<ColumnType>)]) -> String {
    let mut definitions = vec![
        format!("{} TEXT NOT NULL", quote_ident(ID_COLUMN)),
        format!("{} TEXT NOT NULL", quote_ident(TIME_COLUMN)),
    ];
    definitions.extend(payload.iter().map(|(name, ty)| column_definition(name, *ty)));
    format!("CREATE TABLE IF NOT EXISTS {} ({})", quote_ident(table), definitions.join(", "))
}

pub fn create_index_sql(table: &str) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} ({}, {})",
        quote_ident(&format!("ix_{table}_id_time")),
        quote_ident(table),
        quote_ident(ID_COLUMN),
        quote_ident(TIME_COLUMN)
    )
}

pub fn add_column_sql(table: &str, name: &str, declared: Option<ColumnType>) -> String {
    format!("ALTER TABLE {} ADD COLUMN {}", quote_ident(table), column_definition(name, declared))
}

pub fn insert_sql(table: &str, payload: &[String]) -> String {
    let mut columns = vec![quote_ident(ID_COLUMN), quote_ident(TIME_COLUMN)];
    columns.extend(payload.iter().map(|c| quote_ident(c)));
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Newest capture time stored for `id`, optionally bounded by `as_of`
pub fn newest_version(
    conn: &Connection,
    table: &str,
    id: &str,
    as_of: Option<&str>,
) -> rusqlite::Result<Option<String>> {
    let time = quote_ident(TIME_COLUMN);
    let id_col = quote_ident(ID_COLUMN);
    let table = quote_ident(table);
    match as_of {
        None => conn.query_row(
            &format!("SELECT MAX({time}) FROM {table} WHERE {id_col} = ?1"),
            [id],
            |row| row.get(0),
        ),
        Some(as_of) => conn.query_row(
            &format!("SELECT MAX({time}) FROM {table} WHERE {id_col} = ?1 AND {time} <= ?2"),
            [id, as_of],
            |row| row.get(0),
        ),
    }
}

/// Capture time of the oldest version that falls outside `keep` versions
pub fn eviction_cutoff(
    conn: &Connection,
    table: &str,
    id: &str,
    keep: u32,
) -> rusqlite::Result<Option<String>> {
    let time = quote_ident(TIME_COLUMN);
    conn.query_row(
        &format!(
            "SELECT DISTINCT {time} FROM {} WHERE {} = ?1 ORDER BY {time} DESC LIMIT 1 OFFSET ?2",
            quote_ident(table),
            quote_ident(ID_COLUMN),
        ),
        rusqlite::params![id, keep],
        |row| row.get(0),
    )
    .optional()
}

/// Delete every row of `id` captured at or before `cutoff`
pub fn delete_through(
    conn: &Connection,
    table: &str,
    id: &str,
    cutoff: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        &format!(
            "DELETE FROM {} WHERE {} = ?1 AND {} <= ?2",
            quote_ident(table),
            quote_ident(ID_COLUMN),
            quote_ident(TIME_COLUMN)
        ),
        [id, cutoff],
    )
}

/// Distinct capture times of `id`, newest first
pub fn version_times(conn: &Connection, table: &str, id: &str) -> rusqlite::Result<Vec<String>> {
    let time = quote_ident(TIME_COLUMN);
    let mut stmt = conn.prepare(&format!(
        "SELECT DISTINCT {time} FROM {} WHERE {} = ?1 ORDER BY {time} DESC",
        quote_ident(table),
        quote_ident(ID_COLUMN),
    ))?;
    let times = stmt.query_map([id], |row| row.get(0))?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(times)
}

/// Payload rows of the newest version of `id` in insertion order
///
/// One statement, so the version cannot be evicted between picking it and
/// reading it. With `bounded` the version must be captured at or before `?2`.
pub fn select_newest_sql(table: &str, payload: &[&str], bounded: bool) -> String {
    let time = quote_ident(TIME_COLUMN);
    let id_col = quote_ident(ID_COLUMN);
    let table = quote_ident(table);
    let columns: Vec<String> = payload.iter().map(|c| quote_ident(c)).collect();
    let bound = if bounded { format!(" AND {time} <= ?2") } else { String::new() };
    format!(
        "SELECT {} FROM {table} WHERE {id_col} = ?1 AND {time} = \
         (SELECT MAX({time}) FROM {table} WHERE {id_col} = ?1{bound}) ORDER BY rowid",
        columns.join(", "),
    )
}

/// Borrowed [`Value`] bound as a SQL parameter
///
/// Booleans bind as 0/1 and timestamps as fixed-width UTC text.
pub struct SqlValue<'a>(pub &'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(v) => ToSqlOutput::from(i64::from(*v)),
            Value::Integer(v) => ToSqlOutput::from(*v),
            Value::Real(v) => ToSqlOutput::from(*v),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Timestamp(v) => ToSqlOutput::from(format_captured_at(v)),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        })
    }
}

/// Whether values of type `written` read back unchanged from a column
/// declared as `declared`
///
/// A typed column only takes its own type, since SQLite converts anything
/// else by column affinity. An untyped column takes the native storage
/// classes.
pub fn stores_verbatim(declared: Option<ColumnType>, written: ColumnType) -> bool {
    match declared {
        Some(declared) => declared == written,
        None => written.is_native(),
    }
}

/// Decode a stored cell using the column's declared type
///
/// Values the declared type cannot represent come back as their storage
/// class.
pub fn decode_value(raw: ValueRef<'_>, declared: Option<ColumnType>) -> Value {
    match (raw, declared) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(v), Some(ColumnType::Boolean)) => Value::Bool(v != 0),
        (ValueRef::Integer(v), Some(ColumnType::Real)) => Value::Real(v as f64),
        (ValueRef::Text(bytes), Some(ColumnType::Timestamp)) => {
            let text = String::from_utf8_lossy(bytes);
            match parse_captured_at(&text) {
                Some(at) => Value::Timestamp(at),
                None => Value::Text(text.into_owned()),
            }
        }
        (ValueRef::Integer(v), _) => Value::Integer(v),
        (ValueRef::Real(v), _) => Value::Real(v),
        (ValueRef::Text(bytes), _) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        (ValueRef::Blob(bytes), _) => Value::Blob(bytes.to_vec()),
    }
}
