#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use datacache_common::testing::{MockClock, TempDatabase};
use datacache_domain::{Dataset, Value};
use datacache_infra::database::SqliteDataCache;

/// File-backed cache with a controllable clock; the database file lives as
/// long as this value.
pub struct TestCache {
    pub cache: Arc<SqliteDataCache>,
    pub clock: MockClock,
    pub db: TempDatabase,
}

impl TestCache {
    /// Create a cache keeping `recycle` versions, clock frozen at [`base_time`]
    pub fn new(recycle: Option<u32>) -> Self {
        let db = TempDatabase::new("infra-test").expect("temp dir should be created");
        let clock = MockClock::at(base_time());
        let cache = SqliteDataCache::new(db.url(), recycle)
            .expect("cache config should be valid")
            .with_clock(Arc::new(clock.clone()));

        Self { cache: Arc::new(cache), clock, db }
    }

    /// Second cache handle on the same database file
    pub fn reopen(&self, recycle: Option<u32>) -> SqliteDataCache {
        SqliteDataCache::new(self.db.url(), recycle)
            .expect("cache config should be valid")
            .with_clock(Arc::new(self.clock.clone()))
    }

    /// Advance the clock by whole seconds
    pub fn tick(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }
}

/// Fixed instant every test clock starts at
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single().expect("valid timestamp")
}

/// Single-column dataset `[{value: v}]`
pub fn value_rows(values: &[i64]) -> Dataset {
    Dataset::with_rows(["value"], values.iter().map(|v| vec![Value::Integer(*v)]).collect())
        .expect("dataset should be valid")
}

/// Daily closes for an index
pub fn closes(rows: &[(&str, f64)]) -> Dataset {
    Dataset::with_rows(
        ["date", "close"],
        rows.iter().map(|(date, close)| vec![Value::from(*date), Value::Real(*close)]).collect(),
    )
    .expect("dataset should be valid")
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captured log output of a closure
pub struct CapturedLogs(String);

impl CapturedLogs {
    pub fn text(&self) -> &str {
        &self.0
    }

    /// Check whether a line at `level` contains `needle`
    pub fn contains(&self, level: &str, needle: &str) -> bool {
        self.0.lines().any(|line| line.contains(level) && line.contains(needle))
    }
}

/// Run `f` with a thread-local subscriber recording every event at DEBUG
/// and above.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&buffer.0.lock().expect("log buffer poisoned")).into_owned();
    (result, CapturedLogs(text))
}
