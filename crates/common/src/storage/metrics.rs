//! Storage metrics tracking
//!
//! Lock-free counters for connection acquisition and query outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use super::types::PoolMetrics;

/// Storage metrics tracker
#[derive(Debug)]
pub struct StorageMetrics {
    /// Number of connections successfully acquired from the pool
    pub connections_acquired: AtomicU64,

    /// Number of connection acquisition timeouts
    pub connections_timeout: AtomicU64,

    /// Number of connection errors
    pub connections_error: AtomicU64,

    /// Total time spent acquiring connections (in milliseconds)
    total_connection_time_ms: AtomicU64,

    /// Number of queries executed
    pub queries_executed: AtomicU64,

    /// Number of queries that failed
    pub queries_failed: AtomicU64,

    max_pool_size: u32,
}

impl StorageMetrics {
    /// Create a new metrics tracker
    pub fn new(max_pool_size: u32) -> Self {
        Self {
            connections_acquired: AtomicU64::new(0),
            connections_timeout: AtomicU64::new(0),
            connections_error: AtomicU64::new(0),
            total_connection_time_ms: AtomicU64::new(0),
            queries_executed: AtomicU64::new(0),
            queries_failed: AtomicU64::new(0),
            max_pool_size,
        }
    }

    /// Record a successful connection acquisition
    pub fn record_connection_acquired(&self, duration_ms: u64) {
        self.connections_acquired.fetch_add(1, Ordering::Relaxed);
        self.total_connection_time_ms.fetch_add(duration_ms, Ordering::Relaxed);
    }

    /// Record a connection timeout
    pub fn record_connection_timeout(&self) {
        self.connections_timeout.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a connection error
    pub fn record_connection_error(&self) {
        self.connections_error.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful query execution
    pub fn record_query_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed query
    pub fn record_query_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a query
    pub fn record_query<T, E>(&self, result: &Result<T, E>) {
        match result {
            Ok(_) => self.record_query_executed(),
            Err(_) => self.record_query_failed(),
        }
    }

    /// Average connection acquisition time in milliseconds
    pub fn avg_connection_time_ms(&self) -> u64 {
        let total = self.total_connection_time_ms.load(Ordering::Relaxed);
        let count = self.connections_acquired.load(Ordering::Relaxed);

        if count == 0 {
            0
        } else {
            total / count
        }
    }

    /// Get the maximum pool size
    pub fn max_pool_size(&self) -> u32 {
        self.max_pool_size
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> PoolMetrics {
        PoolMetrics {
            connections_acquired: self.connections_acquired.load(Ordering::Relaxed),
            connections_timeout: self.connections_timeout.load(Ordering::Relaxed),
            connections_error: self.connections_error.load(Ordering::Relaxed),
            avg_acquisition_time_ms: self.avg_connection_time_ms(),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_acquired_average() {
        let metrics = StorageMetrics::new(1);
        assert_eq!(metrics.avg_connection_time_ms(), 0);

        metrics.record_connection_acquired(100);
        metrics.record_connection_acquired(200);

        assert_eq!(metrics.connections_acquired.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.avg_connection_time_ms(), 150);
        assert_eq!(metrics.max_pool_size(), 1);
    }

    #[test]
    fn test_record_query_outcomes() {
        let metrics = StorageMetrics::new(1);
        metrics.record_query::<(), ()>(&Ok(()));
        metrics.record_query::<(), ()>(&Ok(()));
        metrics.record_query::<(), &str>(&Err("disk I/O error"));
        metrics.record_connection_timeout();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queries_executed, 2);
        assert_eq!(snapshot.queries_failed, 1);
        assert_eq!(snapshot.connections_timeout, 1);
        assert_eq!(snapshot.connections_error, 0);
    }
}
