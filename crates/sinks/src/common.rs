//! Common types and utilities for sinks
//!
//! Record/batch aliases, the sink error type and write metrics.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// One structured record: ordered field name to value mapping
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Ordered group of records delivered in one `send` call
pub type Batch = Vec<Record>;

/// Metrics for the file sink
#[derive(Debug, Default)]
pub struct FileSinkMetrics {
    /// Total batches received
    pub batches_received: AtomicU64,

    /// Total per-file group writes that succeeded
    pub groups_written: AtomicU64,

    /// Total records written
    pub records_written: AtomicU64,

    /// Total bytes appended
    pub bytes_written: AtomicU64,

    /// Per-file writes that failed
    pub write_errors: AtomicU64,

    /// Raw-mode records without the raw field
    pub records_skipped: AtomicU64,

    /// Records whose timestamp field could not be parsed
    pub timestamp_fallbacks: AtomicU64,
}

impl FileSinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            batches_received: AtomicU64::new(0),
            groups_written: AtomicU64::new(0),
            records_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
            records_skipped: AtomicU64::new(0),
            timestamp_fallbacks: AtomicU64::new(0),
        }
    }

    /// Record a received batch
    #[inline]
    pub fn record_received(&self) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one successful group append
    #[inline]
    pub fn record_group(&self, records: u64, bytes: u64) {
        self.groups_written.fetch_add(1, Ordering::Relaxed);
        self.records_written.fetch_add(records, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed group append
    #[inline]
    pub fn record_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record raw-mode records dropped for lack of a raw field
    #[inline]
    pub fn record_skipped(&self, count: u64) {
        self.records_skipped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a timestamp that fell back to "now"
    #[inline]
    pub fn record_timestamp_fallback(&self) {
        self.timestamp_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batches_received: self.batches_received.load(Ordering::Relaxed),
            groups_written: self.groups_written.load(Ordering::Relaxed),
            records_written: self.records_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
            timestamp_fallbacks: self.timestamp_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of file sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches_received: u64,
    pub groups_written: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
    pub records_skipped: u64,
    pub timestamp_fallbacks: u64,
}

/// Sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    /// Invalid configuration, raised at construction
    #[error("configuration error: {0}")]
    Config(String),

    /// Directory creation, open or append failed for one file
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Records could not be encoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// One or more handles failed to close (the rest were still closed)
    #[error("failed to close {failed} file(s), first {}: {source}", .path.display())]
    Close {
        failed: usize,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `send` called after `close`
    #[error("sink closed")]
    Closed,
}

impl SinkError {
    /// Create an I/O error bound to a path
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<logspool_config::ConfigError> for SinkError {
    fn from(err: logspool_config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod common_test;
