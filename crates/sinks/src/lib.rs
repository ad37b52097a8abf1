//! logspool - Sinks
//!
//! The output stage of a log pipeline: appends batches of structured records
//! to files whose paths come from a time template and an optional partition
//! index, with a bounded number of files open at once.
//!
//! # Architecture
//!
//! ```text
//! [Batch] → [PathTemplate + partition] → [group by path] → [Encoding]
//!                                                              ↓
//!                                              [WriterPool (LRU, per-file lock)] → [Disk]
//! ```
//!
//! # Example
//!
//! ```ignore
//! use logspool_config::FileSinkConfig;
//! use logspool_sinks::FileSink;
//!
//! let config = FileSinkConfig::new("logs/%Y%m%d.log").with_timestamp_key("timestamp");
//! let sink = FileSink::new(config)?;
//!
//! sink.send(&batch)?;
//! sink.close()?;
//! ```

/// File sink - time-templated, partitioned append-only files
pub mod file;

/// Shared utilities (rate-limited logging)
pub mod util;

/// Common types shared by the sink (records, errors, metrics)
mod common;

pub use common::{Batch, FileSinkMetrics, MetricsSnapshot, Record, SinkError};
pub use file::{
    Encoding, FileSink, FileWriter, PathTemplate, PoolMetricsSnapshot, TimestampParseError,
    WriterPool,
};
