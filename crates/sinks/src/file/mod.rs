//! File Sink - rotating, partitioned file output
//!
//! Appends record batches to files whose paths come from a time template,
//! optionally fanned out over partition directories, while keeping a bounded
//! number of files open.
//!
//! # Flow
//!
//! ```text
//! [batch] → [timestamp + partition per record] → [group by resolved path]
//!         → [encode each group] → [WriterPool::write] → [close on shutdown]
//! ```
//!
//! # Output
//!
//! Structured mode writes one JSON array line per group per `send`:
//! ```text
//! [{"abc":123},{"abc":789}]
//! [{"abc":135}]
//! ```
//!
//! Raw mode writes the raw field of every record on its own line.
//!
//! # Directory Structure
//!
//! ```text
//! logs/                      # path = "logs/%Y%m%d.log", partition_count = 2
//! ├── partition0/
//! │   └── 20250115.log
//! └── partition1/
//!     └── 20250115.log
//! ```
//!
//! # Errors
//!
//! `send` attempts every group and returns the first failure; groups already
//! written stay written. Unparsable timestamps fall back to the current time
//! and records missing the raw field are skipped, both without failing.

pub mod encoder;
pub mod partition;
pub mod path;
pub mod pool;
pub mod timestamp;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, FixedOffset};
use logspool_config::FileSinkConfig;
use tokio::sync::mpsc;

use crate::util::RateLimitedLogger;
use crate::{Batch, FileSinkMetrics, MetricsSnapshot, Record, SinkError};

pub use encoder::{Encoded, Encoding};
pub use path::{PARTITION_DIR_PREFIX, PathTemplate};
pub use pool::{FileWriter, PoolMetrics, PoolMetricsSnapshot, WriterPool};
pub use timestamp::{TimestampParseError, parse_timestamp};

/// Rotating, partitioned file sink
pub struct FileSink {
    /// Sink name for logging
    name: String,

    template: PathTemplate,

    /// Joined in front of relative resolved paths
    root: Option<PathBuf>,

    timestamp_key: Option<String>,

    /// Partition count when records are spread over partition directories
    partitions: Option<usize>,

    encoding: Encoding,

    pool: WriterPool,

    metrics: Arc<FileSinkMetrics>,

    /// Throttles per-record warnings
    record_logger: RateLimitedLogger,

    /// Throttles write failures (a full disk fails every group)
    write_logger: RateLimitedLogger,

    closed: AtomicBool,
}

impl FileSink {
    /// Create a new file sink
    pub fn new(config: FileSinkConfig) -> Result<Self, SinkError> {
        Self::with_name(config, "file")
    }

    /// Create a new file sink with a custom name
    pub fn with_name(config: FileSinkConfig, name: impl Into<String>) -> Result<Self, SinkError> {
        logspool_config::validate_file_sink(&config)?;

        let name = name.into();
        let template = PathTemplate::parse(&config.path);
        if config.timestamp_key().is_some() && !template.is_time_dependent() {
            tracing::warn!(
                sink = %name,
                template = %template.as_str(),
                "timestamp_key is set but the path has no time placeholder"
            );
        }

        Ok(Self {
            name,
            template,
            root: config.root.clone(),
            timestamp_key: config.timestamp_key().map(str::to_string),
            partitions: config.is_partitioned().then_some(config.partition_count),
            encoding: Encoding::from_config(&config),
            pool: WriterPool::new(config.effective_max_open_files()),
            metrics: Arc::new(FileSinkMetrics::new()),
            record_logger: RateLimitedLogger::default(),
            write_logger: RateLimitedLogger::default(),
            closed: AtomicBool::new(false),
        })
    }

    /// Get the sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &FileSinkMetrics {
        &self.metrics
    }

    /// Get the writer pool
    pub fn pool(&self) -> &WriterPool {
        &self.pool
    }

    /// Resolve the target file for one record
    ///
    /// `now` is used when no timestamp key is configured, the record lacks
    /// the field, or the field cannot be parsed.
    pub fn resolve_path(&self, record: &Record, now: &DateTime<FixedOffset>) -> PathBuf {
        let timestamp = self.record_timestamp(record, now);
        let partition = self.partitions.map(|count| partition::assign(record, count));

        let resolved = self.template.resolve(&timestamp, partition);
        match &self.root {
            Some(root) => root.join(resolved),
            None => resolved,
        }
    }

    fn record_timestamp(&self, record: &Record, now: &DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        let Some(value) = self
            .timestamp_key
            .as_deref()
            .and_then(|key| record.get(key))
        else {
            return *now;
        };

        match parse_timestamp(value) {
            Ok(ts) => ts,
            Err(e) => {
                self.metrics.record_timestamp_fallback();
                self.record_logger
                    .warn(&format!("sink {}: using current time", self.name), &e);
                *now
            }
        }
    }

    /// Group a batch by resolved path, keeping record order within each
    /// group and groups in order of first appearance
    pub fn group<'a>(&self, batch: &'a [Record]) -> Vec<(PathBuf, Vec<&'a Record>)> {
        let now = timestamp::now();
        let mut groups: Vec<(PathBuf, Vec<&'a Record>)> = Vec::new();
        let mut index: HashMap<PathBuf, usize> = HashMap::new();

        for record in batch {
            let path = self.resolve_path(record, &now);
            match index.get(&path) {
                Some(&i) => groups[i].1.push(record),
                None => {
                    index.insert(path.clone(), groups.len());
                    groups.push((path, vec![record]));
                }
            }
        }

        groups
    }

    /// Append a batch
    ///
    /// Every group is attempted; the first failure is returned. Safe to call
    /// from several threads at once.
    pub fn send(&self, batch: &[Record]) -> Result<(), SinkError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SinkError::Closed);
        }
        self.metrics.record_received();

        let mut first_error = None;

        for (path, records) in self.group(batch) {
            if let Err(e) = self.write_group(&path, &records) {
                self.metrics.record_error();
                self.write_logger.error(
                    &format!("sink {}: {} record(s) not written", self.name, records.len()),
                    &e,
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn write_group(&self, path: &Path, records: &[&Record]) -> Result<(), SinkError> {
        let encoded = self.encoding.encode(records)?;

        if encoded.skipped > 0 {
            self.metrics.record_skipped(encoded.skipped as u64);
            if let Encoding::Raw { field } = &self.encoding {
                let reason = format!("{} record(s) missing field '{field}'", encoded.skipped);
                self.record_logger
                    .warn(&format!("sink {}: skipped raw records", self.name), &reason);
            }
        }

        if encoded.is_empty() {
            return Ok(());
        }

        self.pool.write(path, &encoded.bytes)?;
        self.metrics
            .record_group(encoded.records as u64, encoded.bytes.len() as u64);
        Ok(())
    }

    /// Close all files
    ///
    /// Call once producers have stopped. Every file is closed even if some
    /// fail; the first failure is returned. Later calls return `Ok`.
    pub fn close(&self) -> Result<(), SinkError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let open = self.pool.len();
        let result = self.pool.close_all();

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            files_closed = open,
            batches_received = snapshot.batches_received,
            records = snapshot.records_written,
            bytes = snapshot.bytes_written,
            errors = snapshot.write_errors,
            skipped = snapshot.records_skipped,
            "file sink closed"
        );

        result
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Drain a channel of batches until it closes, then close the sink
    ///
    /// Writes run on the blocking thread pool; failures are logged and
    /// counted, never fatal to the loop.
    pub async fn run(self: Arc<Self>, mut receiver: mpsc::Receiver<Arc<Batch>>) -> MetricsSnapshot {
        tracing::info!(
            sink = %self.name,
            template = %self.template.as_str(),
            max_open_files = self.pool.capacity(),
            partitions = self.partitions.unwrap_or(1),
            "file sink starting"
        );

        while let Some(batch) = receiver.recv().await {
            let sink = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || sink.send(&batch)).await {
                Ok(Ok(())) => {}
                // already logged per group
                Ok(Err(_)) => {}
                Err(e) => {
                    tracing::error!(sink = %self.name, error = %e, "write task failed");
                }
            }
        }

        let sink = Arc::clone(&self);
        match tokio::task::spawn_blocking(move || sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(sink = %self.name, error = %e, "close failed"),
            Err(e) => tracing::error!(sink = %self.name, error = %e, "close task failed"),
        }

        self.metrics.snapshot()
    }
}
