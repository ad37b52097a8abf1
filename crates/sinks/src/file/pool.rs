//! Bounded pool of append-mode file writers
//!
//! Maps resolved file paths to open handles, keeping at most `capacity`
//! handles live. Recency is a monotonically increasing access tick; a
//! `BTreeMap` from tick to path gives the least recently used entry in
//! `O(log n)`.
//!
//! # Concurrency
//!
//! ```text
//! [write(path)] → [pool lock: lookup] → [open] → [pool lock: insert / evict] → [handle lock: append]
//! ```
//!
//! - The pool lock only guards metadata (lookup, insert, eviction order).
//!   A missing file is opened without it and inserted only if no other
//!   thread got there first, so the pool never holds two writers for a path.
//! - Each handle has its own lock held for the duration of one append, so
//!   payloads for the same file never interleave while different files are
//!   written in parallel.
//! - Eviction drops the pool's `Arc`; the file is closed when the last
//!   holder drops it. A writer that fetched a handle before it was evicted
//!   finishes its append on that handle.
//! - `close_all` assumes producers have stopped. Appends through a handle
//!   obtained earlier fail with an error instead of reopening the file.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::SinkError;

/// One open append-mode file
pub struct FileWriter {
    path: PathBuf,

    /// `None` once closed
    file: Mutex<Option<File>>,

    bytes_written: AtomicU64,
}

impl FileWriter {
    /// Create missing parent directories and open `path` for appending
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = File::options().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(Some(file)),
            bytes_written: AtomicU64::new(0),
        })
    }

    /// Path this writer appends to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended through this handle
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Append `bytes` as one uninterrupted payload
    pub fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut guard = self.file.lock();
        let file = guard
            .as_mut()
            .ok_or_else(|| io::Error::other("writer already closed"))?;
        file.write_all(bytes)?;
        self.bytes_written
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Sync and close; later calls are no-ops
    pub fn close(&self) -> io::Result<()> {
        let file = self.file.lock().take();
        match file {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }
}

impl std::fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("path", &self.path)
            .field("bytes_written", &self.bytes_written())
            .finish()
    }
}

/// Counters for pool activity
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Files opened
    pub opens: AtomicU64,
    /// Lookups served by an already open handle
    pub hits: AtomicU64,
    /// Handles dropped for capacity
    pub evictions: AtomicU64,
    /// Handles closed by `close_all`
    pub closes: AtomicU64,
}

impl PoolMetrics {
    /// Get snapshot of pool counters
    pub fn snapshot(&self) -> PoolMetricsSnapshot {
        PoolMetricsSnapshot {
            opens: self.opens.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            closes: self.closes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetricsSnapshot {
    pub opens: u64,
    pub hits: u64,
    pub evictions: u64,
    pub closes: u64,
}

struct PoolEntry {
    writer: Arc<FileWriter>,
    last_used: u64,
}

#[derive(Default)]
struct PoolState {
    writers: HashMap<PathBuf, PoolEntry>,

    /// last_used tick → path, oldest first
    recency: BTreeMap<u64, PathBuf>,

    clock: u64,
}

impl PoolState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn touch(&mut self, path: &Path) -> Option<Arc<FileWriter>> {
        let tick = self.tick();
        let entry = self.writers.get_mut(path)?;
        let previous = std::mem::replace(&mut entry.last_used, tick);
        let writer = Arc::clone(&entry.writer);

        if let Some(key) = self.recency.remove(&previous) {
            self.recency.insert(tick, key);
        }
        Some(writer)
    }

    fn insert(&mut self, writer: Arc<FileWriter>) {
        let tick = self.tick();
        let path = writer.path().to_path_buf();
        self.recency.insert(tick, path.clone());
        self.writers.insert(
            path,
            PoolEntry {
                writer,
                last_used: tick,
            },
        );
    }

    fn evict_lru(&mut self) -> Option<Arc<FileWriter>> {
        let (_, path) = self.recency.pop_first()?;
        self.writers.remove(&path).map(|entry| entry.writer)
    }
}

/// LRU-bounded map of path → open writer
pub struct WriterPool {
    capacity: usize,
    state: Mutex<PoolState>,
    metrics: PoolMetrics,
}

impl WriterPool {
    /// Create a pool holding at most `capacity` open files (minimum 1)
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(PoolState::default()),
            metrics: PoolMetrics::default(),
        }
    }

    /// Get the writer for `path`, opening it (and evicting the least
    /// recently used writer if over capacity) when not already open
    ///
    /// The file is opened outside the pool lock. If another thread inserted
    /// the same path meanwhile, its writer wins and ours is dropped.
    pub fn get(&self, path: &Path) -> Result<Arc<FileWriter>, SinkError> {
        if let Some(writer) = self.state.lock().touch(path) {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(writer);
        }

        let opened =
            Arc::new(FileWriter::open(path).map_err(|source| SinkError::io(path, source))?);

        let evicted = {
            let mut state = self.state.lock();

            if let Some(writer) = state.touch(path) {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(writer);
            }

            self.metrics.opens.fetch_add(1, Ordering::Relaxed);
            state.insert(Arc::clone(&opened));

            if state.writers.len() > self.capacity {
                state.evict_lru()
            } else {
                None
            }
        };

        tracing::debug!(path = %path.display(), "opened file writer");

        // Dropped outside the pool lock; the OS handle closes once no
        // in-flight append still holds it.
        if let Some(victim) = evicted {
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                path = %victim.path().display(),
                bytes = victim.bytes_written(),
                "evicted least recently used writer"
            );
        }

        Ok(opened)
    }

    /// Append `bytes` to `path`, opening it if needed
    pub fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), SinkError> {
        let writer = self.get(path)?;
        writer
            .append(bytes)
            .map_err(|source| SinkError::io(path, source))
    }

    /// Close every open writer and empty the pool
    ///
    /// Every handle is attempted; the first failure is reported along with
    /// the number of failures. Calling again on an empty pool is a no-op.
    pub fn close_all(&self) -> Result<(), SinkError> {
        let writers: Vec<Arc<FileWriter>> = {
            let mut state = self.state.lock();
            state.recency.clear();
            state.writers.drain().map(|(_, entry)| entry.writer).collect()
        };

        let mut failed = 0usize;
        let mut first: Option<(PathBuf, io::Error)> = None;

        for writer in writers {
            self.metrics.closes.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = writer.close() {
                tracing::error!(path = %writer.path().display(), error = %e, "failed to close file");
                failed += 1;
                if first.is_none() {
                    first = Some((writer.path().to_path_buf(), e));
                }
            }
        }

        match first {
            Some((path, source)) => Err(SinkError::Close {
                failed,
                path,
                source,
            }),
            None => Ok(()),
        }
    }

    /// Configured maximum number of open writers
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of open writers
    pub fn len(&self) -> usize {
        self.state.lock().writers.len()
    }

    /// Whether no writer is open
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `path` currently has an open writer
    pub fn contains(&self, path: &Path) -> bool {
        self.state.lock().writers.contains_key(path)
    }

    /// Open paths, least recently used first
    pub fn paths_by_recency(&self) -> Vec<PathBuf> {
        self.state.lock().recency.values().cloned().collect()
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }
}

#[cfg(test)]
#[path = "pool_test.rs"]
mod pool_test;
