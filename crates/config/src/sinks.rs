//! File sink configuration
//!
//! The file sink appends record batches to files whose names come from a
//! time-format template, optionally fanned out over partition directories.
//!
//! # Example
//!
//! ```toml
//! [sink]
//! path = "logs/%Y%m%d.log"
//! timestamp_key = "timestamp"
//! max_open_files = 16
//! partition_count = 4
//! ```

use serde::Deserialize;
use std::path::PathBuf;

/// Open-file capacity when a timestamp key is configured and no explicit
/// `max_open_files` is given
pub const DEFAULT_DATED_MAX_OPEN_FILES: usize = 10;

/// Open-file capacity when every record resolves against "now"
pub const DEFAULT_STATIC_MAX_OPEN_FILES: usize = 1;

/// Default record field holding the verbatim line in raw mode
pub const DEFAULT_RAW_FIELD: &str = "raw";

/// Configuration for the file sink
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FileSinkConfig {
    /// Path template, e.g. `logs/%Y%m%d-app.log`
    /// Required
    pub path: String,

    /// Base directory joined in front of relative resolved paths
    /// Default: none (paths used as resolved)
    pub root: Option<PathBuf>,

    /// Maximum number of simultaneously open files
    /// Default: 10 with `timestamp_key`, 1 without
    pub max_open_files: Option<usize>,

    /// Record field holding the per-record timestamp
    /// Default: none (always "now")
    pub timestamp_key: Option<String>,

    /// Number of partition directories records are spread over
    /// Default: 1 (no partition directory)
    pub partition_count: usize,

    /// Write `raw_field` verbatim instead of JSON arrays
    /// Default: false
    pub write_raw: bool,

    /// Field holding the raw line when `write_raw` is set
    /// Default: "raw"
    pub raw_field: String,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            root: None,
            max_open_files: None,
            timestamp_key: None,
            partition_count: 1,
            write_raw: false,
            raw_field: DEFAULT_RAW_FIELD.into(),
        }
    }
}

impl FileSinkConfig {
    /// Create a config for the given path template
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Set the base directory for relative paths
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the open-file capacity
    #[must_use]
    pub fn with_max_open_files(mut self, max: usize) -> Self {
        self.max_open_files = Some(max);
        self
    }

    /// Resolve timestamps from the given record field
    #[must_use]
    pub fn with_timestamp_key(mut self, key: impl Into<String>) -> Self {
        self.timestamp_key = Some(key.into());
        self
    }

    /// Spread records over `count` partition directories
    #[must_use]
    pub fn with_partitions(mut self, count: usize) -> Self {
        self.partition_count = count;
        self
    }

    /// Switch to raw mode, emitting `field` verbatim per record
    #[must_use]
    pub fn with_raw(mut self, field: impl Into<String>) -> Self {
        self.write_raw = true;
        self.raw_field = field.into();
        self
    }

    /// Timestamp key, treating an empty string as unset
    pub fn timestamp_key(&self) -> Option<&str> {
        self.timestamp_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Capacity of the writer pool after applying defaults
    pub fn effective_max_open_files(&self) -> usize {
        match self.max_open_files {
            Some(max) => max,
            None if self.timestamp_key().is_some() => DEFAULT_DATED_MAX_OPEN_FILES,
            None => DEFAULT_STATIC_MAX_OPEN_FILES,
        }
    }

    /// Whether records are spread over partition directories
    pub fn is_partitioned(&self) -> bool {
        self.partition_count > 1
    }
}
