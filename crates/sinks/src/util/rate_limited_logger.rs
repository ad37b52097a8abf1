//! Rate-limited logging utility
//!
//! Prevents log spam when many records in a burst hit the same recoverable
//! problem (unparsable timestamps, missing raw fields, a full disk). Logs at
//! most once per interval and reports how many occurrences were suppressed.
//!
//! # Example
//!
//! ```ignore
//! use logspool_sinks::util::RateLimitedLogger;
//! use std::time::Duration;
//!
//! let logger = RateLimitedLogger::new(Duration::from_secs(10));
//!
//! // Only logs once per 10 seconds, even if called frequently
//! for _ in 0..1000 {
//!     logger.warn("timestamp unparsable, using now", &err);
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval for rate-limited logging
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Rate-limited logger that prevents log spam
///
/// Thread-safe: uses atomic counters and a mutex for the last log time.
pub struct RateLimitedLogger {
    /// Minimum interval between log messages
    min_interval: Duration,

    /// Last time we logged
    last_log_time: Mutex<Option<Instant>>,

    /// Occurrences since last log
    pending: AtomicU64,

    /// Total occurrences ever recorded
    total: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a new rate-limited logger with the specified interval
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_log_time: Mutex::new(None),
            pending: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Record a recoverable problem and log a warning if enough time has passed
    ///
    /// Returns true if the warning was logged, false if it was suppressed.
    pub fn warn(&self, message: &str, error: &dyn std::fmt::Display) -> bool {
        let Some((suppressed, total)) = self.admit() else {
            return false;
        };
        tracing::warn!(
            context = %message,
            error = %error,
            suppressed_count = suppressed,
            total = total,
            "recoverable record error"
        );
        true
    }

    /// Record a failure and log an error if enough time has passed
    pub fn error(&self, message: &str, error: &dyn std::fmt::Display) -> bool {
        let Some((suppressed, total)) = self.admit() else {
            return false;
        };
        tracing::error!(
            context = %message,
            error = %error,
            suppressed_count = suppressed,
            total = total,
            "error"
        );
        true
    }

    /// Count one occurrence; returns `(suppressed, total)` when it should be logged
    fn admit(&self) -> Option<(u64, u64)> {
        self.pending.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        {
            let mut last_time = self.last_log_time.lock();
            let now = Instant::now();

            match *last_time {
                Some(last) if now.duration_since(last) < self.min_interval => return None,
                _ => *last_time = Some(now),
            }
        }

        let count = self.pending.swap(0, Ordering::Relaxed);
        Some((count.saturating_sub(1), self.total.load(Ordering::Relaxed)))
    }

    /// Occurrences since the last emitted log line
    pub fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Relaxed)
    }

    /// Total occurrences
    pub fn total_count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for RateLimitedLogger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_INTERVAL)
    }
}
