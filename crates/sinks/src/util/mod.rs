//! Sink utilities
//!
//! - **rate_limited_logger**: throttled logging for per-record problems

pub mod rate_limited_logger;

pub use rate_limited_logger::{DEFAULT_LOG_INTERVAL, RateLimitedLogger};
