//! Per-record timestamp extraction
//!
//! Accepted forms:
//! - RFC 3339 strings (`2018-07-08T15:04:05Z`), keeping their offset
//! - `%Y-%m-%d %H:%M:%S` / `%Y-%m-%dT%H:%M:%S` strings, read as local time
//! - integers: Unix seconds, or milliseconds above [`MILLIS_THRESHOLD`]
//! - floats: Unix seconds with fraction

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde_json::Value;
use thiserror::Error;

/// Integers at or above this are treated as Unix milliseconds
pub const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// A timestamp field was present but unusable
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot parse timestamp {value}: {reason}")]
pub struct TimestampParseError {
    /// The offending value, JSON-encoded
    pub value: String,
    /// Why it was rejected
    pub reason: &'static str,
}

impl TimestampParseError {
    fn new(value: &Value, reason: &'static str) -> Self {
        Self {
            value: value.to_string(),
            reason,
        }
    }
}

/// Current time with the local offset
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// Parse a record's timestamp field
pub fn parse_timestamp(value: &Value) -> Result<DateTime<FixedOffset>, TimestampParseError> {
    match value {
        Value::String(s) => parse_str(s).ok_or_else(|| TimestampParseError::new(value, "unrecognized format")),
        Value::Number(n) => {
            let parsed = if let Some(i) = n.as_i64() {
                from_unix_integer(i)
            } else {
                n.as_f64().and_then(from_unix_float)
            };
            parsed.ok_or_else(|| TimestampParseError::new(value, "out of range"))
        }
        _ => Err(TimestampParseError::new(value, "not a string or number")),
    }
}

fn parse_str(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(s, fmt).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|ts| ts.fixed_offset())
    })
}

fn from_unix_integer(value: i64) -> Option<DateTime<FixedOffset>> {
    let utc = if value.unsigned_abs() >= MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(value)?
    } else {
        DateTime::from_timestamp(value, 0)?
    };
    Some(utc.with_timezone(&Local).fixed_offset())
}

fn from_unix_float(value: f64) -> Option<DateTime<FixedOffset>> {
    if !value.is_finite() {
        return None;
    }
    let secs = value.floor();
    let nanos = (((value - secs) * 1e9) as u32).min(999_999_999);
    let utc = DateTime::from_timestamp(secs as i64, nanos)?;
    Some(utc.with_timezone(&Local).fixed_offset())
}
