//! Path template resolution
//!
//! Templates carry strftime-style placeholders that are substituted from a
//! timestamp. Recognised placeholders:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `%Y` | four-digit year |
//! | `%y` | two-digit year |
//! | `%m` | month `01`-`12` |
//! | `%d` | day `01`-`31` |
//! | `%j` | day of year `001`-`366` |
//! | `%H` | hour `00`-`23` |
//! | `%M` | minute `00`-`59` |
//! | `%S` | second `00`-`60` |
//! | `%%` | literal `%` |
//!
//! Anything else, including a trailing `%`, is copied through unchanged.
//! Resolution never fails.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

/// Directory name prefix for partition subdirectories (`partition0`, ...)
pub const PARTITION_DIR_PREFIX: &str = "partition";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Year,
    ShortYear,
    Month,
    Day,
    DayOfYear,
    Hour,
    Minute,
    Second,
}

/// A path template parsed once and rendered per record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Parse a template; unknown placeholders become literal text
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(ch) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }

            let segment = match chars.peek() {
                Some('Y') => Segment::Year,
                Some('y') => Segment::ShortYear,
                Some('m') => Segment::Month,
                Some('d') => Segment::Day,
                Some('j') => Segment::DayOfYear,
                Some('H') => Segment::Hour,
                Some('M') => Segment::Minute,
                Some('S') => Segment::Second,
                Some('%') => {
                    chars.next();
                    literal.push('%');
                    continue;
                }
                // unknown or trailing: keep the '%' and let the next char
                // be read as ordinary text
                _ => {
                    literal.push('%');
                    continue;
                }
            };
            chars.next();

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self {
            source: template.to_string(),
            segments,
        }
    }

    /// The template as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the template contains any time placeholder
    pub fn is_time_dependent(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }

    /// Substitute placeholders from `timestamp`
    pub fn render(&self, timestamp: &DateTime<FixedOffset>) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Year => push_padded(&mut out, timestamp.year(), 4),
                Segment::ShortYear => push_padded(&mut out, timestamp.year().rem_euclid(100), 2),
                Segment::Month => push_padded(&mut out, timestamp.month(), 2),
                Segment::Day => push_padded(&mut out, timestamp.day(), 2),
                Segment::DayOfYear => push_padded(&mut out, timestamp.ordinal(), 3),
                Segment::Hour => push_padded(&mut out, timestamp.hour(), 2),
                Segment::Minute => push_padded(&mut out, timestamp.minute(), 2),
                Segment::Second => push_padded(&mut out, timestamp.second(), 2),
            }
        }
        out
    }

    /// Render and place the result under a partition directory if given
    ///
    /// The partition directory sits between the rendered parent directory and
    /// the file name: `logs/20250115.log` → `logs/partition3/20250115.log`.
    pub fn resolve(&self, timestamp: &DateTime<FixedOffset>, partition: Option<usize>) -> PathBuf {
        let rendered = PathBuf::from(self.render(timestamp));
        match partition {
            Some(index) => with_partition_dir(&rendered, index),
            None => rendered,
        }
    }
}

/// Resolve `template` against `timestamp`, optionally under a partition directory
pub fn resolve(template: &str, timestamp: &DateTime<FixedOffset>, partition: Option<usize>) -> PathBuf {
    PathTemplate::parse(template).resolve(timestamp, partition)
}

/// Append `value` zero-padded to `width` digits
fn push_padded(out: &mut String, value: impl std::fmt::Display, width: usize) {
    out.push_str(&format!("{value:0width$}"));
}

fn with_partition_dir(path: &Path, index: usize) -> PathBuf {
    let dir = format!("{PARTITION_DIR_PREFIX}{index}");
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent.join(dir).join(name),
        _ => path.join(dir),
    }
}

#[cfg(test)]
#[path = "path_test.rs"]
mod path_test;
