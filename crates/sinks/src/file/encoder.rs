//! Group encoding
//!
//! Turns the records bound for one file into the bytes appended to it.
//!
//! - **Structured**: one JSON array holding every record of the group,
//!   followed by `\n`. One line per write, not per record.
//! - **Raw**: the raw field of each record followed by `\n`. Strings are
//!   written verbatim; other values are written as their JSON text. Records
//!   without the field are skipped.

use serde_json::Value;

use crate::{Record, SinkError};

/// Output encoding for a file sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// JSON array per group write
    Structured,
    /// Verbatim `field` value per record
    Raw { field: String },
}

/// Bytes for one group, with what went into them
#[derive(Debug, Default)]
pub struct Encoded {
    pub bytes: Vec<u8>,
    /// Records represented in `bytes`
    pub records: usize,
    /// Records dropped (raw mode, field missing)
    pub skipped: usize,
}

impl Encoded {
    /// Whether there is nothing to append
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Encoding {
    /// Build from sink configuration
    pub fn from_config(config: &logspool_config::FileSinkConfig) -> Self {
        if config.write_raw {
            Self::Raw {
                field: config.raw_field.clone(),
            }
        } else {
            Self::Structured
        }
    }

    /// Encode records in order
    pub fn encode(&self, records: &[&Record]) -> Result<Encoded, SinkError> {
        match self {
            Self::Structured => encode_structured(records),
            Self::Raw { field } => Ok(encode_raw(records, field)),
        }
    }
}

fn encode_structured(records: &[&Record]) -> Result<Encoded, SinkError> {
    if records.is_empty() {
        return Ok(Encoded::default());
    }

    let mut bytes = Vec::with_capacity(records.len() * 64);
    serde_json::to_writer(&mut bytes, records)
        .map_err(|e| SinkError::Serialization(e.to_string()))?;
    bytes.push(b'\n');

    Ok(Encoded {
        bytes,
        records: records.len(),
        skipped: 0,
    })
}

fn encode_raw(records: &[&Record], field: &str) -> Encoded {
    let mut encoded = Encoded::default();

    for record in records {
        match record.get(field) {
            Some(Value::String(s)) => encoded.bytes.extend_from_slice(s.as_bytes()),
            Some(other) => encoded.bytes.extend_from_slice(other.to_string().as_bytes()),
            None => {
                encoded.skipped += 1;
                continue;
            }
        }
        encoded.bytes.push(b'\n');
        encoded.records += 1;
    }

    encoded
}
