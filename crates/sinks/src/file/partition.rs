//! Content-hash partition assignment
//!
//! A record's partition is `xxh3(serialized record) % partition_count`, so
//! the same content always lands in the same partition for a given count.
//! The hash covers field order as stored in the record.

use xxhash_rust::xxh3::Xxh3;

use crate::Record;

/// Pick the partition for `record` in `0..partition_count`
///
/// Returns 0 when `partition_count` is 0 or 1.
pub fn assign(record: &Record, partition_count: usize) -> usize {
    if partition_count <= 1 {
        return 0;
    }
    (record_hash(record) % partition_count as u64) as usize
}

/// Stable hash over a record's field names and JSON-encoded values
pub fn record_hash(record: &Record) -> u64 {
    let mut hasher = Xxh3::new();
    for (key, value) in record {
        hasher.update(key.as_bytes());
        hasher.update(b"\x00");
        hasher.update(value.to_string().as_bytes());
        hasher.update(b"\x1e");
    }
    hasher.digest()
}
