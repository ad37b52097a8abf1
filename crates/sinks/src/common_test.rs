//! Tests for common sink types

use std::io;

use crate::{FileSinkMetrics, SinkError};

#[test]
fn test_metrics_new() {
    let snapshot = FileSinkMetrics::new().snapshot();

    assert_eq!(snapshot.batches_received, 0);
    assert_eq!(snapshot.groups_written, 0);
    assert_eq!(snapshot.records_written, 0);
    assert_eq!(snapshot.bytes_written, 0);
    assert_eq!(snapshot.write_errors, 0);
    assert_eq!(snapshot.records_skipped, 0);
    assert_eq!(snapshot.timestamp_fallbacks, 0);
}

#[test]
fn test_metrics_record_group() {
    let metrics = FileSinkMetrics::new();

    metrics.record_group(3, 40);
    metrics.record_group(1, 12);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.groups_written, 2);
    assert_eq!(snapshot.records_written, 4);
    assert_eq!(snapshot.bytes_written, 52);
}

#[test]
fn test_metrics_recoverable_counters() {
    let metrics = FileSinkMetrics::new();

    metrics.record_received();
    metrics.record_skipped(2);
    metrics.record_timestamp_fallback();
    metrics.record_error();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.batches_received, 1);
    assert_eq!(snapshot.records_skipped, 2);
    assert_eq!(snapshot.timestamp_fallbacks, 1);
    assert_eq!(snapshot.write_errors, 1);
}

#[test]
fn test_error_display() {
    let err = SinkError::Config("path is empty".into());
    assert_eq!(err.to_string(), "configuration error: path is empty");

    let err = SinkError::io(
        "/tmp/x/a.log",
        io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    );
    assert!(err.to_string().contains("/tmp/x/a.log"));
    assert!(err.to_string().contains("denied"));

    assert_eq!(SinkError::Closed.to_string(), "sink closed");
}

#[test]
fn test_error_from_config_error() {
    let err: SinkError = logspool_config::ConfigError::missing_field("sink", "file", "path").into();
    assert!(matches!(err, SinkError::Config(msg) if msg.contains("path")));
}
