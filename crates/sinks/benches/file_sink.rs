//! File sink benchmark suite
//!
//! Run with: `cargo bench -p logspool-sinks --bench file_sink`
//!
//! # What we measure
//!
//! - Group encoding (structured JSON array vs raw field lines)
//! - Path grouping with time templates and partitions
//! - Full sink throughput (with actual disk I/O)
//! - Channel-driven `run` loop end to end

use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use logspool_config::FileSinkConfig;
use logspool_sinks::{Batch, Encoding, FileSink, Record};
use serde_json::json;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

/// (name, records per batch, payload bytes per record)
const SCENARIOS: &[(&str, usize, usize)] = &[
    ("typical", 100, 200),
    ("high_volume", 500, 200),
    ("large_records", 100, 1000),
];

/// Records spread over three days so time templates fan out
fn create_batch(records: usize, payload: usize) -> Batch {
    let message = "x".repeat(payload);
    (0..records)
        .map(|i| {
            let value = json!({
                "id": i,
                "timestamp": format!("2024-01-{:02}T12:00:00Z", 1 + i % 3),
                "raw": message,
            });
            match value {
                serde_json::Value::Object(map) => map,
                _ => Record::new(),
            }
        })
        .collect()
}

// =============================================================================
// Encoding Benchmarks
// =============================================================================

fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("sink_encoding");
    let raw = Encoding::Raw { field: "raw".into() };

    for &(name, records, payload) in SCENARIOS {
        let batch = create_batch(records, payload);
        let refs: Vec<&Record> = batch.iter().collect();

        group.throughput(Throughput::Elements(records as u64));
        group.bench_with_input(BenchmarkId::new("structured", name), &refs, |b, refs| {
            b.iter(|| black_box(Encoding::Structured.encode(refs).ok()));
        });
        group.bench_with_input(BenchmarkId::new("raw", name), &refs, |b, refs| {
            b.iter(|| black_box(raw.encode(refs).ok()));
        });
    }

    group.finish();
}

// =============================================================================
// Grouping Benchmarks
// =============================================================================

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("sink_grouping");
    let temp_dir = TempDir::new().unwrap();
    let batch = create_batch(500, 200);

    for partitions in [1, 4, 16] {
        let config = FileSinkConfig::new("%Y/%m/%d/events.log")
            .with_root(temp_dir.path())
            .with_timestamp_key("timestamp")
            .with_partitions(partitions);
        let sink = FileSink::new(config).unwrap();

        group.throughput(Throughput::Elements(batch.len() as u64));
        group.bench_function(BenchmarkId::new("partitions", partitions), |b| {
            b.iter(|| black_box(sink.group(&batch).len()));
        });
    }

    group.finish();
}

// =============================================================================
// Full Sink Benchmarks
// =============================================================================

/// Direct `send` calls with disk I/O
fn bench_send(c: &mut Criterion) {
    let mut group = c.benchmark_group("sink_send");
    group.measurement_time(Duration::from_secs(10));

    for &(name, records, payload) in SCENARIOS {
        let batch = create_batch(records, payload);

        group.throughput(Throughput::Elements(records as u64));
        group.bench_function(BenchmarkId::new("structured", name), |b| {
            let temp_dir = TempDir::new().unwrap();
            let config = FileSinkConfig::new("%Y%m%d.log")
                .with_root(temp_dir.path())
                .with_timestamp_key("timestamp");
            let sink = FileSink::new(config).unwrap();

            b.iter(|| sink.send(&batch).unwrap());
            sink.close().unwrap();
        });
    }

    group.finish();
}

/// End-to-end throughput through the channel-driven run loop
fn bench_run(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("sink_run");

    group.sample_size(10);
    group.measurement_time(Duration::from_secs(15));

    let num_batches = 200;

    for &(name, records, payload) in SCENARIOS {
        group.throughput(Throughput::Elements((num_batches * records) as u64));
        group.bench_function(BenchmarkId::new("records", name), |b| {
            b.iter_custom(|iters| {
                let mut total_duration = Duration::ZERO;

                for _ in 0..iters {
                    let temp_dir = TempDir::new().unwrap();
                    let (tx, rx) = mpsc::channel(1000);

                    let config = FileSinkConfig::new("%Y%m%d.log")
                        .with_root(temp_dir.path())
                        .with_timestamp_key("timestamp")
                        .with_partitions(4);
                    let sink = Arc::new(FileSink::new(config).unwrap());

                    let batches: Vec<Arc<Batch>> = (0..num_batches)
                        .map(|_| Arc::new(create_batch(records, payload)))
                        .collect();

                    let start = Instant::now();

                    let sink_handle = rt.spawn(sink.run(rx));

                    rt.block_on(async {
                        for batch in batches {
                            tx.send(batch).await.unwrap();
                        }
                        drop(tx);
                    });

                    let _metrics = rt.block_on(sink_handle).unwrap();
                    total_duration += start.elapsed();
                }

                total_duration
            });
        });
    }

    group.finish();
}

// =============================================================================
// Criterion Setup
// =============================================================================

criterion_group!(benches, bench_encoding, bench_grouping, bench_send, bench_run);

criterion_main!(benches);
