//! logspool - append newline-delimited JSON to rotating, partitioned files
//!
//! # Usage
//!
//! ```bash
//! # Settings from a file
//! app | logspool --config configs/logspool.toml
//!
//! # Or straight from flags
//! app | logspool --path 'logs/%Y%m%d-%H.log' --timestamp-key timestamp --partitions 4
//! ```
//!
//! Each stdin line must be one JSON object. Other lines are skipped with a
//! warning.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use logspool_config::{Config, LogConfig, LogFormat};
use logspool_sinks::{Batch, FileSink, Record};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Append newline-delimited JSON records to rotating, partitioned files
#[derive(Parser, Debug)]
#[command(name = "logspool")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path template, overrides `sink.path`
    #[arg(short, long)]
    path: Option<String>,

    /// Record field holding the event time, overrides `sink.timestamp_key`
    #[arg(long)]
    timestamp_key: Option<String>,

    /// Number of partition directories, overrides `sink.partition_count`
    #[arg(long)]
    partitions: Option<usize>,

    /// Log level (trace, debug, info, warn, error), overrides `log.level`
    #[arg(short, long)]
    log_level: Option<String>,

    /// Records per batch handed to the sink
    #[arg(short, long, default_value_t = 500)]
    batch_size: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.log.level.as_str().to_string());
    init_logging(&config.log, &level)?;

    let sink = Arc::new(FileSink::new(config.sink)?);
    let (tx, rx) = mpsc::channel::<Arc<Batch>>(16);
    let sink_handle = tokio::spawn(Arc::clone(&sink).run(rx));

    let batch_size = cli.batch_size.max(1);
    let reader = tokio::task::spawn_blocking(move || read_stdin(&tx, batch_size));

    let lines = reader.await.context("stdin reader panicked")??;
    let metrics = sink_handle.await.context("sink task panicked")?;

    tracing::debug!(
        lines,
        records = metrics.records_written,
        bytes = metrics.bytes_written,
        "input drained"
    );

    if metrics.write_errors > 0 {
        bail!("{} group write(s) failed", metrics.write_errors);
    }
    Ok(())
}

/// File settings first, then flag overrides, then validation
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(path) = &cli.path {
        config.sink.path = path.clone();
    }
    if let Some(key) = &cli.timestamp_key {
        config.sink.timestamp_key = Some(key.clone());
    }
    if let Some(partitions) = cli.partitions {
        config.sink.partition_count = partitions;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Read stdin until EOF, forwarding batches; returns the line count
fn read_stdin(tx: &mpsc::Sender<Arc<Batch>>, batch_size: usize) -> Result<u64> {
    let stdin = std::io::stdin();
    let mut batch: Batch = Vec::with_capacity(batch_size);
    let mut line_no = 0u64;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        line_no += 1;

        if line.trim().is_empty() {
            continue;
        }
        match parse_record(&line) {
            Some(record) => batch.push(record),
            None => {
                tracing::warn!(line = line_no, "skipping line that is not a JSON object");
                continue;
            }
        }

        if batch.len() >= batch_size {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            if tx.blocking_send(Arc::new(full)).is_err() {
                bail!("file sink stopped early");
            }
        }
    }

    if !batch.is_empty() && tx.blocking_send(Arc::new(batch)).is_err() {
        bail!("file sink stopped early");
    }
    Ok(line_no)
}

fn parse_record(line: &str) -> Option<Record> {
    match serde_json::from_str(line) {
        Ok(Value::Object(record)) => Some(record),
        _ => None,
    }
}

/// Initialize the tracing subscriber for logging (stderr, stdout stays free)
fn init_logging(log: &LogConfig, level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match log.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init(),
    }

    Ok(())
}
