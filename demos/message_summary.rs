//! Message-log summary example.
//!
//! Demonstrates:
//! - JSON metrics over two body shapes (`body` as an object or a list)
//! - Ingesting with `LogAndContinue` and exporting rejects
//! - Printing every combination table with a total row
//!
//! Run with: cargo run --example message_summary [messages.jsonl]
//!
//! Without an argument the built-in sample messages are used. Set
//! `RUST_LOG=crosstally=debug` to see the engine's log events.

use anyhow::{Context, Result};
use crosstally::ingest::{IngestMode, RejectCollector};
use crosstally::present::{TextTable, write_report};
use crosstally::testing::{message_metrics, sample_messages};
use crosstally::Aggregator;
use serde_json::Value as JsonValue;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::info;

/// Parse one JSON Lines entry; blank lines yield `None`.
fn parse_line(path: &str, i: usize, line: std::io::Result<String>) -> Result<Option<JsonValue>> {
    let line = line.with_context(|| format!("read {path}"))?;
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&line)
        .map(Some)
        .with_context(|| format!("parse {path} line {}", i + 1))
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mut agg = Aggregator::with_all_combinations(message_metrics())?;
    let mut rejects = RejectCollector::bounded(100);
    let mode = IngestMode::LogAndContinue;

    let summary = match std::env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path).with_context(|| format!("open {path}"))?;
            info!(%path, "streaming messages");
            // records are read, counted and dropped one line at a time
            let mut failure = None;
            let records = BufReader::new(file)
                .lines()
                .enumerate()
                .filter_map(|(i, line)| parse_line(&path, i, line).transpose())
                .map_while(|r| r.map_err(|e| failure = Some(e)).ok());
            let summary = agg.observe_all(records, mode, Some(&mut rejects))?;
            if let Some(e) = failure {
                return Err(e);
            }
            summary
        }
        None => agg.observe_all(sample_messages(), mode, Some(&mut rejects))?,
    };
    info!(
        observed = summary.observed,
        rejected = summary.rejected,
        "ingest complete"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_report(&agg, &TextTable::default(), true, &mut out)?;

    if summary.rejected > 0 {
        let path = std::env::temp_dir().join("message_summary_rejects.json");
        rejects.write_to_file(&path)?;
        println!("\n{rejects} written to {}", path.display());
    }
    Ok(())
}
