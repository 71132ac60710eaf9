//! Caller-side ingestion policy.
//!
//! [`Aggregator::observe`] fails a record atomically and hands the decision
//! back to the caller. This module packages the usual decisions:
//!
//! - [`IngestMode::FailFast`] -- stop at the first bad record
//! - [`IngestMode::SkipInvalid`] -- drop bad records silently
//! - [`IngestMode::LogAndContinue`] -- log a warning, keep the failure in a
//!   [`RejectCollector`], and continue
//!
//! # Example
//!
//! ```
//! use crosstally::{Aggregator, Metric};
//! use crosstally::ingest::{IngestMode, RejectCollector};
//! use serde_json::json;
//!
//! # fn main() -> crosstally::Result<()> {
//! let mut agg = Aggregator::with_all_combinations(vec![
//!     Metric::field("direction", "direction"),
//!     Metric::field("session", "session"),
//! ])?;
//!
//! let records = vec![
//!     json!({"direction": "IN", "session": "s1"}),
//!     json!({"direction": "OUT"}),
//!     json!({"direction": "IN", "session": "s2"}),
//! ];
//!
//! let mut rejects = RejectCollector::new();
//! let summary = agg.observe_all(&records, IngestMode::LogAndContinue, Some(&mut rejects))?;
//! assert_eq!(summary.observed, 2);
//! assert_eq!(summary.rejected, 1);
//! assert_eq!(rejects.errors()[0].index, 1);
//! # Ok(())
//! # }
//! ```

mod single_writer;

pub use single_writer::{RecordSender, SingleWriter, SingleWriterConfig, WriterError, WriterOutcome};

use crate::aggregator::Aggregator;
use crate::error::{ExtractionError, Result, TallyError};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// What to do with a record whose extraction fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Return the first extraction error to the caller.
    #[default]
    FailFast,
    /// Drop failing records without a trace.
    SkipInvalid,
    /// Warn, record the failure in a [`RejectCollector`], and continue.
    LogAndContinue,
}

/// Outcome counters of an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    /// Records counted.
    pub observed: u64,
    /// Records dropped by the ingest mode.
    pub rejected: u64,
}

/// One dropped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRecord {
    /// Zero-based position of the record in its stream.
    pub index: u64,
    /// Why it was dropped.
    pub error: ExtractionError,
}

/// Accumulates rejected records for reporting after a run.
///
/// A collector built with [`bounded`](Self::bounded) keeps at most that many
/// records; later ones are only counted in [`dropped`](Self::dropped).
#[derive(Debug, Clone, Default)]
pub struct RejectCollector {
    rejects: Vec<RejectedRecord>,
    limit: Option<usize>,
    dropped: u64,
}

impl RejectCollector {
    /// Unbounded collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector that stores at most `max` rejects.
    #[must_use]
    pub fn bounded(max: usize) -> Self {
        Self {
            limit: Some(max),
            ..Self::default()
        }
    }

    pub fn add(&mut self, index: u64, error: ExtractionError) {
        if self.limit.is_some_and(|max| self.rejects.len() >= max) {
            self.dropped += 1;
            return;
        }
        self.rejects.push(RejectedRecord { index, error });
    }

    /// Number of stored rejects.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.rejects.len()
    }

    /// Rejects that arrived after the limit was reached.
    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    #[must_use]
    pub fn errors(&self) -> &[RejectedRecord] {
        &self.rejects
    }

    pub fn clear(&mut self) {
        self.rejects.clear();
        self.dropped = 0;
    }

    /// Export rejects as pretty JSON.
    ///
    /// # Errors
    /// Propagates serialization failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.rejects)
    }

    /// Write rejects to a JSON file.
    ///
    /// # Errors
    /// Fails if serialization or the write fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        use anyhow::Context;
        let path = path.as_ref();
        let json = self.to_json().context("serialize rejected records")?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))
    }
}

impl fmt::Display for RejectCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RejectCollector({} rejects", self.error_count())?;
        if self.dropped > 0 {
            write!(f, ", {} dropped", self.dropped)?;
        }
        f.write_str(")")
    }
}

impl<R: Serialize> Aggregator<R> {
    /// Observe every record from `records`, applying `mode` to failures.
    ///
    /// `collector` receives rejects under [`IngestMode::LogAndContinue`]; it
    /// is ignored by the other modes.
    ///
    /// # Errors
    /// Under [`IngestMode::FailFast`], the first [`ExtractionError`]. Records
    /// before it stay counted.
    pub fn observe_all<I>(
        &mut self,
        records: I,
        mode: IngestMode,
        mut collector: Option<&mut RejectCollector>,
    ) -> Result<IngestSummary>
    where
        I: IntoIterator,
        I::Item: Borrow<R>,
    {
        let mut summary = IngestSummary::default();
        for (index, record) in (0u64..).zip(records) {
            self.ingest_one(
                index,
                record.borrow(),
                mode,
                collector.as_deref_mut(),
                &mut summary,
            )?;
        }
        debug!(
            observed = summary.observed,
            rejected = summary.rejected,
            "ingest finished"
        );
        Ok(summary)
    }

    pub(crate) fn ingest_one(
        &mut self,
        index: u64,
        record: &R,
        mode: IngestMode,
        collector: Option<&mut RejectCollector>,
        summary: &mut IngestSummary,
    ) -> Result<()> {
        match self.observe(record) {
            Ok(()) => {
                summary.observed += 1;
                Ok(())
            }
            Err(TallyError::Extraction(e)) => match mode {
                IngestMode::FailFast => Err(e.into()),
                IngestMode::SkipInvalid => {
                    summary.rejected += 1;
                    Ok(())
                }
                IngestMode::LogAndContinue => {
                    warn!(index, metric = %e.metric, reason = %e.reason, "skipping record");
                    summary.rejected += 1;
                    if let Some(c) = collector {
                        c.add(index, e);
                    }
                    Ok(())
                }
            },
            Err(other) => Err(other),
        }
    }
}
