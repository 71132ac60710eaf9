//! Multi-producer ingestion with one owning writer thread.
//!
//! The aggregator is moved into a worker thread that drains a bounded
//! channel. Producers clone a [`RecordSender`] and push records; queries go
//! through the same channel, so they are serialized with `observe` and never
//! see a half-applied record.
//!
//! ```
//! use crosstally::{Aggregator, Metric};
//! use crosstally::ingest::{SingleWriter, SingleWriterConfig};
//! use serde_json::json;
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let agg = Aggregator::with_all_combinations(vec![Metric::field("direction", "direction")])?;
//! let writer = SingleWriter::spawn(agg, SingleWriterConfig::default());
//!
//! let producers: Vec<_> = (0..4)
//!     .map(|_| {
//!         let tx = writer.sender();
//!         thread::spawn(move || {
//!             for _ in 0..25 {
//!                 tx.send(json!({"direction": "IN"})).unwrap();
//!             }
//!         })
//!     })
//!     .collect();
//! for p in producers {
//!     p.join().unwrap();
//! }
//!
//! let outcome = writer.finish()?;
//! assert_eq!(outcome.aggregator.observed(), 100);
//! # Ok(())
//! # }
//! ```

use super::{IngestMode, IngestSummary, RejectCollector};
use crate::aggregator::Aggregator;
use crate::error::{Result, TallyError};
use crate::table::QueryResult;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Settings for [`SingleWriter::spawn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleWriterConfig {
    /// Bound of the record channel; producers block when it is full.
    pub capacity: usize,
    /// Policy for records whose extraction fails.
    pub mode: IngestMode,
    /// Most rejects kept under [`IngestMode::LogAndContinue`]; later ones are
    /// only counted. `None` keeps every reject.
    pub max_rejects: Option<usize>,
}

impl Default for SingleWriterConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            mode: IngestMode::FailFast,
            max_rejects: Some(1024),
        }
    }
}

/// Failures talking to the writer thread.
#[derive(Error, Debug)]
pub enum WriterError {
    /// The worker stopped (after a fail-fast error, or after `finish`).
    #[error("single-writer channel is closed")]
    Closed,

    /// The worker thread panicked.
    #[error("single-writer thread panicked")]
    Panicked,

    /// The aggregator rejected a query.
    #[error(transparent)]
    Tally(#[from] TallyError),
}

enum Command<R> {
    Record(R),
    Query {
        names: Vec<String>,
        include_total: bool,
        reply: mpsc::Sender<Result<QueryResult>>,
    },
}

/// Cloneable producer handle.
pub struct RecordSender<R> {
    tx: SyncSender<Command<R>>,
}

impl<R> Clone for RecordSender<R> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<R> RecordSender<R> {
    /// Queue one record, blocking while the channel is full.
    ///
    /// # Errors
    /// [`WriterError::Closed`] once the worker has stopped.
    pub fn send(&self, record: R) -> Result<(), WriterError> {
        self.tx
            .send(Command::Record(record))
            .map_err(|_| WriterError::Closed)
    }
}

/// Everything the worker hands back when it stops.
#[derive(Debug)]
pub struct WriterOutcome<R> {
    /// The aggregator with all counts applied so far.
    pub aggregator: Aggregator<R>,
    pub summary: IngestSummary,
    /// Rejects kept under [`IngestMode::LogAndContinue`], up to
    /// [`SingleWriterConfig::max_rejects`].
    pub rejects: RejectCollector,
    /// The error that stopped a [`IngestMode::FailFast`] worker early.
    pub error: Option<TallyError>,
}

/// Owner of the writer thread.
pub struct SingleWriter<R> {
    tx: SyncSender<Command<R>>,
    handle: JoinHandle<WriterOutcome<R>>,
}

impl<R> SingleWriter<R>
where
    R: Serialize + Send + 'static,
{
    /// Move `aggregator` into a new writer thread.
    #[must_use]
    pub fn spawn(aggregator: Aggregator<R>, config: SingleWriterConfig) -> Self {
        let (tx, rx) = mpsc::sync_channel(config.capacity);
        let mode = config.mode;
        let rejects = config
            .max_rejects
            .map_or_else(RejectCollector::new, RejectCollector::bounded);
        let handle = thread::spawn(move || run(aggregator, &rx, mode, rejects));
        info!(capacity = config.capacity, ?mode, "single writer started");
        Self { tx, handle }
    }

    /// A new producer handle.
    #[must_use]
    pub fn sender(&self) -> RecordSender<R> {
        RecordSender {
            tx: self.tx.clone(),
        }
    }

    /// Queue one record from the owning thread.
    ///
    /// # Errors
    /// [`WriterError::Closed`] once the worker has stopped.
    pub fn send(&self, record: R) -> Result<(), WriterError> {
        self.tx
            .send(Command::Record(record))
            .map_err(|_| WriterError::Closed)
    }

    /// Query through the writer thread; sees every record queued before it.
    ///
    /// # Errors
    /// [`WriterError::Closed`] if the worker stopped, or
    /// [`WriterError::Tally`] for an unknown combination.
    pub fn query<S: AsRef<str>>(
        &self,
        names: &[S],
        include_total: bool,
    ) -> Result<QueryResult, WriterError> {
        let (reply, answer) = mpsc::channel();
        self.tx
            .send(Command::Query {
                names: names.iter().map(|s| s.as_ref().to_string()).collect(),
                include_total,
                reply,
            })
            .map_err(|_| WriterError::Closed)?;
        let result = answer.recv().map_err(|_| WriterError::Closed)?;
        Ok(result?)
    }

    /// Close this handle's sender and wait for the worker.
    ///
    /// The worker drains until every [`RecordSender`] is dropped, so drop or
    /// join producers first.
    ///
    /// # Errors
    /// [`WriterError::Panicked`] if the worker thread panicked.
    pub fn finish(self) -> Result<WriterOutcome<R>, WriterError> {
        drop(self.tx);
        self.handle.join().map_err(|_| WriterError::Panicked)
    }
}

fn run<R: Serialize>(
    mut aggregator: Aggregator<R>,
    rx: &Receiver<Command<R>>,
    mode: IngestMode,
    mut rejects: RejectCollector,
) -> WriterOutcome<R> {
    let mut summary = IngestSummary::default();
    let mut error = None;
    let mut index = 0u64;

    for command in rx {
        match command {
            Command::Record(record) => {
                let step =
                    aggregator.ingest_one(index, &record, mode, Some(&mut rejects), &mut summary);
                index += 1;
                if let Err(e) = step {
                    warn!(index = index - 1, error = %e, "single writer stopping");
                    error = Some(e);
                    break;
                }
            }
            Command::Query {
                names,
                include_total,
                reply,
            } => {
                // receiver may have given up; nothing to do then
                let _ = reply.send(aggregator.query(&names, include_total));
            }
        }
    }

    debug!(
        observed = summary.observed,
        rejected = summary.rejected,
        dropped_rejects = rejects.dropped(),
        "single writer drained"
    );
    WriterOutcome {
        aggregator,
        summary,
        rejects,
        error,
    }
}
