//! # crosstally
//!
//! A **streaming multi-dimensional tally engine**. Given a sequence of records
//! and a fixed list of named classification functions ("metrics"), crosstally
//! counts, in one pass and without buffering the input, how many records fall
//! into every distinct value tuple of every non-empty combination of those
//! metrics.
//!
//! ## Key Features
//!
//! - **Single pass, bounded memory** - memory grows with distinct tuples, never with stream length
//! - **Every combination at once** - all 2ⁿ − 1 metric subsets, or an explicit list
//! - **Order-independent results** - rows sorted by count, ties broken by value
//! - **Typed errors** - configuration, extraction and query failures are distinct types
//! - **Atomic extraction** - a record either counts in every table or in none
//! - **Ingest policies** - fail fast, skip, or log-and-collect bad records
//! - **Single-writer ingestion** - many producer threads, one counting thread
//! - **Presenters** - boxed text tables, JSON, and CSV (feature `io-csv`)
//!
//! ## Quick Start
//!
//! ```
//! use crosstally::{Aggregator, Metric, Row};
//! use serde_json::json;
//!
//! # fn main() -> crosstally::Result<()> {
//! let mut agg = Aggregator::with_all_combinations(vec![
//!     Metric::field("direction", "direction"),
//!     Metric::field("session", "session"),
//! ])?;
//!
//! agg.observe(&json!({"direction": "IN", "session": "s1"}))?;
//! agg.observe(&json!({"direction": "OUT", "session": "s1"}))?;
//! agg.observe(&json!({"direction": "IN", "session": "s2"}))?;
//!
//! let rows = agg.query(&["session", "direction"], false)?.rows;
//! assert_eq!(
//!     rows,
//!     vec![
//!         Row::tuple(["IN", "s1"], 1),
//!         Row::tuple(["IN", "s2"], 1),
//!         Row::tuple(["OUT", "s1"], 1),
//!     ]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Metric
//!
//! A [`Metric<R>`] is a name plus a pure function from `&R` to a [`Value`].
//! Build one from any closure with [`Metric::new`] / [`Metric::try_new`]; for
//! `serde_json::Value` records use [`Metric::field`], [`Metric::pointer`] or
//! [`Metric::first_pointer`].
//!
//! ### Combination
//!
//! A [`Combination`] is a subset of metric names in canonical (sorted) order.
//! The [`CombinationSet`] an aggregator tracks is fixed at construction.
//!
//! ### Aggregator
//!
//! [`Aggregator::observe`] extracts each metric once and bumps one
//! [`ValueTuple`] in every [`CountTable`]. [`Aggregator::query`] returns a
//! [`QueryResult`]: rows sorted by count descending, with an optional
//! trailing [`Row::Total`].
//!
//! ## Module Overview
//!
//! - [`value`] - scalar values and the tuple key
//! - [`metric`] - named extraction functions
//! - [`combination`] - canonical combinations and their generation
//! - [`table`] - count tables, rows and query results
//! - [`aggregator`] - the tally engine
//! - [`ingest`] - ingest policies and the single-writer thread
//! - [`present`] - text, JSON and CSV rendering
//! - [`error`] - the error taxonomy
//! - [`testing`] - fixtures and invariant assertions
//!
//! ## Feature Flags
//!
//! - `io-csv` (default) - Enable the CSV presenter

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aggregator;
pub mod combination;
pub mod error;
pub mod ingest;
pub mod metric;
pub mod present;
pub mod table;
pub mod testing;
pub mod value;

// Re-exports
pub use aggregator::Aggregator;
pub use combination::{Combination, CombinationSet, MAX_METRICS};
pub use error::{
    ConfigurationError, ExtractReason, ExtractionError, QueryError, Result, TallyError,
};
pub use ingest::{IngestMode, IngestSummary, RejectCollector, RejectedRecord, SingleWriter};
pub use metric::{Metric, json_scalar};
pub use table::{CountTable, QueryResult, Row};
pub use value::{Value, ValueTuple};
