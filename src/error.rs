//! Error taxonomy for the tally engine.
//!
//! - [`ConfigurationError`] -- the metric list or a combination is malformed.
//! - [`ExtractionError`] -- a metric could not produce a value for a record.
//! - [`QueryError`] -- a query named a combination that was never registered.
//!
//! [`TallyError`] wraps all three so `observe`/`query` callers can use `?`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = TallyError> = std::result::Result<T, E>;

/// Top-level error returned by aggregator operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TallyError {
    /// Invalid metric list or combination.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A metric failed to extract a value from a record.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// A query referenced an untracked combination.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

impl TallyError {
    /// The extraction failure, if this is one.
    #[must_use]
    pub fn as_extraction(&self) -> Option<&ExtractionError> {
        match self {
            Self::Extraction(e) => Some(e),
            _ => None,
        }
    }
}

/// Problems with the metric list or with a requested combination.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// No metrics were supplied.
    #[error("metric list is empty")]
    EmptyMetrics,

    /// Two metrics share a name.
    #[error("duplicate metric name '{0}'")]
    DuplicateMetric(String),

    /// More metrics than the power set can reasonably track.
    #[error("{count} metrics would produce too many combinations (max {max} metrics)")]
    TooManyMetrics { count: usize, max: usize },

    /// A combination names a metric that is not registered.
    #[error("unknown metric '{name}' in combination {combination:?}")]
    UnknownMetric {
        name: String,
        combination: Vec<String>,
    },

    /// An explicit combination list was empty.
    #[error("combination list is empty")]
    NoCombinations,

    /// A combination with no metrics.
    #[error("combination must name at least one metric")]
    EmptyCombination,

    /// A combination lists the same metric twice.
    #[error("metric '{name}' appears more than once in combination {combination:?}")]
    RepeatedMetric {
        name: String,
        combination: Vec<String>,
    },

    /// Two combinations canonicalize to the same sorted name list.
    #[error("combination {0:?} is registered more than once")]
    DuplicateCombination(Vec<String>),

    /// A combination set was built from a different metric list.
    #[error("combinations were built for metrics {expected:?}, aggregator has {found:?}")]
    MetricMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

/// Why an extractor could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExtractReason {
    /// The field or path the metric reads is absent.
    Missing(String),
    /// The field is present but holds a value the engine cannot count.
    Unsupported(String),
    /// Any other extractor-specific failure.
    Other(String),
}

impl ExtractReason {
    pub fn missing(what: impl Into<String>) -> Self {
        Self::Missing(what.into())
    }

    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::Unsupported(what.into())
    }

    pub fn other(what: impl Into<String>) -> Self {
        Self::Other(what.into())
    }
}

impl fmt::Display for ExtractReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(what) => write!(f, "missing {what}"),
            Self::Unsupported(what) => write!(f, "unsupported value: {what}"),
            Self::Other(what) => write!(f, "{what}"),
        }
    }
}

/// A metric failed on a record; carries enough context for the caller to
/// decide whether to skip, log, or abort.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("metric '{metric}' failed: {reason} (record: {record})")]
pub struct ExtractionError {
    /// Name of the failing metric.
    pub metric: String,
    /// What went wrong.
    pub reason: ExtractReason,
    /// JSON rendering of the offending record.
    pub record: String,
}

/// Query-time failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Every metric is known, but this subset was not tracked.
    #[error("combination {0:?} was not registered with this aggregator")]
    UnknownCombination(Vec<String>),

    /// A point lookup supplied the wrong number of values.
    #[error("combination {combination:?} takes {expected} values, got {found}")]
    ArityMismatch {
        combination: Vec<String>,
        expected: usize,
        found: usize,
    },
}
