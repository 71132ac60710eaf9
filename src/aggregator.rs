//! The streaming tally engine.
//!
//! An [`Aggregator`] owns one [`CountTable`] per tracked combination. Each
//! call to [`observe`](Aggregator::observe) extracts every metric once, then
//! bumps exactly one tuple in every table. Nothing about the record is kept
//! afterwards, so memory grows with the number of distinct tuples, not with
//! the length of the stream.
//!
//! # Example
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
//! for rec in [
//!     json!({"direction": "IN", "session": "s1"}),
//!     json!({"direction": "OUT", "session": "s1"}),
//!     json!({"direction": "IN", "session": "s2"}),
//! ] {
//!     agg.observe(&rec)?;
//! }
//!
//! let by_dir = agg.query(&["direction"], true)?;
//! assert_eq!(
//!     by_dir.rows,
//!     vec![
//!         Row::tuple(["IN"], 2),
//!         Row::tuple(["OUT"], 1),
//!         Row::Total { count: 3 },
//!     ]
//! );
//! # Ok(())
//! # }
//! ```

use crate::combination::{Combination, CombinationSet};
use crate::error::{ConfigurationError, ExtractionError, QueryError, Result};
use crate::metric::Metric;
use crate::table::{CountTable, QueryResult, Row};
use crate::value::Value;
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace};

/// Single-writer tally over records of type `R`.
///
/// Not internally synchronized: only one thread may call
/// [`observe`](Self::observe) at a time. See
/// [`SingleWriter`](crate::ingest::SingleWriter) for multi-producer ingestion.
pub struct Aggregator<R> {
    metrics: Vec<Metric<R>>,
    combinations: CombinationSet,
    tables: Vec<CountTable>,
    observed: u64,
}

impl<R> Aggregator<R> {
    /// Track exactly the combinations in `combinations`.
    ///
    /// # Errors
    /// [`ConfigurationError::MetricMismatch`] if `combinations` was built from
    /// a different metric list.
    pub fn new(metrics: Vec<Metric<R>>, combinations: CombinationSet) -> Result<Self> {
        let found: Vec<&str> = metrics.iter().map(Metric::name).collect();
        if combinations.metric_names() != found.as_slice() {
            return Err(ConfigurationError::MetricMismatch {
                expected: combinations.metric_names().to_vec(),
                found: found.into_iter().map(String::from).collect(),
            }
            .into());
        }
        let tables = vec![CountTable::new(); combinations.len()];
        debug!(
            metrics = metrics.len(),
            combinations = combinations.len(),
            "aggregator ready"
        );
        Ok(Self {
            metrics,
            combinations,
            tables,
            observed: 0,
        })
    }

    /// Track every non-empty subset of `metrics`.
    ///
    /// # Errors
    /// [`ConfigurationError`] for an empty, duplicated, or oversized metric
    /// list.
    pub fn with_all_combinations(metrics: Vec<Metric<R>>) -> Result<Self> {
        let combinations = CombinationSet::generate(&metrics)?;
        Self::new(metrics, combinations)
    }

    /// Track an explicit list of combinations given by metric names.
    ///
    /// # Errors
    /// See [`CombinationSet::from_names`].
    pub fn with_combinations<I, C, S>(metrics: Vec<Metric<R>>, specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let combinations = CombinationSet::from_names(&metrics, specs)?;
        Self::new(metrics, combinations)
    }

    /// Rows for one combination, named in any order.
    ///
    /// Rows are sorted by count descending, ties by value tuple ascending.
    /// With `include_total`, a [`Row::Total`] carrying the sum of all counts
    /// is appended.
    ///
    /// # Errors
    /// [`ConfigurationError::UnknownMetric`] or
    /// [`QueryError::UnknownCombination`] for names this aggregator does not
    /// track.
    pub fn query<S: AsRef<str>>(&self, names: &[S], include_total: bool) -> Result<QueryResult> {
        let slot = self.combinations.slot(names)?;
        Ok(self.query_slot(slot, include_total))
    }

    fn query_slot(&self, slot: usize, include_total: bool) -> QueryResult {
        let table = &self.tables[slot];
        let mut rows = table.sorted_rows();
        if include_total {
            rows.push(Row::Total {
                count: table.total(),
            });
        }
        QueryResult {
            combination: self.combinations.get(slot).map_or_else(Vec::new, |c| c.names().to_vec()),
            rows,
        }
    }

    /// Query every tracked combination, in registration order.
    #[must_use]
    pub fn query_all(&self, include_total: bool) -> Vec<QueryResult> {
        (0..self.tables.len())
            .map(|slot| self.query_slot(slot, include_total))
            .collect()
    }

    /// The raw table for one combination.
    ///
    /// # Errors
    /// Same as [`query`](Self::query).
    pub fn table<S: AsRef<str>>(&self, names: &[S]) -> Result<&CountTable> {
        let slot = self.combinations.slot(names)?;
        Ok(&self.tables[slot])
    }

    /// Count of one value tuple; `values[i]` belongs to `names[i]`, in
    /// whatever order the names are given.
    ///
    /// # Errors
    /// Same as [`query`](Self::query), plus [`QueryError::ArityMismatch`]
    /// when the two slices differ in length.
    pub fn count<S: AsRef<str>>(&self, names: &[S], values: &[Value]) -> Result<u64> {
        let slot = self.combinations.slot(names)?;
        if names.len() != values.len() {
            return Err(QueryError::ArityMismatch {
                combination: names.iter().map(|s| s.as_ref().to_string()).collect(),
                expected: names.len(),
                found: values.len(),
            }
            .into());
        }
        let mut pairs: Vec<(&str, &Value)> = names
            .iter()
            .map(|s| s.as_ref())
            .zip(values.iter())
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        let key: Vec<Value> = pairs.into_iter().map(|(_, v)| v.clone()).collect();
        Ok(self.tables[slot].get(&key))
    }

    /// `(combination, table)` pairs in registration order.
    pub fn tables(&self) -> impl Iterator<Item = (&Combination, &CountTable)> {
        self.combinations.iter().zip(self.tables.iter())
    }

    #[must_use]
    pub fn combinations(&self) -> &CombinationSet {
        &self.combinations
    }

    /// Metric names in registration order.
    #[must_use]
    pub fn metric_names(&self) -> &[String] {
        self.combinations.metric_names()
    }

    /// Number of records successfully observed.
    #[must_use]
    pub const fn observed(&self) -> u64 {
        self.observed
    }
}

impl<R: Serialize> Aggregator<R> {
    /// Count one record.
    ///
    /// Every metric is extracted once. If any extraction fails, nothing is
    /// counted for this record and the error names the metric and carries the
    /// record rendered as JSON.
    ///
    /// # Errors
    /// [`ExtractionError`] (wrapped in [`TallyError`](crate::TallyError)).
    pub fn observe(&mut self, record: &R) -> Result<()> {
        let mut values = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            match metric.extract(record) {
                Ok(v) => values.push(v),
                Err(reason) => {
                    return Err(ExtractionError {
                        metric: metric.name().to_string(),
                        reason,
                        record: render_record(record),
                    }
                    .into());
                }
            }
        }

        for (combination, table) in self.combinations.iter().zip(self.tables.iter_mut()) {
            let key = combination
                .indices()
                .iter()
                .map(|&i| values[i].clone())
                .collect();
            table.increment(key);
        }
        self.observed += 1;
        trace!(observed = self.observed, "record counted");
        Ok(())
    }
}

fn render_record<R: Serialize>(record: &R) -> String {
    serde_json::to_string(record).unwrap_or_else(|e| format!("<unrenderable record: {e}>"))
}

impl<R> fmt::Debug for Aggregator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("metrics", &self.metrics)
            .field("combinations", &self.combinations.len())
            .field("observed", &self.observed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use std::collections::HashMap;

    type Rec = HashMap<&'static str, &'static str>;

    fn metric(name: &'static str) -> Metric<Rec> {
        Metric::new(name, move |r: &Rec| r.get(name).copied())
    }

    #[test]
    fn failed_extraction_commits_nothing() {
        let mut agg = Aggregator::with_all_combinations(vec![metric("a"), metric("b")]).unwrap();
        agg.observe(&HashMap::from([("a", "x"), ("b", "y")])).unwrap();

        let err = agg.observe(&HashMap::from([("a", "x")])).unwrap_err();
        let e = err.as_extraction().expect("extraction error");
        assert_eq!(e.metric, "b");
        assert_eq!(e.record, r#"{"a":"x"}"#);

        assert_eq!(agg.observed(), 1);
        assert_eq!(agg.table(&["a"]).unwrap().total(), 1);
    }

    #[test]
    fn mismatched_combination_set_is_rejected() {
        let combos = CombinationSet::generate(&[metric("a")]).unwrap();
        let err = Aggregator::new(vec![metric("b")], combos).unwrap_err();
        assert!(matches!(
            err,
            TallyError::Configuration(ConfigurationError::MetricMismatch { .. })
        ));
    }
}
