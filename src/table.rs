//! Count tables and query results.
//!
//! A [`CountTable`] maps each observed [`ValueTuple`] of one combination to
//! its count. Reading it back goes through [`CountTable::sorted_rows`], which
//! orders rows by count descending and breaks ties by tuple order, so output
//! never depends on hash iteration or ingestion order.

use crate::value::{Value, ValueTuple};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Counts for a single combination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: HashMap<ValueTuple, u64>,
}

impl CountTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn increment(&mut self, key: Vec<Value>) {
        if let Some(n) = self.counts.get_mut(key.as_slice()) {
            *n += 1;
        } else {
            self.counts.insert(ValueTuple::new(key), 1);
        }
    }

    /// Count for one tuple; zero if never seen.
    #[must_use]
    pub fn get(&self, key: &[Value]) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct tuples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Unordered view of `(tuple, count)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ValueTuple, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    /// All entries as rows, count descending then tuple ascending.
    #[must_use]
    pub fn sorted_rows(&self) -> Vec<Row> {
        let mut entries: Vec<(&ValueTuple, u64)> = self.iter().collect();
        entries.sort_by(|a, b| (Reverse(a.1), a.0).cmp(&(Reverse(b.1), b.0)));
        entries
            .into_iter()
            .map(|(values, count)| Row::Tuple {
                values: values.clone(),
                count,
            })
            .collect()
    }
}

/// One row of a query result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    /// A distinct value tuple and how often it was seen.
    Tuple { values: ValueTuple, count: u64 },
    /// Synthetic trailing row: blank values, sum of all counts.
    Total { count: u64 },
}

impl Row {
    pub fn tuple(values: impl Into<ValueTuple>, count: u64) -> Self {
        Self::Tuple {
            values: values.into(),
            count,
        }
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        match self {
            Self::Tuple { count, .. } | Self::Total { count } => *count,
        }
    }

    #[must_use]
    pub const fn values(&self) -> Option<&ValueTuple> {
        match self {
            Self::Tuple { values, .. } => Some(values),
            Self::Total { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_total(&self) -> bool {
        matches!(self, Self::Total { .. })
    }

    /// Value cells rendered as text; a total row yields `width` copies of
    /// `blank`.
    #[must_use]
    pub fn cells(&self, width: usize, blank: &str) -> Vec<String> {
        match self {
            Self::Tuple { values, .. } => values.iter().map(ToString::to_string).collect(),
            Self::Total { .. } => vec![blank.to_string(); width],
        }
    }
}

/// Rows of one combination, as returned by
/// [`Aggregator::query`](crate::Aggregator::query).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Metric names in canonical order.
    pub combination: Vec<String>,
    /// Sorted rows, with a trailing [`Row::Total`] when requested.
    pub rows: Vec<Row>,
}

impl QueryResult {
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows, including a total row if present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The total row's count, if one was requested.
    #[must_use]
    pub fn total(&self) -> Option<u64> {
        self.rows.iter().find(|r| r.is_total()).map(Row::count)
    }

    /// `(tuple, count)` pairs in row order, skipping the total row.
    #[must_use]
    pub fn counts(&self) -> Vec<(ValueTuple, u64)> {
        self.rows
            .iter()
            .filter_map(|r| r.values().map(|v| (v.clone(), r.count())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_rows_count_desc_then_tuple() {
        let mut t = CountTable::new();
        for key in [["OUT", "s1"], ["IN", "s2"], ["IN", "s1"], ["OUT", "s1"]] {
            t.increment(key.iter().map(|s| Value::from(*s)).collect());
        }
        assert_eq!(
            t.sorted_rows(),
            vec![
                Row::tuple(["OUT", "s1"], 2),
                Row::tuple(["IN", "s1"], 1),
                Row::tuple(["IN", "s2"], 1),
            ]
        );
        assert_eq!(t.total(), 4);
        assert_eq!(t.get(&[Value::from("IN"), Value::from("s2")]), 1);
        assert_eq!(t.get(&[Value::from("nope")]), 0);
    }

    #[test]
    fn total_row_cells_are_blank() {
        let row = Row::Total { count: 3 };
        assert_eq!(row.cells(2, ""), vec![String::new(), String::new()]);
        assert_eq!(row.values(), None);
        assert_eq!(Row::tuple([true], 1).cells(1, ""), vec!["true".to_string()]);
    }
}
