//! Assertion functions for aggregator outputs.
//!
//! All of these panic with a readable message on failure, so they can be used
//! directly inside `#[test]` functions and `proptest!` bodies.

use crate::aggregator::Aggregator;
use crate::table::{QueryResult, Row};
use crate::value::Value;
use std::collections::HashMap;

/// Assert that a query returned exactly `expected`, in order.
///
/// # Panics
///
/// Panics if the rows differ in length or content.
///
/// # Example
///
/// ```
/// use crosstally::{QueryResult, Row};
/// use crosstally::testing::assert_rows_equal;
///
/// let result = QueryResult {
///     combination: vec!["direction".into()],
///     rows: vec![Row::tuple(["IN"], 2), Row::Total { count: 2 }],
/// };
/// assert_rows_equal(&result, &[Row::tuple(["IN"], 2), Row::Total { count: 2 }]);
/// ```
pub fn assert_rows_equal(actual: &QueryResult, expected: &[Row]) {
    let combination = actual.combination.join(", ");
    assert_eq!(
        actual.rows.len(),
        expected.len(),
        "Row count mismatch for ({combination}):\n  Expected: {expected:?}\n  Actual: {:?}",
        actual.rows
    );

    for (i, (a, e)) in actual.rows.iter().zip(expected).enumerate() {
        assert_eq!(
            a, e,
            "Row mismatch for ({combination}) at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {:?}",
            actual.rows
        );
    }
}

/// Assert that every tracked single-metric table sums to
/// [`Aggregator::observed`].
///
/// Metrics without a single-metric table (possible with an explicit
/// combination list) are skipped.
///
/// # Panics
///
/// Panics on the first table whose total differs.
pub fn assert_single_metric_totals<R>(aggregator: &Aggregator<R>) {
    let observed = aggregator.observed();
    for (combination, table) in aggregator.tables() {
        if combination.len() != 1 {
            continue;
        }
        assert_eq!(
            table.total(),
            observed,
            "Table {combination} sums to {} but {observed} records were observed",
            table.total()
        );
    }
}

/// Assert that summing the table for `names` over the values of `dropped`
/// yields the table for `names` without `dropped`.
///
/// # Panics
///
/// Panics if either combination is not tracked, if `dropped` is not one of
/// `names` (or is its only member), or if any coarser count differs.
pub fn assert_marginal_consistency<R, S: AsRef<str>>(
    aggregator: &Aggregator<R>,
    names: &[S],
    dropped: &str,
) {
    let full = aggregator
        .combinations()
        .resolve(names)
        .unwrap_or_else(|e| panic!("Cannot resolve combination: {e}"));
    let Some(rest) = full.without(dropped) else {
        panic!("'{dropped}' cannot be dropped from {full}");
    };
    let Some(pos) = full.names().iter().position(|n| n == dropped) else {
        panic!("'{dropped}' is not part of {full}");
    };

    let fine = aggregator
        .table(full.names())
        .unwrap_or_else(|e| panic!("Missing table {full}: {e}"));
    let coarse = aggregator
        .table(&rest)
        .unwrap_or_else(|e| panic!("Missing table ({}): {e}", rest.join(", ")));

    let mut collapsed: HashMap<Vec<Value>, u64> = HashMap::new();
    for (tuple, count) in fine.iter() {
        let mut key = tuple.to_vec();
        key.remove(pos);
        *collapsed.entry(key).or_insert(0) += count;
    }

    assert_eq!(
        collapsed.len(),
        coarse.len(),
        "Collapsing {full} over '{dropped}' gives {} tuples, table ({}) has {}",
        collapsed.len(),
        rest.join(", "),
        coarse.len()
    );
    for (key, count) in &collapsed {
        assert_eq!(
            coarse.get(key),
            *count,
            "Marginal mismatch for {key:?}: {full} collapsed over '{dropped}' gives {count}, table ({}) has {}",
            rest.join(", "),
            coarse.get(key)
        );
    }
}

/// Run [`assert_marginal_consistency`] for every tracked combination and
/// every member whose removal leaves a tracked combination.
///
/// # Panics
///
/// Panics on the first inconsistent pair.
pub fn assert_all_marginals<R>(aggregator: &Aggregator<R>) {
    let set = aggregator.combinations();
    for combination in set {
        for name in combination.names() {
            let Some(rest) = combination.without(name) else {
                continue;
            };
            if set.resolve(&rest).is_ok() {
                assert_marginal_consistency(aggregator, combination.names(), name);
            }
        }
    }
}
