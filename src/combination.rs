//! Metric combinations and their canonical form.
//!
//! A [`Combination`] is a non-empty subset of metric names, sorted
//! lexicographically so that `["b", "a"]` and `["a", "b"]` are the same
//! table. The metric indices are resolved once, at construction, so the
//! aggregator never re-sorts or looks up names while counting.
//!
//! [`CombinationSet::generate`] builds the full power set minus the empty set
//! (2ⁿ − 1 combinations), ordered by subset size and then by the metrics'
//! positions in the input list. [`CombinationSet::from_names`] accepts an
//! explicit list instead.

use crate::error::{ConfigurationError, QueryError, TallyError};
use crate::metric::Metric;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Upper bound on the metric count; 16 metrics already mean 65 535 tables.
pub const MAX_METRICS: usize = 16;

/// A canonical, non-empty subset of metrics.
#[derive(Clone, Debug)]
pub struct Combination {
    names: Arc<[String]>,
    indices: Arc<[usize]>,
}

impl Combination {
    /// Build from metric positions; sorts by metric name.
    fn from_indices(metric_names: &[String], positions: &[usize]) -> Self {
        let mut pairs: Vec<(&String, usize)> =
            positions.iter().map(|&i| (&metric_names[i], i)).collect();
        pairs.sort();
        Self {
            names: pairs.iter().map(|(n, _)| (*n).clone()).collect(),
            indices: pairs.iter().map(|(_, i)| *i).collect(),
        }
    }

    /// Metric names in canonical order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Positions of the metrics in the aggregator's metric list, aligned with
    /// [`names`](Self::names).
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names of the coarser combination with `name` removed.
    ///
    /// `None` when `name` is not a member or when removing it would leave an
    /// empty combination.
    #[must_use]
    pub fn without(&self, name: &str) -> Option<Vec<String>> {
        if !self.contains(name) || self.len() == 1 {
            return None;
        }
        Some(self.names.iter().filter(|n| *n != name).cloned().collect())
    }
}

impl PartialEq for Combination {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for Combination {}

impl Hash for Combination {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.names.hash(state);
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.names.join(", "))
    }
}

/// The fixed set of combinations an aggregator tracks.
#[derive(Clone, Debug)]
pub struct CombinationSet {
    metric_names: Vec<String>,
    combos: Vec<Combination>,
    lookup: HashMap<Arc<[String]>, usize>,
}

impl CombinationSet {
    /// Every non-empty subset of `metrics`.
    ///
    /// # Errors
    /// [`ConfigurationError`] if the list is empty, has duplicate names, or is
    /// longer than [`MAX_METRICS`].
    pub fn generate<R>(metrics: &[Metric<R>]) -> Result<Self, ConfigurationError> {
        let metric_names = validate_metrics(metrics)?;
        let n = metric_names.len();
        let mut set = Self::empty(metric_names);
        for k in 1..=n {
            for positions in index_subsets(n, k) {
                let c = Combination::from_indices(&set.metric_names, &positions);
                set.push(c)?;
            }
        }
        Ok(set)
    }

    /// An explicit list of combinations, each given as metric names in any
    /// order.
    ///
    /// # Errors
    /// [`ConfigurationError`] for an invalid metric list, an empty spec list,
    /// an empty combination, an unknown or repeated name, or two specs that
    /// canonicalize to the same combination.
    pub fn from_names<R, I, C, S>(metrics: &[Metric<R>], specs: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let metric_names = validate_metrics(metrics)?;
        let by_name: HashMap<&str, usize> = metric_names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let mut positions_list = Vec::new();
        for spec in specs {
            let raw: Vec<String> = spec.into_iter().map(|s| s.as_ref().to_string()).collect();
            if raw.is_empty() {
                return Err(ConfigurationError::EmptyCombination);
            }
            let mut seen = HashSet::new();
            let mut positions = Vec::with_capacity(raw.len());
            for name in &raw {
                let Some(&i) = by_name.get(name.as_str()) else {
                    return Err(ConfigurationError::UnknownMetric {
                        name: name.clone(),
                        combination: raw.clone(),
                    });
                };
                if !seen.insert(i) {
                    return Err(ConfigurationError::RepeatedMetric {
                        name: name.clone(),
                        combination: raw.clone(),
                    });
                }
                positions.push(i);
            }
            positions_list.push(positions);
        }
        if positions_list.is_empty() {
            return Err(ConfigurationError::NoCombinations);
        }

        let mut set = Self::empty(metric_names);
        for positions in positions_list {
            let c = Combination::from_indices(&set.metric_names, &positions);
            set.push(c)?;
        }
        Ok(set)
    }

    fn empty(metric_names: Vec<String>) -> Self {
        Self {
            metric_names,
            combos: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn push(&mut self, c: Combination) -> Result<(), ConfigurationError> {
        if self.lookup.contains_key(&c.names) {
            return Err(ConfigurationError::DuplicateCombination(c.names.to_vec()));
        }
        self.lookup.insert(Arc::clone(&c.names), self.combos.len());
        self.combos.push(c);
        Ok(())
    }

    /// Find the tracked combination for `names`, in any order.
    ///
    /// # Errors
    /// [`ConfigurationError::UnknownMetric`] if a name is not a metric,
    /// [`ConfigurationError::RepeatedMetric`] if a name is given twice,
    /// [`QueryError::UnknownCombination`] if the metrics exist but this subset
    /// is not tracked.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<&Combination, TallyError> {
        let slot = self.slot(names)?;
        Ok(&self.combos[slot])
    }

    pub(crate) fn slot<S: AsRef<str>>(&self, names: &[S]) -> Result<usize, TallyError> {
        let mut canonical: Vec<String> = names.iter().map(|s| s.as_ref().to_string()).collect();
        if canonical.is_empty() {
            return Err(ConfigurationError::EmptyCombination.into());
        }
        if let Some(unknown) = canonical.iter().find(|n| !self.metric_names.contains(*n)) {
            return Err(ConfigurationError::UnknownMetric {
                name: unknown.clone(),
                combination: canonical.clone(),
            }
            .into());
        }
        canonical.sort();
        if let Some(w) = canonical.windows(2).find(|w| w[0] == w[1]) {
            return Err(ConfigurationError::RepeatedMetric {
                name: w[0].clone(),
                combination: names.iter().map(|s| s.as_ref().to_string()).collect(),
            }
            .into());
        }
        self.lookup
            .get(canonical.as_slice())
            .copied()
            .ok_or_else(|| QueryError::UnknownCombination(canonical).into())
    }

    /// Metric names in input order.
    #[must_use]
    pub fn metric_names(&self) -> &[String] {
        &self.metric_names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.combos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Combination> {
        self.combos.get(slot)
    }

    /// Combinations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Combination> {
        self.combos.iter()
    }
}

impl<'a> IntoIterator for &'a CombinationSet {
    type Item = &'a Combination;
    type IntoIter = std::slice::Iter<'a, Combination>;

    fn into_iter(self) -> Self::IntoIter {
        self.combos.iter()
    }
}

fn validate_metrics<R>(metrics: &[Metric<R>]) -> Result<Vec<String>, ConfigurationError> {
    if metrics.is_empty() {
        return Err(ConfigurationError::EmptyMetrics);
    }
    if metrics.len() > MAX_METRICS {
        return Err(ConfigurationError::TooManyMetrics {
            count: metrics.len(),
            max: MAX_METRICS,
        });
    }
    let mut seen = HashSet::new();
    for m in metrics {
        if !seen.insert(m.name()) {
            return Err(ConfigurationError::DuplicateMetric(m.name().to_string()));
        }
    }
    Ok(metrics.iter().map(|m| m.name().to_string()).collect())
}

/// All `k`-element index subsets of `0..n`, in lexicographic order.
fn index_subsets(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    if k == 0 || k > n {
        return out;
    }
    let mut idx: Vec<usize> = (0..k).collect();
    loop {
        out.push(idx.clone());
        // rightmost slot that has not reached its maximum
        let mut i = k;
        while i > 0 && idx[i - 1] == i - 1 + n - k {
            i -= 1;
        }
        if i == 0 {
            break;
        }
        idx[i - 1] += 1;
        for j in i..k {
            idx[j] = idx[j - 1] + 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_subsets_lexicographic() {
        assert_eq!(
            index_subsets(4, 2),
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![0, 3],
                vec![1, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(index_subsets(3, 3), vec![vec![0, 1, 2]]);
        assert!(index_subsets(2, 3).is_empty());
    }

    #[test]
    fn canonical_order_keeps_indices_aligned() {
        let names = vec!["session".to_string(), "direction".to_string()];
        let c = Combination::from_indices(&names, &[0, 1]);
        assert_eq!(c.names(), ["direction", "session"]);
        assert_eq!(c.indices(), [1, 0]);
        assert_eq!(c.to_string(), "(direction, session)");
        assert_eq!(c.without("session"), Some(vec!["direction".to_string()]));
        assert_eq!(c.without("nope"), None);
    }
}
