//! Value-distribution measures over column values.
//!
//! Matchers and feature export depend only on the [`DistributionDistance`]
//! capability. [`EuclideanDistance`] is the default implementation.

use std::collections::BTreeMap;
use std::fmt;

/// Distance between the value distributions of two columns.
///
/// Implementations must return a non-negative value that is 0 exactly when
/// both distributions are identical.
pub trait DistributionDistance: Send + Sync + fmt::Debug {
    fn distance(&self, left: &[String], right: &[String]) -> f64;
}

/// Euclidean distance between the probability mass functions of two value
/// lists, taken over the union of their distinct values.
///
/// Terms are summed in value order, so the result is bit-for-bit stable
/// across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl DistributionDistance for EuclideanDistance {
    fn distance(&self, left: &[String], right: &[String]) -> f64 {
        let left_pmf = probability_mass(left);
        let right_pmf = probability_mass(right);

        let mut sum = 0.0;
        for (value, p) in &left_pmf {
            let q = right_pmf.get(value).copied().unwrap_or(0.0);
            sum += (p - q).powi(2);
        }
        for (value, q) in &right_pmf {
            if !left_pmf.contains_key(value) {
                sum += q.powi(2);
            }
        }
        sum.sqrt()
    }
}

/// Relative frequency of each distinct value, ordered by value.
pub fn probability_mass<T: Ord>(values: &[T]) -> BTreeMap<&T, f64> {
    let mut counts: BTreeMap<&T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let total = values.len() as f64;
    counts
        .into_iter()
        .map(|(value, count)| (value, count as f64 / total))
        .collect()
}

/// Shannon entropy in bits. Empty input has entropy 0.
pub fn entropy<T: Ord>(values: &[T]) -> f64 {
    probability_mass(values)
        .values()
        .map(|p| -p * p.log2())
        .sum()
}

/// Mean character length of the values, 0 for no values.
pub fn average_length(values: &[String]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: usize = values.iter().map(|value| value.chars().count()).sum();
    total as f64 / values.len() as f64
}
