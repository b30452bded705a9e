//! Scoring similarity matrices against the ground truth.

use std::fmt;
use std::sync::Arc;

use ndarray::{s, Array2, ArrayView2};

use super::tablepair::TablePair;

/// A quality measure of one local similarity matrix.
pub trait Metric: Send + Sync + fmt::Debug {
    /// Unique name, used as the key of stored performances.
    fn name(&self) -> &str;

    /// Score `sim` against the ground truth of the same pair.
    fn score(&self, sim: ArrayView2<'_, f32>, ground_truth: ArrayView2<'_, i32>) -> f32;
}

/// Scores of one (metric, step, matcher).
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    /// Mean over all table pairs, 0 if there are none.
    pub mean: f32,

    /// `(pair id, score)` in table-pair order.
    pub pair_scores: Vec<(String, f32)>,
}

impl Performance {
    pub fn from_pair_scores(pair_scores: Vec<(String, f32)>) -> Self {
        let mean = if pair_scores.is_empty() {
            0.0
        } else {
            pair_scores.iter().map(|(_, score)| score).sum::<f32>() / pair_scores.len() as f32
        };
        Self { mean, pair_scores }
    }

    pub fn pair_score(&self, pair: &str) -> Option<f32> {
        self.pair_scores
            .iter()
            .find(|(id, _)| id == pair)
            .map(|(_, score)| *score)
    }
}

/// Applies every metric to a matcher's per-pair matrices.
#[derive(Debug, Clone)]
pub struct Evaluator {
    metrics: Vec<Arc<dyn Metric>>,
    ground_truth: Array2<i32>,
}

impl Evaluator {
    pub fn new(metrics: Vec<Arc<dyn Metric>>, ground_truth: Array2<i32>) -> Self {
        Self {
            metrics,
            ground_truth,
        }
    }

    pub fn metrics(&self) -> &[Arc<dyn Metric>] {
        &self.metrics
    }

    /// The pair's region of the global ground truth.
    pub fn ground_truth_for(&self, pair: &TablePair<'_>) -> ArrayView2<'_, i32> {
        self.ground_truth
            .slice(s![pair.source_range(), pair.target_range()])
    }

    /// One performance per metric, in metric order. `matrices` is aligned
    /// with `pairs`.
    pub fn evaluate(
        &self,
        pairs: &[TablePair<'_>],
        matrices: &[Array2<f32>],
    ) -> Vec<(String, Performance)> {
        self.metrics
            .iter()
            .map(|metric| {
                let scores = pairs
                    .iter()
                    .zip(matrices)
                    .map(|(pair, sim)| {
                        (pair.id(), metric.score(sim.view(), self.ground_truth_for(pair)))
                    })
                    .collect();
                (metric.name().to_string(), Performance::from_pair_scores(scores))
            })
            .collect()
    }
}
