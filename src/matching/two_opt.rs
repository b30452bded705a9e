//! Two-opt baseline matcher.
//!
//! Aligns source and target columns by their value distributions alone:
//! builds a dissimilarity matrix, seeds a bijection and improves it with
//! pairwise swaps until a full sweep finds nothing better.

use std::sync::Arc;

use ndarray::{s, Array2};
use serde::Deserialize;
use tracing::trace;

use crate::data::Column;
use crate::matchtask::TablePair;
use crate::similarity::{DistributionDistance, EuclideanDistance};

use super::{Matcher, MatcherResult};

/// Parameters of [`TwoOptMatcher`] as read from the matcher's `params` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TwoOptParams {
    /// Maximum number of full sweeps.
    pub max_iterations: usize,
}

impl Default for TwoOptParams {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
        }
    }
}

/// Outcome of a two-opt search over a square cost matrix.
#[derive(Debug, Clone)]
pub struct TwoOptSolution {
    /// `assignment[row]` is the column matched to `row`.
    pub assignment: Vec<usize>,

    /// Total cost of the seed, then after every sweep.
    pub costs: Vec<f64>,
}

impl TwoOptSolution {
    pub fn sweeps(&self) -> usize {
        self.costs.len().saturating_sub(1)
    }

    pub fn total_cost(&self) -> f64 {
        self.costs.last().copied().unwrap_or(0.0)
    }

    /// Binary match matrix restricted to `rows × cols`. Rows or columns that
    /// were only matched to padding stay all zero.
    pub fn match_matrix(&self, rows: usize, cols: usize) -> Array2<f32> {
        let mut matrix = Array2::zeros((rows, cols));
        for (row, &col) in self.assignment.iter().enumerate().take(rows) {
            if col < cols {
                matrix[[row, col]] = 1.0;
            }
        }
        matrix
    }
}

/// Deterministic first-improvement hill climbing over column bijections.
#[derive(Debug, Clone)]
pub struct TwoOptMatcher {
    max_iterations: usize,
    distance: Arc<dyn DistributionDistance>,
}

impl TwoOptMatcher {
    pub fn new(params: TwoOptParams) -> Self {
        Self {
            max_iterations: params.max_iterations,
            distance: Arc::new(EuclideanDistance),
        }
    }

    pub fn with_distance(mut self, distance: Arc<dyn DistributionDistance>) -> Self {
        self.distance = distance;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// `D[i][j]`: distance between source column `i` and target column `j`.
    pub fn dissimilarity(&self, source: &[Column], target: &[Column]) -> Array2<f64> {
        Array2::from_shape_fn((source.len(), target.len()), |(i, j)| {
            self.distance.distance(source[i].values(), target[j].values())
        })
    }

    /// Run the search on a (possibly rectangular) dissimilarity matrix.
    ///
    /// The matrix is padded with zeros to `N × N`, `N = max(rows, cols)`, and
    /// the anti-diagonal permutation is the seed. Each sweep visits every
    /// row `outer` and column `inner >= outer` in row-major order. Unless
    /// `outer` already holds `inner`, it tries moving `outer` to `inner`
    /// and handing the old column of `outer` to the row that held `inner`.
    /// A move is kept as soon as it lowers the total cost.
    pub fn solve(&self, dissimilarity: &Array2<f64>) -> TwoOptSolution {
        let (rows, cols) = dissimilarity.dim();
        let n = rows.max(cols);
        let mut cost = Array2::<f64>::zeros((n, n));
        cost.slice_mut(s![..rows, ..cols]).assign(dissimilarity);

        let mut assignment: Vec<usize> = (0..n).map(|row| n - 1 - row).collect();
        let mut costs = vec![total_cost(&cost, &assignment)];

        let mut improved = n > 1;
        let mut sweeps = 0;
        while improved && sweeps < self.max_iterations {
            improved = false;
            sweeps += 1;

            for outer in 0..n {
                for inner in outer..n {
                    if assignment[outer] == inner {
                        continue;
                    }
                    let Some(holder) = assignment.iter().position(|&col| col == inner) else {
                        continue;
                    };
                    let old = assignment[outer];
                    let delta = cost[[outer, inner]] + cost[[holder, old]]
                        - cost[[outer, old]]
                        - cost[[holder, inner]];
                    if delta < 0.0 {
                        assignment.swap(outer, holder);
                        improved = true;
                    }
                }
            }

            let total = total_cost(&cost, &assignment);
            trace!(sweep = sweeps, cost = total, "two-opt sweep");
            costs.push(total);
        }

        TwoOptSolution { assignment, costs }
    }
}

impl Default for TwoOptMatcher {
    fn default() -> Self {
        Self::new(TwoOptParams::default())
    }
}

impl Matcher for TwoOptMatcher {
    fn name(&self) -> &str {
        "two_opt"
    }

    fn match_pair(&self, pair: &TablePair<'_>) -> MatcherResult<Array2<f32>> {
        let source = pair.source_table().columns();
        let target = pair.target_table().columns();
        let solution = self.solve(&self.dissimilarity(source, target));
        Ok(solution.match_matrix(source.len(), target.len()))
    }
}

fn total_cost(cost: &Array2<f64>, assignment: &[usize]) -> f64 {
    assignment
        .iter()
        .enumerate()
        .map(|(row, &col)| cost[[row, col]])
        .sum()
}
