//! Match-task orchestration.
//!
//! A [`MatchTask`] runs the configured steps of one scenario strictly in
//! order and owns everything they produce:
//!
//! ```text
//! MatchTask (one per scenario)
//!  ├─ steps:         [TablePairGeneration, Matching(line 1), SimMatrixBoosting(line 1), ...]
//!  ├─ table pairs:   source tables × target tables          (set by TablePairGeneration)
//!  ├─ sim matrices:  (step, matcher) → one local matrix per table pair
//!  ├─ ground truth:  [source columns × target columns]      (global, embedded at offsets)
//!  ├─ performances:  metric → (step, matcher) → Performance
//!  └─ cache counters
//! ```
//!
//! Similarity matrices stay local to their table pair; only the ground
//! truth is assembled into the database-wide index space:
//!
//! ```text
//!                 target offset
//!                      │
//!          ┌───────────┼─────────────┐
//!          │           ▼             │
//!  source  │      ┌─────────┐        │
//!  offset ─┼────▶ │ pair GT │        │  global ground truth
//!          │      └─────────┘        │
//!          └─────────────────────────┘
//! ```

mod error;
mod evaluation;
mod io;
mod pipeline;
mod step;
mod tablepair;

pub use error::{MatchTaskError, MatchTaskResult};
pub use evaluation::{Evaluator, Metric, Performance};
pub use io::{read_ground_truth_file, read_sim_matrix, write_matrix};
pub use pipeline::build_pipeline;
pub use step::{
    apply_boosting, BoostingStep, MatchLine, MatchStep, MatcherGroups, MatchingStep, StepGates,
    StepId,
};
pub use tablepair::TablePair;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use ndarray::{s, Array2};
use tracing::{debug, info};

use crate::config::{CacheSettings, PathSettings, Settings};
use crate::data::Scenario;
use crate::matching::{Matcher, MatcherKey};

/// Per-pair similarity matrices, aligned with the task's table pairs.
pub type PairMatrices = Vec<Array2<f32>>;

/// Performances of one metric.
pub type MetricPerformances = HashMap<StepId, HashMap<MatcherKey, Performance>>;

/// The matching run of one scenario.
#[derive(Debug)]
pub struct MatchTask<'s> {
    scenario: &'s Scenario,
    steps: Arc<[MatchStep]>,
    metrics: Vec<Arc<dyn Metric>>,
    paths: PathSettings,
    cache: CacheSettings,
    num_source_columns: usize,
    num_target_columns: usize,
    table_pairs: Option<Vec<TablePair<'s>>>,
    sim_matrices: HashMap<StepId, BTreeMap<MatcherKey, PairMatrices>>,
    performances: HashMap<String, MetricPerformances>,
    ground_truth: Option<Array2<i32>>,
    evaluator: Option<Evaluator>,
    cache_read: usize,
    cache_write: usize,
}

impl<'s> MatchTask<'s> {
    pub fn new(
        scenario: &'s Scenario,
        steps: Vec<MatchStep>,
        metrics: Vec<Arc<dyn Metric>>,
        settings: &Settings,
    ) -> Self {
        let performances = metrics
            .iter()
            .map(|metric| (metric.name().to_string(), HashMap::new()))
            .collect();
        Self {
            scenario,
            steps: steps.into(),
            metrics,
            paths: settings.paths.clone(),
            cache: settings.cache.clone(),
            num_source_columns: scenario.source().num_columns(),
            num_target_columns: scenario.target().num_columns(),
            table_pairs: None,
            sim_matrices: HashMap::new(),
            performances,
            ground_truth: None,
            evaluator: None,
            cache_read: 0,
            cache_write: 0,
        }
    }

    pub fn scenario(&self) -> &'s Scenario {
        self.scenario
    }

    pub fn steps(&self) -> &[MatchStep] {
        &self.steps
    }

    pub fn num_source_columns(&self) -> usize {
        self.num_source_columns
    }

    pub fn num_target_columns(&self) -> usize {
        self.num_target_columns
    }

    pub(crate) fn cache_settings(&self) -> &CacheSettings {
        &self.cache
    }

    /// Run every step in order: run, then save, then evaluate.
    ///
    /// Ground truth is read right after the table-pair generation step if
    /// any later step evaluates.
    pub fn run_steps(&mut self) -> MatchTaskResult<()> {
        let steps = Arc::clone(&self.steps);
        let any_evaluate = steps
            .iter()
            .any(|step| !step.is_table_pair_generation() && step.gates().evaluate);

        for (index, step) in steps.iter().enumerate() {
            let id = StepId(index);
            self.sim_matrices.insert(id, BTreeMap::new());
            for performances in self.performances.values_mut() {
                performances.insert(id, HashMap::new());
            }

            step.run(id, self)?;
            if step.is_table_pair_generation() && any_evaluate {
                self.read_ground_truth()?;
                if let Some(ground_truth) = &self.ground_truth {
                    self.evaluator = Some(Evaluator::new(self.metrics.clone(), ground_truth.clone()));
                }
            }
            step.save(id, self)?;
            step.evaluate(id, self)?;
        }

        if self.cache.read {
            info!(
                scenario = %self.scenario.path().display(),
                "Read {} similarity matrices from cache",
                self.cache_read
            );
        }
        if self.cache.write {
            info!(
                scenario = %self.scenario.path().display(),
                "Wrote {} new similarity matrices to cache",
                self.cache_write.saturating_sub(self.cache_read)
            );
        }
        Ok(())
    }

    pub fn table_pairs(&self) -> MatchTaskResult<&[TablePair<'s>]> {
        self.table_pairs
            .as_deref()
            .ok_or(MatchTaskError::TablePairsNotGenerated)
    }

    /// Replace the table pairs. Normally done by the table-pair generation step.
    pub fn set_table_pairs(&mut self, pairs: Vec<TablePair<'s>>) {
        self.table_pairs = Some(pairs);
    }

    /// Load every pair's ground truth into one global matrix.
    ///
    /// A pair without a file contributes zeros. A file whose shape differs
    /// from the pair's tables, or a pair whose region was already written
    /// by another pair, aborts.
    pub fn read_ground_truth(&mut self) -> MatchTaskResult<()> {
        let base = self.scenario.path().join(&self.paths.ground_truth_dir);
        debug!(path = %base.display(), "reading ground truth");

        let dim = (self.num_source_columns, self.num_target_columns);
        let mut global = Array2::<i32>::zeros(dim);
        let mut written = Array2::from_elem(dim, false);

        for pair in self.table_pairs()? {
            let path = base.join(format!("{}.csv", pair.id()));
            let local = match read_ground_truth_file(&path)? {
                Some(matrix) => {
                    let (rows, cols) = pair.shape();
                    let (found_rows, found_cols) = matrix.dim();
                    if (rows, cols) != (found_rows, found_cols) {
                        return Err(MatchTaskError::GroundTruthShape {
                            path,
                            rows,
                            cols,
                            found_rows,
                            found_cols,
                        });
                    }
                    matrix
                }
                None => {
                    debug!(path = %path.display(), "no ground truth file; assuming no correspondences");
                    pair.empty_gt_matrix()
                }
            };

            let region = s![pair.source_range(), pair.target_range()];
            let overlap = written
                .slice(region)
                .indexed_iter()
                .find(|(_, seen)| **seen)
                .map(|(cell, _)| cell);
            if let Some((row, col)) = overlap {
                return Err(MatchTaskError::OverlappingGroundTruth {
                    pair: pair.id(),
                    row: pair.source_range().start + row,
                    col: pair.target_range().start + col,
                });
            }
            written.slice_mut(region).fill(true);
            global.slice_mut(region).assign(&local);
        }

        self.ground_truth = Some(global);
        Ok(())
    }

    pub fn ground_truth(&self) -> Option<&Array2<i32>> {
        self.ground_truth.as_ref()
    }

    pub fn evaluator(&self) -> Option<&Evaluator> {
        self.evaluator.as_ref()
    }

    /// A zero matrix at global dimensions.
    pub fn get_empty_sim_matrix(&self) -> Array2<f32> {
        Array2::zeros((self.num_source_columns, self.num_target_columns))
    }

    pub fn set_sim_matrix(&mut self, step: StepId, matcher: MatcherKey, matrices: PairMatrices) {
        self.sim_matrices
            .entry(step)
            .or_default()
            .insert(matcher, matrices);
    }

    pub fn get_sim_matrix(&self, step: StepId, matcher: &MatcherKey) -> Option<&[Array2<f32>]> {
        self.sim_matrices
            .get(&step)
            .and_then(|matrices| matrices.get(matcher))
            .map(Vec::as_slice)
    }

    /// Everything a step stored, by matcher.
    pub fn sim_matrices_of(&self, step: StepId) -> impl Iterator<Item = (&MatcherKey, &PairMatrices)> {
        self.sim_matrices.get(&step).into_iter().flatten()
    }

    /// The matrices `matcher` holds in the step right before `step`.
    ///
    /// Fails with `NoPreviousStep` on the first step.
    pub fn get_sim_matrix_from_previous_match_step(
        &self,
        step: StepId,
        matcher: &MatcherKey,
    ) -> MatchTaskResult<&[Array2<f32>]> {
        let previous = step
            .0
            .checked_sub(1)
            .map(StepId)
            .ok_or(MatchTaskError::NoPreviousStep(step))?;
        self.get_sim_matrix(previous, matcher)
            .ok_or_else(|| MatchTaskError::MissingSimMatrix {
                step: previous,
                matcher: matcher.clone(),
            })
    }

    /// Matchers of the first matching step tagged with `line`.
    pub fn get_matchers_for_line(
        &self,
        line: MatchLine,
    ) -> Option<Vec<(MatcherKey, Arc<dyn Matcher>)>> {
        self.steps.iter().find_map(|step| match step {
            MatchStep::Matching(matching) if matching.line() == line => Some(
                matching
                    .matchers()
                    .map(|(key, matcher)| (key, Arc::clone(matcher)))
                    .collect(),
            ),
            _ => None,
        })
    }

    pub fn set_performance(
        &mut self,
        metric: &str,
        step: StepId,
        matcher: MatcherKey,
        performance: Performance,
    ) {
        self.performances
            .entry(metric.to_string())
            .or_default()
            .entry(step)
            .or_default()
            .insert(matcher, performance);
    }

    pub fn performance(&self, metric: &str, step: StepId, matcher: &MatcherKey) -> Option<&Performance> {
        self.performances
            .get(metric)
            .and_then(|steps| steps.get(&step))
            .and_then(|matchers| matchers.get(matcher))
    }

    pub fn performances_for_metric(&self, metric: &str) -> Option<&MetricPerformances> {
        self.performances.get(metric)
    }

    /// Where a pair's matrix of (`step`, `matcher`) is saved:
    /// `{results_dir}/{dataset}/{scenario}/{step}_{step name}/{matcher}/{pair}.csv`.
    pub fn result_path(&self, step: StepId, matcher: &MatcherKey, pair: &TablePair<'_>) -> PathBuf {
        let step_dir = match self.steps.get(step.0) {
            Some(match_step) => format!("{}_{}", step, match_step.name()),
            None => step.to_string(),
        };
        self.paths
            .results_dir
            .join(self.scenario.dataset_name())
            .join(self.scenario.name())
            .join(step_dir)
            .join(matcher.to_string())
            .join(format!("{}.csv", pair.id()))
    }

    pub fn increment_cache_read(&mut self) {
        self.cache_read += 1;
    }

    pub fn increment_cache_write(&mut self) {
        self.cache_write += 1;
    }

    pub fn cache_reads(&self) -> usize {
        self.cache_read
    }

    pub fn cache_writes(&self) -> usize {
        self.cache_write
    }
}
