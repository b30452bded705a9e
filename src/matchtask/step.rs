//! Match steps: the closed set of pipeline stages.
//!
//! Every step exposes `run`, `save` and `evaluate`, each skipped when its
//! gate is off. Matching and boosting steps store one matrix per table
//! pair for each of their matchers, keyed by (step, matcher).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ndarray::Array2;
use tracing::{debug, error, trace, warn};

use crate::config::BoostingKind;
use crate::matching::{ensure_shape, Matcher, MatcherKey};

use super::error::{MatchTaskError, MatchTaskResult};
use super::io::{read_sim_matrix, write_matrix};
use super::tablepair::TablePair;
use super::MatchTask;

/// Position of a step in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub usize);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordinal tag of matching and boosting steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchLine {
    /// Primary pass over the raw tables.
    First = 1,
    /// Second pass over boosted similarities.
    Second = 2,
}

impl MatchLine {
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MatchLine {
    type Error = MatchTaskError;

    fn try_from(line: u8) -> Result<Self, Self::Error> {
        match line {
            1 => Ok(MatchLine::First),
            2 => Ok(MatchLine::Second),
            other => Err(MatchTaskError::InvalidPipeline(format!(
                "unsupported line {}",
                other
            ))),
        }
    }
}

impl fmt::Display for MatchLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Independent switches for the three step operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepGates {
    pub run: bool,
    pub save: bool,
    pub evaluate: bool,
}

impl StepGates {
    pub fn new(run: bool, save: bool, evaluate: bool) -> Self {
        Self {
            run,
            save,
            evaluate,
        }
    }
}

impl Default for StepGates {
    fn default() -> Self {
        Self::new(true, true, true)
    }
}

/// Matchers of a matching step, by group name.
pub type MatcherGroups = BTreeMap<String, Vec<Arc<dyn Matcher>>>;

/// Runs every matcher against every table pair.
#[derive(Debug)]
pub struct MatchingStep {
    gates: StepGates,
    line: MatchLine,
    matchers: MatcherGroups,
}

impl MatchingStep {
    pub fn new(gates: StepGates, line: MatchLine, matchers: MatcherGroups) -> Self {
        Self {
            gates,
            line,
            matchers,
        }
    }

    pub fn line(&self) -> MatchLine {
        self.line
    }

    pub fn groups(&self) -> &MatcherGroups {
        &self.matchers
    }

    /// Matchers with their keys, group by group.
    pub fn matchers(&self) -> impl Iterator<Item = (MatcherKey, &Arc<dyn Matcher>)> {
        self.matchers.iter().flat_map(|(group, matchers)| {
            matchers
                .iter()
                .enumerate()
                .map(move |(index, matcher)| (MatcherKey::new(group.as_str(), index), matcher))
        })
    }
}

/// Rescales the previous step's matrices of one line.
#[derive(Debug, Clone)]
pub struct BoostingStep {
    gates: StepGates,
    line: MatchLine,
    boosting: BoostingKind,
}

impl BoostingStep {
    pub fn new(gates: StepGates, line: MatchLine, boosting: BoostingKind) -> Self {
        Self {
            gates,
            line,
            boosting,
        }
    }

    pub fn line(&self) -> MatchLine {
        self.line
    }

    pub fn boosting(&self) -> BoostingKind {
        self.boosting
    }
}

/// One pipeline stage.
#[derive(Debug)]
pub enum MatchStep {
    /// Populates the task's table pairs. Must precede every other step.
    TablePairGeneration(StepGates),
    Matching(MatchingStep),
    SimMatrixBoosting(BoostingStep),
}

impl MatchStep {
    pub fn gates(&self) -> StepGates {
        match self {
            MatchStep::TablePairGeneration(gates) => *gates,
            MatchStep::Matching(step) => step.gates,
            MatchStep::SimMatrixBoosting(step) => step.gates,
        }
    }

    pub fn line(&self) -> Option<MatchLine> {
        match self {
            MatchStep::TablePairGeneration(_) => None,
            MatchStep::Matching(step) => Some(step.line),
            MatchStep::SimMatrixBoosting(step) => Some(step.line),
        }
    }

    pub fn is_table_pair_generation(&self) -> bool {
        matches!(self, MatchStep::TablePairGeneration(_))
    }

    /// Name used in logs and result directories.
    pub fn name(&self) -> String {
        match self {
            MatchStep::TablePairGeneration(_) => "table_pair_generation".to_string(),
            MatchStep::Matching(step) => format!("matching_line{}", step.line),
            MatchStep::SimMatrixBoosting(step) => format!("sim_matrix_boosting_line{}", step.line),
        }
    }

    pub fn run(&self, id: StepId, task: &mut MatchTask<'_>) -> MatchTaskResult<()> {
        if !self.gates().run {
            debug!(step = %id, name = %self.name(), "run skipped");
            return Ok(());
        }
        debug!(
            step = %id,
            name = %self.name(),
            scenario = %task.scenario().path().display(),
            "running step"
        );

        match self {
            MatchStep::TablePairGeneration(_) => {
                let pairs = TablePair::generate(task.scenario());
                debug!(pairs = pairs.len(), "generated table pairs");
                task.set_table_pairs(pairs);
                Ok(())
            }
            MatchStep::Matching(step) => run_matching(step, id, task),
            MatchStep::SimMatrixBoosting(step) => run_boosting(step, id, task),
        }
    }

    pub fn save(&self, id: StepId, task: &mut MatchTask<'_>) -> MatchTaskResult<()> {
        if !self.gates().save || self.is_table_pair_generation() {
            return Ok(());
        }
        debug!(
            step = %id,
            name = %self.name(),
            scenario = %task.scenario().path().display(),
            "saving step output"
        );

        let written = {
            let task = &*task;
            let pairs = task.table_pairs()?;
            let mut written = 0;
            for (key, matrices) in task.sim_matrices_of(id) {
                for (pair, matrix) in pairs.iter().zip(matrices) {
                    write_matrix(&task.result_path(id, key, pair), matrix)?;
                    written += 1;
                }
            }
            written
        };
        if task.cache_settings().write {
            for _ in 0..written {
                task.increment_cache_write();
            }
        }
        Ok(())
    }

    pub fn evaluate(&self, id: StepId, task: &mut MatchTask<'_>) -> MatchTaskResult<()> {
        if !self.gates().evaluate || self.is_table_pair_generation() {
            return Ok(());
        }
        debug!(
            step = %id,
            name = %self.name(),
            scenario = %task.scenario().path().display(),
            "evaluating step output"
        );

        let results = {
            let evaluator = task
                .evaluator()
                .ok_or(MatchTaskError::GroundTruthNotLoaded(id))?;
            let pairs = task.table_pairs()?;
            let mut results = Vec::new();
            for (key, matrices) in task.sim_matrices_of(id) {
                for (metric, performance) in evaluator.evaluate(pairs, matrices) {
                    results.push((metric, key.clone(), performance));
                }
            }
            results
        };
        for (metric, key, performance) in results {
            task.set_performance(&metric, id, key, performance);
        }
        Ok(())
    }
}

fn run_matching(step: &MatchingStep, id: StepId, task: &mut MatchTask<'_>) -> MatchTaskResult<()> {
    let pairs = task.table_pairs()?.to_vec();
    for (key, matcher) in step.matchers() {
        trace!(line = %step.line, matcher = %key, name = matcher.name(), "processing matcher");
        let mut matrices = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            if let Some(cached) = read_cached(id, &key, pair, task) {
                task.increment_cache_read();
                matrices.push(cached);
                continue;
            }
            matrices.push(match_with_fallback(matcher.as_ref(), &key, pair));
        }
        task.set_sim_matrix(id, key, matrices);
    }
    Ok(())
}

/// A previously saved matrix of this (step, matcher, pair), if cache reads
/// are enabled and the file holds a matrix of the right shape.
fn read_cached(
    id: StepId,
    key: &MatcherKey,
    pair: &TablePair<'_>,
    task: &MatchTask<'_>,
) -> Option<Array2<f32>> {
    if !task.cache_settings().read {
        return None;
    }
    let path = task.result_path(id, key, pair);
    if !path.is_file() {
        return None;
    }
    match read_sim_matrix(&path) {
        Ok(matrix) if matrix.dim() == pair.shape() => Some(matrix),
        Ok(matrix) => {
            warn!(
                path = %path.display(),
                found = ?matrix.dim(),
                expected = ?pair.shape(),
                "ignoring cached matrix of the wrong shape"
            );
            None
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable cached matrix");
            None
        }
    }
}

/// Run `matcher`, replacing any failure with an all-zero matrix.
fn match_with_fallback(matcher: &dyn Matcher, key: &MatcherKey, pair: &TablePair<'_>) -> Array2<f32> {
    let result = matcher.match_pair(pair).and_then(|matrix| {
        ensure_shape(&matrix, pair)?;
        Ok(matrix)
    });
    match result {
        Ok(matrix) => matrix,
        Err(err) => {
            error!(
                matcher = %key,
                name = matcher.name(),
                pair = %pair,
                error = %err,
                "matcher failed; using an empty similarity matrix"
            );
            pair.empty_sim_matrix()
        }
    }
}

fn run_boosting(step: &BoostingStep, id: StepId, task: &mut MatchTask<'_>) -> MatchTaskResult<()> {
    let matchers = task
        .get_matchers_for_line(step.line)
        .ok_or(MatchTaskError::NoMatchersForLine(step.line))?;
    for (key, _) in matchers {
        let boosted: Vec<Array2<f32>> = task
            .get_sim_matrix_from_previous_match_step(id, &key)?
            .iter()
            .map(|matrix| apply_boosting(step.boosting, matrix))
            .collect();
        task.set_sim_matrix(id, key, boosted);
    }
    Ok(())
}

/// Apply a boosting function to one local matrix.
///
/// `MinMax` rescales the matrix to `[0, 1]`; a constant matrix is returned
/// unchanged.
pub fn apply_boosting(kind: BoostingKind, matrix: &Array2<f32>) -> Array2<f32> {
    match kind {
        BoostingKind::Identity => matrix.clone(),
        BoostingKind::MinMax => {
            let min = matrix.iter().copied().fold(f32::INFINITY, f32::min);
            let max = matrix.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            if matrix.is_empty() || max <= min {
                return matrix.clone();
            }
            let range = max - min;
            matrix.mapv(|value| (value - min) / range)
        }
    }
}
