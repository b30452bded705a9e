//! Building match steps from `[[pipeline.steps]]`.

use crate::config::{Settings, StepKind, StepSettings};
use crate::matching::MatcherRegistry;

use super::error::{MatchTaskError, MatchTaskResult};
use super::step::{BoostingStep, MatchLine, MatchStep, MatcherGroups, MatchingStep, StepGates};

/// Turn the configured steps into match steps, instantiating every matcher
/// through `registry`.
///
/// Rejects pipelines where a matching or boosting step comes before the
/// table-pair generation step, and boosting steps whose line has no
/// earlier matching step.
pub fn build_pipeline(settings: &Settings, registry: &MatcherRegistry) -> MatchTaskResult<Vec<MatchStep>> {
    let mut steps: Vec<MatchStep> = Vec::with_capacity(settings.pipeline.steps.len());
    let mut has_table_pairs = false;

    for (position, step) in settings.pipeline.steps.iter().enumerate() {
        let gates = StepGates::new(step.run, step.save, step.evaluate);

        let built = match step.kind {
            StepKind::TablePairGeneration => {
                has_table_pairs = true;
                MatchStep::TablePairGeneration(gates)
            }
            StepKind::Matching => {
                require_table_pairs(position, has_table_pairs)?;
                let line = line_of(position, step)?;
                let mut groups = MatcherGroups::new();
                for matcher in &step.matchers {
                    groups
                        .entry(matcher.group.clone())
                        .or_default()
                        .push(registry.create(matcher)?);
                }
                MatchStep::Matching(MatchingStep::new(gates, line, groups))
            }
            StepKind::SimMatrixBoosting => {
                require_table_pairs(position, has_table_pairs)?;
                let line = line_of(position, step)?;
                let has_line = steps
                    .iter()
                    .any(|earlier| matches!(earlier, MatchStep::Matching(m) if m.line() == line));
                if !has_line {
                    return Err(MatchTaskError::InvalidPipeline(format!(
                        "boosting step {} has no earlier matching step on line {}",
                        position, line
                    )));
                }
                MatchStep::SimMatrixBoosting(BoostingStep::new(gates, line, step.boosting))
            }
        };
        steps.push(built);
    }

    Ok(steps)
}

fn require_table_pairs(position: usize, has_table_pairs: bool) -> MatchTaskResult<()> {
    if has_table_pairs {
        return Ok(());
    }
    Err(MatchTaskError::InvalidPipeline(format!(
        "step {} runs before table pairs are generated",
        position
    )))
}

fn line_of(position: usize, step: &StepSettings) -> MatchTaskResult<MatchLine> {
    let line = step.line.ok_or_else(|| {
        MatchTaskError::InvalidPipeline(format!("step {} is missing its line", position))
    })?;
    MatchLine::try_from(line)
}
