//! Threshold variants: how many top-ranked FDs a graph encodes.

use std::fmt;
use std::str::FromStr;

use crate::data::{DatabaseSide, Scenario};

use super::GraphError;

/// How the FD budget is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FdBudgetRule {
    /// `absolute_<N>`: exactly N.
    Absolute(usize),
    /// `col_scale_<f>`: columns of the database times f.
    ColumnScale(f64),
    /// `gdep_threshold_<t>`: FDs with gpdep >= t on the richer side.
    GdepThreshold(f64),
}

/// A parsed threshold-variant specifier.
///
/// The original string is kept as the label because it names the exported
/// graph file, so `gdep_threshold_0.10` and `gdep_threshold_0.1` are
/// different variants.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdVariant {
    label: String,
    rule: FdBudgetRule,
}

impl ThresholdVariant {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rule(&self) -> FdBudgetRule {
        self.rule
    }

    /// Number of top-ranked FDs to encode in the graph of `side`.
    pub fn fd_budget(&self, scenario: &Scenario, side: DatabaseSide, cap: usize) -> usize {
        match self.rule {
            FdBudgetRule::Absolute(n) => n,
            FdBudgetRule::ColumnScale(factor) => {
                let scaled = scenario.database(side).num_columns() as f64 * factor;
                (scaled.min(cap as f64)) as usize
            }
            FdBudgetRule::GdepThreshold(threshold) => {
                let source = scenario.source().metadata().count_fds_at_least(threshold);
                let target = scenario.target().metadata().count_fds_at_least(threshold);
                source.max(target).min(cap)
            }
        }
    }
}

impl FromStr for ThresholdVariant {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GraphError::InvalidVariant(s.to_string());

        let rule = if let Some(n) = s.strip_prefix("absolute_") {
            FdBudgetRule::Absolute(n.parse().map_err(|_| invalid())?)
        } else if let Some(f) = s.strip_prefix("col_scale_") {
            FdBudgetRule::ColumnScale(parse_non_negative(f).ok_or_else(invalid)?)
        } else if let Some(t) = s.strip_prefix("gdep_threshold_") {
            FdBudgetRule::GdepThreshold(parse_non_negative(t).ok_or_else(invalid)?)
        } else {
            return Err(invalid());
        };

        Ok(Self {
            label: s.to_string(),
            rule,
        })
    }
}

fn parse_non_negative(s: &str) -> Option<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

impl fmt::Display for ThresholdVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
