//! Source/target table pairs.

use std::fmt;
use std::ops::Range;

use ndarray::Array2;

use crate::data::{Scenario, Table};

/// One source table, one target table, and the scenario they belong to.
///
/// Local matrices of a pair have shape
/// `[source columns × target columns]`; its global position is given by
/// the two tables' offsets.
#[derive(Debug, Clone, Copy)]
pub struct TablePair<'s> {
    scenario: &'s Scenario,
    source: &'s Table,
    target: &'s Table,
}

impl<'s> TablePair<'s> {
    pub fn new(scenario: &'s Scenario, source: &'s Table, target: &'s Table) -> Self {
        Self {
            scenario,
            source,
            target,
        }
    }

    /// Every (source table, target table) combination, source-major.
    pub fn generate(scenario: &'s Scenario) -> Vec<Self> {
        scenario
            .source()
            .tables()
            .iter()
            .flat_map(|source| {
                scenario
                    .target()
                    .tables()
                    .iter()
                    .map(move |target| Self::new(scenario, source, target))
            })
            .collect()
    }

    /// File stem used for ground-truth and result files: `{source}__{target}`.
    pub fn id(&self) -> String {
        format!("{}__{}", self.source.name(), self.target.name())
    }

    pub fn scenario(&self) -> &'s Scenario {
        self.scenario
    }

    pub fn source_table(&self) -> &'s Table {
        self.source
    }

    pub fn target_table(&self) -> &'s Table {
        self.target
    }

    /// `(source columns, target columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.source.num_columns(), self.target.num_columns())
    }

    /// Global row range of the pair.
    pub fn source_range(&self) -> Range<usize> {
        self.source.column_range()
    }

    /// Global column range of the pair.
    pub fn target_range(&self) -> Range<usize> {
        self.target.column_range()
    }

    pub fn empty_sim_matrix(&self) -> Array2<f32> {
        Array2::zeros(self.shape())
    }

    pub fn empty_gt_matrix(&self) -> Array2<i32> {
        Array2::zeros(self.shape())
    }
}

impl fmt::Display for TablePair<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}", self.source.name(), self.target.name())
    }
}
