//! Functional dependencies and unique column combinations.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a column by table and label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Dependency strength scores of a (possibly approximate) FD.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DependencyScore {
    /// Probabilistic dependency, 1.0 for exact FDs.
    pub pdep: f64,
    /// Bias-corrected pdep; FDs are ranked by this score.
    pub gpdep: f64,
}

/// `determinant -> dependant`, all columns within one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionalDependency {
    pub determinant: Vec<ColumnRef>,
    pub dependant: ColumnRef,
    pub score: DependencyScore,
}

impl FunctionalDependency {
    pub fn new(determinant: Vec<ColumnRef>, dependant: ColumnRef, score: DependencyScore) -> Self {
        Self {
            determinant,
            dependant,
            score,
        }
    }

    /// Every column the FD touches, determinant first.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnRef> {
        self.determinant.iter().chain(std::iter::once(&self.dependant))
    }
}

/// Column set whose value combinations are unique per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueColumnCombination {
    pub columns: Vec<ColumnRef>,
}

/// Dependency metadata discovered for one database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub fds: Vec<FunctionalDependency>,
    pub uccs: Vec<UniqueColumnCombination>,
}

impl DatabaseMetadata {
    pub fn new(fds: Vec<FunctionalDependency>, uccs: Vec<UniqueColumnCombination>) -> Self {
        Self { fds, uccs }
    }

    /// Number of FDs with `gpdep >= threshold`.
    pub fn count_fds_at_least(&self, threshold: f64) -> usize {
        self.fds
            .iter()
            .filter(|fd| fd.score.gpdep >= threshold)
            .count()
    }

    /// FDs ordered by descending gpdep. The sort is stable, so ties keep
    /// their discovery order.
    pub fn ranked_fds(&self) -> Vec<&FunctionalDependency> {
        let mut ranked: Vec<&FunctionalDependency> = self.fds.iter().collect();
        ranked.sort_by(|l, r| {
            r.score
                .gpdep
                .partial_cmp(&l.score.gpdep)
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }
}
