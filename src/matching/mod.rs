//! Matchers: table pair in, similarity matrix out.
//!
//! A matcher scores every (source column, target column) combination of one
//! [`TablePair`]. The result is a local matrix of shape
//! `[source columns × target columns]`; it is never embedded into the
//! database-wide index space.
//!
//! ```text
//!                     ┌──────────────────┐
//!   [[pipeline.steps  │ MatcherRegistry  │  name → factory(params)
//!     .matchers]] ──▶ │  two_opt         │
//!                     │  prisma          │───▶ Arc<dyn Matcher>
//!                     │  node2vec        │
//!                     └──────────────────┘
//!
//!   TablePair ──▶ Matcher::match_pair ──▶ Array2<f32>
//!                   │
//!                   ├─ TwoOptMatcher     (local, value distributions)
//!                   └─ Prisma/Node2Vec   (MatchService ──HTTP──▶ embedding service)
//! ```
//!
//! Matcher failures are returned as [`MatcherError`]. The matching step turns
//! them into an all-zero matrix of the pair's shape and logs them; they never
//! abort sibling matchers or later steps.

mod registry;
mod remote;
mod service;
mod two_opt;

pub use registry::{MatcherEnvironment, MatcherFactory, MatcherRegistry};
pub use remote::{Node2VecMatcher, Node2VecParams, PrismaMatcher, PrismaParams};
pub use service::{parse_matrix, HttpMatchService, MatchService, ServiceError, ServiceResult};
pub use two_opt::{TwoOptMatcher, TwoOptParams, TwoOptSolution};

use std::fmt;
use std::path::PathBuf;

use ndarray::Array2;
use thiserror::Error;

use crate::config::SettingsError;
use crate::matchtask::TablePair;

/// Result type for matcher operations.
pub type MatcherResult<T> = Result<T, MatcherError>;

/// Errors raised by matchers and by matcher construction.
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("no graph built for variant '{variant}' (expected {path})")]
    GraphNotBuilt { variant: String, path: PathBuf },

    #[error("matcher returned a {found_rows}x{found_cols} matrix, expected {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    #[error("unknown matcher '{0}'")]
    UnknownMatcher(String),

    #[error("invalid parameters for matcher '{matcher}': {source}")]
    InvalidParams {
        matcher: String,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Scores the columns of a table pair against each other.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Registry name of the implementation.
    fn name(&self) -> &str;

    /// Similarity matrix of shape `pair.shape()`.
    fn match_pair(&self, pair: &TablePair<'_>) -> MatcherResult<Array2<f32>>;
}

/// Identifies one configured matcher instance: its group and its position
/// inside the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatcherKey {
    pub group: String,
    pub index: usize,
}

impl MatcherKey {
    pub fn new(group: impl Into<String>, index: usize) -> Self {
        Self {
            group: group.into(),
            index,
        }
    }
}

impl fmt::Display for MatcherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.group, self.index)
    }
}

/// Check a matcher result against the pair's local shape.
pub fn ensure_shape(matrix: &Array2<f32>, pair: &TablePair<'_>) -> MatcherResult<()> {
    let (rows, cols) = pair.shape();
    let (found_rows, found_cols) = matrix.dim();
    if (rows, cols) != (found_rows, found_cols) {
        return Err(MatcherError::ShapeMismatch {
            rows,
            cols,
            found_rows,
            found_cols,
        });
    }
    Ok(())
}
