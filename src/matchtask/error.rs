//! Match-task error types.

use std::path::PathBuf;

use thiserror::Error;

use super::step::{MatchLine, StepId};
use crate::matching::{MatcherError, MatcherKey};

/// Result type for match-task operations.
pub type MatchTaskResult<T> = Result<T, MatchTaskError>;

/// Errors that abort a match task or reject a pipeline.
#[derive(Debug, Error)]
pub enum MatchTaskError {
    /// A step needed table pairs before the table-pair generation step ran.
    #[error("table pairs have not been generated yet; the table pair generation step must come first")]
    TablePairsNotGenerated,

    /// A step asked for evaluation but no ground truth was loaded.
    #[error("ground truth has not been loaded; no step before {0} generated table pairs")]
    GroundTruthNotLoaded(StepId),

    #[error("ground truth {path} is {found_rows}x{found_cols}, but its tables need {rows}x{cols}")]
    GroundTruthShape {
        path: PathBuf,
        rows: usize,
        cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    #[error("failed to parse matrix {path}: {message}")]
    MatrixParse { path: PathBuf, message: String },

    /// Two pairs claim the same cell of the global ground-truth matrix.
    #[error("ground truth of pair {pair} overlaps an earlier pair at global cell ({row}, {col})")]
    OverlappingGroundTruth { pair: String, row: usize, col: usize },

    /// The first step has no predecessor to read matrices from.
    #[error("step {0} is the first step and has no previous step")]
    NoPreviousStep(StepId),

    #[error("step {step} holds no similarity matrices for matcher {matcher}")]
    MissingSimMatrix { step: StepId, matcher: MatcherKey },

    #[error("no matching step is tagged with line {0}")]
    NoMatchersForLine(MatchLine),

    #[error("invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read or write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
