//! In-memory model of the benchmark data.
//!
//! A [`Scenario`] pairs a source and a target [`Database`]. Each database owns
//! its [`Table`]s, each table owns its [`Column`]s. When a database is built,
//! every table receives an offset into the database's global column index
//! space, so that per-table results can be placed into database-wide
//! matrices:
//!
//! ```text
//! database:  | users (3 cols) | orders (2 cols) | items (4 cols) |
//! offsets:     0                3                 5               9 = num_columns
//! ```
//!
//! Loading datasets from disk is left to the caller; this module only
//! provides the validated constructors.

mod column;
mod database;
mod dependency;
pub mod features;
mod scenario;
mod table;
mod tokenizer;

pub use column::{Column, Datatype};
pub use database::{Database, DatabaseSide};
pub use dependency::{
    ColumnRef, DatabaseMetadata, DependencyScore, FunctionalDependency, UniqueColumnCombination,
};
pub use features::{DatabaseFeatures, FeatureError, FeatureKind};
pub use scenario::{Dataset, Scenario};
pub use table::Table;
pub use tokenizer::{NGramTokenizer, Tokenizer, TokenSet};

use thiserror::Error;

/// Result type for data model operations.
pub type DataResult<T> = Result<T, DataError>;

/// Errors raised while assembling or querying the data model.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("table '{table}' not found in database '{database}'")]
    TableNotFound { database: String, table: String },

    #[error("duplicate table '{table}' in database '{database}'")]
    DuplicateTable { database: String, table: String },

    #[error("global column index {index} out of range for database '{database}' ({num_columns} columns)")]
    ColumnIndexOutOfRange {
        database: String,
        index: usize,
        num_columns: usize,
    },

    #[error("dependency references unknown column {0}")]
    UnknownDependencyColumn(ColumnRef),
}
