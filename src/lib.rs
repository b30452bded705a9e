//! # schemabench
//!
//! Evaluation harness for schema-matching algorithms: runs pluggable
//! matchers over pairs of database tables and scores them against ground
//! truth.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Scenario (source + target Database)               │
//! │  tables with global column offsets, FDs, UCCs            │
//! └─────────────────────────────────────────────────────────┘
//!            │                                │
//!            ▼ [graph]                        ▼ [matchtask]
//! ┌──────────────────────────┐   ┌──────────────────────────────────┐
//! │ MetadataGraph per        │   │ MatchTask                        │
//! │ (side, threshold variant)│   │  TablePairGeneration             │
//! │ → GraphML + features     │   │  Matching (line 1/2)             │
//! └──────────────────────────┘   │  SimMatrixBoosting               │
//!            │                   │  ground truth + evaluation       │
//!            │ exported files    └──────────────────────────────────┘
//!            ▼                                │
//! ┌──────────────────────────┐                ▼ [matching]
//! │ external embedding       │◀──HTTP── Prisma / Node2Vec matchers
//! │ service                  │          TwoOpt (local baseline)
//! └──────────────────────────┘
//! ```

pub mod config;
pub mod data;
pub mod graph;
pub mod matching;
pub mod matchtask;
pub mod similarity;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::data::{Database, DatabaseSide, Dataset, Scenario, Table};
    pub use crate::graph::{prepare_scenario, GraphContext, MetadataGraph, ScenarioGraphs};
    pub use crate::matching::{Matcher, MatcherEnvironment, MatcherKey, MatcherRegistry};
    pub use crate::matchtask::{build_pipeline, MatchTask, MatchStep, Metric, TablePair};
}
