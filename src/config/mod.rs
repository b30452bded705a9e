//! Configuration module for schemabench.
//!
//! Handles the TOML settings file, environment variable expansion and the
//! declarative description of the match-step pipeline.

mod settings;

pub use settings::{
    expand_env_vars, BoostingKind, CacheSettings, GraphSettings, MatcherSettings, PathSettings,
    PipelineSettings, ServiceSettings, Settings, SettingsError, StepKind, StepSettings,
};
