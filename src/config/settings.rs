//! TOML-based configuration for schemabench.
//!
//! Supports a config file (schemabench.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [paths]
//! ground_truth_dir = "ground_truth"
//! graphs_dir = "target/graphs"
//!
//! [cache]
//! read = true
//! write = true
//!
//! [graph]
//! variants = ["absolute_5", "col_scale_0.5", "gdep_threshold_0.10"]
//! excluded_columns = ["phone"]
//!
//! [service]
//! url = "http://${MATCH_SERVER}/match"
//!
//! [[pipeline.steps]]
//! kind = "table_pair_generation"
//!
//! [[pipeline.steps]]
//! kind = "matching"
//! line = 1
//!
//! [[pipeline.steps.matchers]]
//! group = "baseline"
//! matcher = "two_opt"
//! params = { max_iterations = 500 }
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    /// Input and output locations.
    pub paths: PathSettings,

    /// Similarity-matrix cache switches.
    pub cache: CacheSettings,

    /// Metadata graph construction.
    pub graph: GraphSettings,

    /// External embedding service.
    pub service: ServiceSettings,

    /// Ordered match steps.
    pub pipeline: PipelineSettings,
}

/// Input and output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathSettings {
    /// Ground-truth directory, relative to each scenario directory.
    pub ground_truth_dir: String,

    /// Root for saved similarity matrices.
    pub results_dir: PathBuf,

    /// Root for exported metadata graphs.
    pub graphs_dir: PathBuf,

    /// Root for exported database features.
    pub features_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            ground_truth_dir: "ground_truth".to_string(),
            results_dir: PathBuf::from("target/results"),
            graphs_dir: PathBuf::from("target/graphs"),
            features_dir: PathBuf::from("target/features"),
        }
    }
}

/// Similarity-matrix cache switches.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Load previously saved matrices instead of running matchers.
    pub read: bool,

    /// Count saved matrices as cache writes.
    pub write: bool,
}

/// Metadata graph construction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Threshold variants to build one graph for, per database side.
    pub variants: Vec<String>,

    /// Column labels that get a vertex but no table edge and no dependencies.
    pub excluded_columns: Vec<String>,

    /// Add unique column combination vertices.
    pub include_uccs: bool,

    /// Upper bound on the number of FDs encoded in one graph.
    pub fd_budget_cap: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        let levels = [
            "0.00", "0.01", "0.02", "0.04", "0.06", "0.08", "0.10", "0.15", "0.20", "0.30", "0.40",
            "0.50", "1.00",
        ];
        Self {
            variants: levels
                .iter()
                .map(|level| format!("gdep_threshold_{}", level))
                .collect(),
            excluded_columns: Vec::new(),
            include_uccs: false,
            fd_budget_cap: 5000,
        }
    }
}

/// External embedding service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Endpoint receiving match requests (supports ${ENV_VAR} expansion).
    pub url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5004/match".to_string(),
        }
    }
}

impl ServiceSettings {
    /// Get the endpoint with environment variables expanded.
    pub fn resolved_url(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.url)
    }
}

/// Ordered match steps.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub steps: Vec<StepSettings>,
}

/// Kind of a configured match step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    TablePairGeneration,
    Matching,
    SimMatrixBoosting,
}

/// Boosting function of a boosting step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostingKind {
    #[default]
    Identity,
    MinMax,
}

/// One configured match step.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StepSettings {
    pub kind: StepKind,

    #[serde(default = "default_true")]
    pub run: bool,

    #[serde(default = "default_true")]
    pub save: bool,

    #[serde(default = "default_true")]
    pub evaluate: bool,

    /// Line tag (1 or 2) of matching and boosting steps.
    #[serde(default)]
    pub line: Option<u8>,

    #[serde(default)]
    pub boosting: BoostingKind,

    #[serde(default)]
    pub matchers: Vec<MatcherSettings>,
}

fn default_true() -> bool {
    true
}

/// One matcher instance inside a matching step.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatcherSettings {
    /// Group the matcher is listed under.
    pub group: String,

    /// Registry name of the matcher implementation.
    pub matcher: String,

    /// Matcher-specific parameters.
    #[serde(default)]
    pub params: toml::Table,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SCHEMABENCH_CONFIG`
    /// 2. `./schemabench.toml`
    /// 3. `~/.config/schemabench/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SCHEMABENCH_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("schemabench.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("schemabench").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// True if any configured step wants its results evaluated.
    pub fn any_evaluate(&self) -> bool {
        self.pipeline.steps.iter().any(|step| step.evaluate)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        for (position, step) in self.pipeline.steps.iter().enumerate() {
            match step.kind {
                StepKind::TablePairGeneration => {
                    if !step.matchers.is_empty() {
                        return Err(SettingsError::InvalidConfig(format!(
                            "step {} generates table pairs and cannot list matchers",
                            position
                        )));
                    }
                }
                StepKind::Matching | StepKind::SimMatrixBoosting => match step.line {
                    Some(1) | Some(2) => {}
                    Some(other) => {
                        return Err(SettingsError::InvalidConfig(format!(
                            "step {} has unsupported line {}",
                            position, other
                        )))
                    }
                    None => {
                        return Err(SettingsError::InvalidConfig(format!(
                            "step {} is missing its line",
                            position
                        )))
                    }
                },
            }
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
