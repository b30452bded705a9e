//! Per-column feature vectors exported for external graph matchers.
//!
//! The export is one JSON file per database:
//!
//! ```text
//! {features_dir}/{dataset}/{scenario}/{database}.json
//! {
//!   "Distribution": { "<table>": { "<column>": [f64, ...] } },
//!   "Entropy":      { "<table>": { "<column>": [f64, ...] } }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::column::Column;
use super::database::DatabaseSide;
use super::scenario::Scenario;
use crate::similarity::{average_length, entropy, DistributionDistance};

/// Errors raised while exporting features.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("failed to write features to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize features of database '{database}': {source}")]
    Serialize {
        database: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Kind of feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKind {
    /// Distances to every column of the source, then the target database.
    Distribution,
    /// Entropy, mean value length and one-hot datatype.
    Entropy,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Distribution => write!(f, "Distribution"),
            FeatureKind::Entropy => write!(f, "Entropy"),
        }
    }
}

type FeatureMap = BTreeMap<FeatureKind, BTreeMap<String, BTreeMap<String, Vec<f64>>>>;

/// Feature vectors of every column of one database.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseFeatures {
    database: String,
    features: FeatureMap,
}

impl DatabaseFeatures {
    pub fn compute(scenario: &Scenario, side: DatabaseSide, distance: &dyn DistributionDistance) -> Self {
        let database = scenario.database(side);
        let reference: Vec<&Column> = scenario
            .source()
            .columns()
            .chain(scenario.target().columns())
            .collect();

        let mut features = FeatureMap::new();
        for table in database.tables() {
            for column in table.columns() {
                let distribution: Vec<f64> = reference
                    .iter()
                    .map(|other| distance.distance(column.values(), other.values()))
                    .collect();

                let mut profile = vec![entropy(column.values()), average_length(column.values())];
                profile.extend(column.datatype().one_hot());

                for (kind, vector) in [
                    (FeatureKind::Distribution, distribution),
                    (FeatureKind::Entropy, profile),
                ] {
                    features
                        .entry(kind)
                        .or_default()
                        .entry(table.name().to_string())
                        .or_default()
                        .insert(column.label().to_string(), vector);
                }
            }
        }

        Self {
            database: database.name().to_string(),
            features,
        }
    }

    pub fn get(&self, kind: FeatureKind, table: &str, column: &str) -> Option<&[f64]> {
        self.features
            .get(&kind)?
            .get(table)?
            .get(column)
            .map(Vec::as_slice)
    }

    /// Directory holding the feature files of one scenario.
    pub fn scenario_dir(features_root: &Path, scenario: &Scenario) -> PathBuf {
        features_root
            .join(scenario.dataset_name())
            .join(scenario.name())
    }

    /// Write `{dir}/{database}.json`, creating `dir` if needed.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, FeatureError> {
        fs::create_dir_all(dir).map_err(|source| FeatureError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let json = serde_json::to_string(&self.features).map_err(|source| FeatureError::Serialize {
            database: self.database.clone(),
            source,
        })?;

        let path = dir.join(format!("{}.json", self.database));
        fs::write(&path, json).map_err(|source| FeatureError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
