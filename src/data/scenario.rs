//! Datasets and scenarios.

use std::path::{Path, PathBuf};

use super::database::{Database, DatabaseSide};

/// A named collection of scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub name: String,
    pub path: PathBuf,
}

impl Dataset {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// One matching problem: a source and a target database.
#[derive(Debug)]
pub struct Scenario {
    dataset: String,
    name: String,
    path: PathBuf,
    source: Database,
    target: Database,
}

impl Scenario {
    /// The scenario name is the last component of `path`.
    pub fn new(dataset: &Dataset, path: impl Into<PathBuf>, source: Database, target: Database) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            dataset: dataset.name.clone(),
            name,
            path,
            source,
            target,
        }
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &Database {
        &self.source
    }

    pub fn target(&self) -> &Database {
        &self.target
    }

    pub fn database(&self, side: DatabaseSide) -> &Database {
        match side {
            DatabaseSide::Source => &self.source,
            DatabaseSide::Target => &self.target,
        }
    }
}
