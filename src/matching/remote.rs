//! Graph matchers backed by the external embedding service.
//!
//! Both matchers locate the exported metadata graphs of their threshold
//! variant by path, send a flat parameter list and parse the returned
//! matrix. They never look at the in-memory graphs.

use std::path::PathBuf;

use ndarray::Array2;
use serde::Deserialize;

use crate::data::{DatabaseFeatures, DatabaseSide, FeatureKind};
use crate::graph::export_path;
use crate::matchtask::TablePair;

use super::registry::MatcherEnvironment;
use super::service::parse_matrix;
use super::{Matcher, MatcherError, MatcherResult};

const DEFAULT_VARIANT: &str = "gdep_threshold_0.00";

fn default_variant() -> String {
    DEFAULT_VARIANT.to_string()
}

/// Parameters of [`PrismaMatcher`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrismaParams {
    /// Threshold variant of the graphs to align.
    pub variant: String,
    pub gamma_struc_attr: f64,
    pub postprocessing: bool,
    pub threshold_matches: bool,
    pub kind_of_feature: FeatureKind,
}

impl Default for PrismaParams {
    fn default() -> Self {
        Self {
            variant: default_variant(),
            gamma_struc_attr: 0.5,
            postprocessing: true,
            threshold_matches: true,
            kind_of_feature: FeatureKind::Distribution,
        }
    }
}

/// Parameters of [`Node2VecMatcher`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Node2VecParams {
    /// Threshold variant of the graphs to embed.
    pub variant: String,
    pub drop_columns: f64,
    pub drop_constraints: f64,
    pub gamma_struc: i64,
    pub gamma_attr: i64,
    /// Keep only the k highest similarities per row.
    pub filter_k_nearest: bool,
}

impl Default for Node2VecParams {
    fn default() -> Self {
        Self {
            variant: default_variant(),
            drop_columns: 0.0,
            drop_constraints: 0.0,
            gamma_struc: 1,
            gamma_attr: 1,
            filter_k_nearest: true,
        }
    }
}

/// Aligns source and target graph embeddings with the PRISMA model.
#[derive(Debug, Clone)]
pub struct PrismaMatcher {
    params: PrismaParams,
    environment: MatcherEnvironment,
}

impl PrismaMatcher {
    pub fn new(params: PrismaParams, environment: MatcherEnvironment) -> Self {
        Self {
            params,
            environment,
        }
    }

    pub fn params(&self) -> &PrismaParams {
        &self.params
    }

    /// The flat parameter list sent for `pair`.
    pub fn request(&self, pair: &TablePair<'_>) -> MatcherResult<Vec<(String, String)>> {
        let mut request = base_request(&self.environment, pair, &self.params.variant)?;
        request.extend(named([
            ("xNetMFGammaStrucAttr", format!("{:?}", self.params.gamma_struc_attr)),
            ("postprocessing", self.params.postprocessing.to_string()),
            ("thresholdMatches", self.params.threshold_matches.to_string()),
            ("kind_of_feature", self.params.kind_of_feature.to_string()),
        ]));
        Ok(request)
    }
}

impl Matcher for PrismaMatcher {
    fn name(&self) -> &str {
        "prisma"
    }

    fn match_pair(&self, pair: &TablePair<'_>) -> MatcherResult<Array2<f32>> {
        let request = self.request(pair)?;
        call(&self.environment, pair, &request)
    }
}

/// Node2Vec-style structural embeddings compared across the two graphs.
#[derive(Debug, Clone)]
pub struct Node2VecMatcher {
    params: Node2VecParams,
    environment: MatcherEnvironment,
}

impl Node2VecMatcher {
    pub fn new(params: Node2VecParams, environment: MatcherEnvironment) -> Self {
        Self {
            params,
            environment,
        }
    }

    pub fn params(&self) -> &Node2VecParams {
        &self.params
    }

    /// The flat parameter list sent for `pair`.
    pub fn request(&self, pair: &TablePair<'_>) -> MatcherResult<Vec<(String, String)>> {
        let mut request = base_request(&self.environment, pair, &self.params.variant)?;
        // The service expects Python literals for this flag.
        let k_highest = if self.params.filter_k_nearest { "True" } else { "False" };
        request.extend(named([
            ("get_k_highest_sm", k_highest.to_string()),
            ("dropColumns", format!("{:?}", self.params.drop_columns)),
            ("dropConstraints", format!("{:?}", self.params.drop_constraints)),
            ("xNetMFGammaStruc", self.params.gamma_struc.to_string()),
            ("xNetMFGammaAttr", self.params.gamma_attr.to_string()),
        ]));
        Ok(request)
    }
}

impl Matcher for Node2VecMatcher {
    fn name(&self) -> &str {
        "node2vec"
    }

    fn match_pair(&self, pair: &TablePair<'_>) -> MatcherResult<Array2<f32>> {
        let request = self.request(pair)?;
        call(&self.environment, pair, &request)
    }
}

fn named<const N: usize>(params: [(&'static str, String); N]) -> impl Iterator<Item = (String, String)> {
    params
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
}

/// Exported graph of `side`, or `GraphNotBuilt` if the file is missing.
fn graph_path(
    environment: &MatcherEnvironment,
    pair: &TablePair<'_>,
    side: DatabaseSide,
    variant: &str,
) -> MatcherResult<PathBuf> {
    let path = export_path(&environment.graphs_dir, pair.scenario(), side, variant);
    if !path.is_file() {
        return Err(MatcherError::GraphNotBuilt {
            variant: variant.to_string(),
            path,
        });
    }
    Ok(path)
}

fn base_request(
    environment: &MatcherEnvironment,
    pair: &TablePair<'_>,
    variant: &str,
) -> MatcherResult<Vec<(String, String)>> {
    let source_graph = graph_path(environment, pair, DatabaseSide::Source, variant)?;
    let target_graph = graph_path(environment, pair, DatabaseSide::Target, variant)?;
    let features_dir = DatabaseFeatures::scenario_dir(&environment.features_dir, pair.scenario());

    Ok(named([
        ("source_graph_path", source_graph.display().to_string()),
        ("source_table", pair.source_table().name().to_string()),
        ("target_graph_path", target_graph.display().to_string()),
        ("target_table", pair.target_table().name().to_string()),
        ("features_dir", features_dir.display().to_string()),
    ])
    .collect())
}

fn call(
    environment: &MatcherEnvironment,
    pair: &TablePair<'_>,
    request: &[(String, String)],
) -> MatcherResult<Array2<f32>> {
    let body = environment.service.send_match_request(request)?;
    let (rows, cols) = pair.shape();
    Ok(parse_matrix(&body, rows, cols)?)
}
