//! Building and exporting all graph artifacts of a scenario.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::Settings;
use crate::data::{DatabaseFeatures, DatabaseSide, Scenario};
use crate::similarity::DistributionDistance;

use super::{export_path, GraphContext, GraphResult, MetadataGraph, ThresholdVariant};

/// A built and exported graph.
#[derive(Debug, Clone)]
pub struct ExportedGraph {
    pub graph: MetadataGraph,
    pub path: PathBuf,
}

/// Every exported metadata graph of one scenario.
#[derive(Debug, Clone, Default)]
pub struct ScenarioGraphs {
    graphs: Vec<ExportedGraph>,
}

impl ScenarioGraphs {
    /// Build and export one graph per (configured variant, database side).
    ///
    /// Any export failure aborts.
    pub fn build(
        context: &mut GraphContext,
        scenario: &Scenario,
        settings: &Settings,
    ) -> GraphResult<Self> {
        let mut graphs = Vec::new();
        for label in &settings.graph.variants {
            let variant: ThresholdVariant = label.parse()?;
            for side in [DatabaseSide::Source, DatabaseSide::Target] {
                let started = Instant::now();
                let graph =
                    MetadataGraph::build(context, scenario, side, variant.clone(), &settings.graph)?;
                let path = export_path(&settings.paths.graphs_dir, scenario, side, label);
                graph.export(&path)?;
                debug!(
                    path = %path.display(),
                    vertices = graph.vertex_count(),
                    edges = graph.edge_count(),
                    fds = graph.fd_vertex_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "exported metadata graph"
                );
                graphs.push(ExportedGraph { graph, path });
            }
        }
        Ok(Self { graphs })
    }

    pub fn get(&self, side: DatabaseSide, variant: &str) -> Option<&ExportedGraph> {
        self.graphs
            .iter()
            .find(|exported| exported.graph.side() == side && exported.graph.variant().label() == variant)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportedGraph> {
        self.graphs.iter()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

/// Export everything the graph matchers read for a scenario: the features
/// of both databases and one graph per (variant, side).
pub fn prepare_scenario(
    context: &mut GraphContext,
    scenario: &Scenario,
    settings: &Settings,
    distance: &dyn DistributionDistance,
) -> GraphResult<ScenarioGraphs> {
    let features_dir = DatabaseFeatures::scenario_dir(&settings.paths.features_dir, scenario);
    for side in [DatabaseSide::Source, DatabaseSide::Target] {
        DatabaseFeatures::compute(scenario, side, distance).export(&features_dir)?;
    }

    let graphs = ScenarioGraphs::build(context, scenario, settings)?;
    info!(
        scenario = scenario.name(),
        graphs = graphs.len(),
        "prepared scenario artifacts"
    );
    Ok(graphs)
}
