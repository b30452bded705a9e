//! Metadata graphs for structural matchers.
//!
//! One directed graph is built per (database side, threshold variant). It
//! encodes the database's tables, columns and its strongest functional
//! dependencies:
//!
//! ```text
//!            ROOT
//!           ⇅    ⇅
//!       TABLE     TABLE
//!       ⇅   ⇅       ⇅
//!    COLUMN COLUMN  COLUMN ───▶ FD ───▶ COLUMN
//! ```
//!
//! Containment edges (root/table, table/column) go both ways; dependency
//! edges run from each determinant column to the FD vertex and from the FD
//! vertex to the dependant column. External matchers only ever read the
//! exported GraphML file, never the in-memory graph.
//!
//! Vertex keys have the form `DB|{graph id}|{KIND}|{name}`. Graph ids come
//! from a [`GraphContext`], so graphs built through the same context never
//! share a key, even for identical table and column names.

mod builder;
mod catalog;
mod export;
mod threshold;

pub use catalog::{prepare_scenario, ExportedGraph, ScenarioGraphs};
pub use export::export_path;
pub use threshold::{FdBudgetRule, ThresholdVariant};

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::data::{ColumnRef, DatabaseSide, FeatureError};

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur while building or exporting metadata graphs.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid threshold variant '{0}': expected absolute_<N>, col_scale_<f> or gdep_threshold_<t>")]
    InvalidVariant(String),

    #[error("dependency references column {0} that has no vertex")]
    UnknownColumn(ColumnRef),

    #[error("failed to export graph to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Features(#[from] FeatureError),
}

/// Kind of resource a vertex stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Root,
    Table,
    Column,
    Fd,
    Ucc,
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexKind::Root => write!(f, "ROOT"),
            VertexKind::Table => write!(f, "TABLE"),
            VertexKind::Column => write!(f, "COLUMN"),
            VertexKind::Fd => write!(f, "FD"),
            VertexKind::Ucc => write!(f, "UCC"),
        }
    }
}

/// Identifier embedded in every vertex key of one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u32);

impl GraphId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out monotonically increasing graph ids.
///
/// Pass the same context to every graph build of a run; two contexts may
/// hand out the same id.
#[derive(Debug, Clone)]
pub struct GraphContext {
    next_id: u32,
}

impl GraphContext {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first_id: u32) -> Self {
        Self { next_id: first_id }
    }

    pub fn next_graph_id(&mut self) -> GraphId {
        let id = GraphId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Default for GraphContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A vertex of a metadata graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub key: String,
    pub kind: VertexKind,
}

/// Key of a vertex of graph `id`.
pub fn vertex_key(id: GraphId, kind: VertexKind, name: &str) -> String {
    format!("DB|{}|{}|{}", id, kind, name)
}

/// Key of a column vertex of graph `id`.
pub fn column_key(id: GraphId, table: &str, column: &str) -> String {
    vertex_key(id, VertexKind::Column, &format!("{}|{}", table, column))
}

/// The metadata graph of one database side and threshold variant.
#[derive(Debug, Clone)]
pub struct MetadataGraph {
    id: GraphId,
    side: DatabaseSide,
    variant: ThresholdVariant,
    graph: DiGraph<Vertex, ()>,
    vertex_index: HashMap<String, NodeIndex>,
    fd_budget: usize,
    fd_count: usize,
    ucc_count: usize,
}

impl MetadataGraph {
    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn side(&self) -> DatabaseSide {
        self.side
    }

    pub fn variant(&self) -> &ThresholdVariant {
        &self.variant
    }

    /// Number of top-ranked FDs considered, before exclusions.
    pub fn fd_budget(&self) -> usize {
        self.fd_budget
    }

    pub fn fd_vertex_count(&self) -> usize {
        self.fd_count
    }

    pub fn ucc_vertex_count(&self) -> usize {
        self.ucc_count
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_vertex(&self, key: &str) -> bool {
        self.vertex_index.contains_key(key)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.vertex_index.get(from), self.vertex_index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.graph.node_weights()
    }

    pub fn vertices_of_kind(&self, kind: VertexKind) -> impl Iterator<Item = &Vertex> {
        self.vertices().filter(move |vertex| vertex.kind == kind)
    }

    /// Keys of the vertices `key` has an outgoing edge to.
    pub fn successors(&self, key: &str) -> Vec<&str> {
        let Some(&idx) = self.vertex_index.get(key) else {
            return Vec::new();
        };
        let mut keys: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}
