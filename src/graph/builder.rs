//! Graph construction for metadata graphs.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::info;

use crate::config::GraphSettings;
use crate::data::{
    ColumnRef, DatabaseSide, FunctionalDependency, Scenario, UniqueColumnCombination,
};

use super::{
    column_key, vertex_key, GraphContext, GraphError, GraphResult, MetadataGraph,
    ThresholdVariant, Vertex, VertexKind,
};

impl MetadataGraph {
    /// Build the graph of one database side for one threshold variant.
    ///
    /// Construction happens in two phases:
    /// - Phase 1: root, table and column vertices with containment edges
    /// - Phase 2: the top `fd_budget` FDs by gpdep (and UCCs if enabled)
    ///
    /// Columns whose label is in `settings.excluded_columns` keep their
    /// vertex but are not linked to their table, and every dependency
    /// touching them is dropped. Exclusion happens after ranking, so a graph
    /// may hold fewer FD vertices than its budget.
    pub fn build(
        context: &mut GraphContext,
        scenario: &Scenario,
        side: DatabaseSide,
        variant: ThresholdVariant,
        settings: &GraphSettings,
    ) -> GraphResult<Self> {
        let fd_budget = variant.fd_budget(scenario, side, settings.fd_budget_cap);
        let mut graph = MetadataGraph {
            id: context.next_graph_id(),
            side,
            variant,
            graph: DiGraph::new(),
            vertex_index: HashMap::new(),
            fd_budget,
            fd_count: 0,
            ucc_count: 0,
        };
        let excluded: HashSet<&str> = settings.excluded_columns.iter().map(String::as_str).collect();
        let database = scenario.database(side);

        // Phase 1: containment
        let root = graph.add_vertex(VertexKind::Root, "");
        for table in database.tables() {
            let table_idx = graph.add_vertex(VertexKind::Table, table.name());
            graph.add_edge(root, table_idx, true);

            for column in table.columns() {
                let column_idx = graph.add_vertex(
                    VertexKind::Column,
                    &format!("{}|{}", table.name(), column.label()),
                );
                if excluded.contains(column.label()) {
                    continue;
                }
                graph.add_edge(table_idx, column_idx, true);
            }
        }

        info!(
            database = database.name(),
            variant = %graph.variant,
            fd_budget,
            "building metadata graph"
        );

        // Phase 2: dependencies
        for fd in database.metadata().ranked_fds().into_iter().take(fd_budget) {
            graph.add_fd(fd, &excluded)?;
        }
        if settings.include_uccs {
            for ucc in &database.metadata().uccs {
                graph.add_ucc(ucc, &excluded)?;
            }
        }

        Ok(graph)
    }

    fn add_vertex(&mut self, kind: VertexKind, name: &str) -> NodeIndex {
        let key = vertex_key(self.id, kind, name);
        if let Some(&idx) = self.vertex_index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(Vertex {
            key: key.clone(),
            kind,
        });
        self.vertex_index.insert(key, idx);
        idx
    }

    /// Simple graph: repeated edges between the same vertices collapse.
    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, both_directions: bool) {
        self.graph.update_edge(from, to, ());
        if both_directions {
            self.graph.update_edge(to, from, ());
        }
    }

    fn column_vertex(&self, column: &ColumnRef) -> GraphResult<NodeIndex> {
        self.vertex_index
            .get(&column_key(self.id, &column.table, &column.column))
            .copied()
            .ok_or_else(|| GraphError::UnknownColumn(column.clone()))
    }

    fn add_fd(&mut self, fd: &FunctionalDependency, excluded: &HashSet<&str>) -> GraphResult<()> {
        if fd.columns().any(|column| excluded.contains(column.column.as_str())) {
            return Ok(());
        }

        let determinant = fd
            .determinant
            .iter()
            .map(|column| self.column_vertex(column))
            .collect::<GraphResult<Vec<_>>>()?;
        let dependant = self.column_vertex(&fd.dependant)?;

        let fd_idx = self.add_vertex(VertexKind::Fd, &(self.fd_count + 1).to_string());
        for column_idx in determinant {
            self.add_edge(column_idx, fd_idx, false);
        }
        self.add_edge(fd_idx, dependant, false);
        self.fd_count += 1;
        Ok(())
    }

    /// Members and their UCC vertex are linked in both directions.
    fn add_ucc(
        &mut self,
        ucc: &UniqueColumnCombination,
        excluded: &HashSet<&str>,
    ) -> GraphResult<()> {
        if ucc
            .columns
            .iter()
            .any(|column| excluded.contains(column.column.as_str()))
        {
            return Ok(());
        }

        let columns = ucc
            .columns
            .iter()
            .map(|column| self.column_vertex(column))
            .collect::<GraphResult<Vec<_>>>()?;

        let ucc_idx = self.add_vertex(VertexKind::Ucc, &(self.ucc_count + 1).to_string());
        for column_idx in columns {
            self.add_edge(column_idx, ucc_idx, true);
        }
        self.ucc_count += 1;
        Ok(())
    }
}
