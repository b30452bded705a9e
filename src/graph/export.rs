//! GraphML export of metadata graphs.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use petgraph::visit::EdgeRef;

use crate::data::{DatabaseSide, Scenario};

use super::{GraphError, GraphResult, MetadataGraph};

/// Where the graph of (`variant`, `side`) of a scenario is exported:
/// `{graphs_root}/{dataset}/{scenario}/{variant}_{side}.graphml`.
pub fn export_path(
    graphs_root: &Path,
    scenario: &Scenario,
    side: DatabaseSide,
    variant: &str,
) -> PathBuf {
    graphs_root
        .join(scenario.dataset_name())
        .join(scenario.name())
        .join(format!("{}_{}.graphml", variant, side))
}

impl MetadataGraph {
    /// Write the graph as GraphML to `path`, creating parent directories.
    pub fn export(&self, path: &Path) -> GraphResult<()> {
        let to_export_error = |source| GraphError::Export {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(to_export_error)?;
        }
        let file = File::create(path).map_err(to_export_error)?;
        let mut writer = BufWriter::new(file);
        self.write_graphml(&mut writer).map_err(to_export_error)?;
        writer.flush().map_err(to_export_error)
    }

    /// Serialize as GraphML. Vertex keys are the node ids.
    pub fn write_graphml<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<graphml xmlns="http://graphml.graphdrawing.org/xmlns" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="http://graphml.graphdrawing.org/xmlns http://graphml.graphdrawing.org/xmlns/1.0/graphml.xsd">"#
        )?;
        writeln!(out, r#"    <graph edgedefault="directed">"#)?;
        for vertex in self.graph.node_weights() {
            writeln!(out, r#"        <node id="{}"/>"#, escape(&vertex.key))?;
        }
        for (i, edge) in self.graph.edge_references().enumerate() {
            writeln!(
                out,
                r#"        <edge id="{}" source="{}" target="{}"/>"#,
                i + 1,
                escape(&self.graph[edge.source()].key),
                escape(&self.graph[edge.target()].key)
            )?;
        }
        writeln!(out, "    </graph>")?;
        writeln!(out, "</graphml>")
    }
}

fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
