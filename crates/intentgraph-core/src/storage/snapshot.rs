//! Single-document JSON snapshot of a research graph

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::graph::{
    GraphEdge, GraphNode, GraphParts, GraphStatistics, HypothesisPath, ReferencePolicy,
    ResearchGraph, SerendipityTrace,
};
use crate::domain::rate_distortion::RDCurve;
use crate::error::Result;

/// Everything needed to rebuild a graph, plus its statistics at export time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub id: String,
    #[serde(default)]
    pub reference_policy: ReferencePolicy,
    pub exported_at: DateTime<Utc>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub hypothesis_paths: Vec<HypothesisPath>,
    pub serendipity_traces: Vec<SerendipityTrace>,
    pub rd_curves: BTreeMap<String, RDCurve>,
    /// Informational; recomputed on import
    pub statistics: GraphStatistics,
}

impl GraphSnapshot {
    /// Copy the graph contents in insertion order
    pub fn capture(graph: &ResearchGraph) -> Self {
        Self {
            id: graph.id().to_string(),
            reference_policy: graph.policy(),
            exported_at: Utc::now(),
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
            hypothesis_paths: graph.hypothesis_paths().to_vec(),
            serendipity_traces: graph.traces().to_vec(),
            rd_curves: graph.rd_curves().clone(),
            statistics: graph.get_statistics(),
        }
    }

    /// Rebuild the graph, validating every record under the stored policy
    pub fn into_graph(self) -> Result<ResearchGraph> {
        ResearchGraph::from_parts(GraphParts {
            id: self.id,
            policy: self.reference_policy,
            nodes: self.nodes,
            edges: self.edges,
            hypothesis_paths: self.hypothesis_paths,
            traces: self.serendipity_traces,
            rd_curves: self.rd_curves,
        })
    }
}

/// Write the graph as one pretty-printed JSON document
pub fn export_json(graph: &ResearchGraph, path: &Path) -> Result<GraphSnapshot> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let snapshot = GraphSnapshot::capture(graph);
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &snapshot)?;
    writer.flush()?;

    info!(
        path = %path.display(),
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        "Exported graph snapshot"
    );
    Ok(snapshot)
}

/// Read a document written by [`export_json`]
pub fn import_json(path: &Path) -> Result<ResearchGraph> {
    let reader = BufReader::new(File::open(path)?);
    let snapshot: GraphSnapshot = serde_json::from_reader(reader)?;
    let graph = snapshot.into_graph()?;

    info!(path = %path.display(), nodes = graph.nodes().len(), "Imported graph snapshot");
    Ok(graph)
}
