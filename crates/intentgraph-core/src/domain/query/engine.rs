//! Multi-intent query engine
//!
//! Each intent retrieves the nodes tagged with exactly that intent string,
//! plus the edges touching them. Results from all intents are concatenated
//! and confidence is averaged over the returned nodes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::graph::{GraphEdge, GraphNode, ResearchDomain, ResearchGraph, ResearchIntent};

use super::decomposer::IntentDecomposer;

/// Per-intent slice of a query result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: String,
    /// Domain resolved from the intent; Virology for unknown tags
    pub domain: ResearchDomain,
    pub node_count: usize,
    pub edge_count: usize,
    /// Matching nodes under the current model
    pub evidence_count: usize,
}

/// Composite answer to a research question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub question: String,
    pub intents: Vec<String>,
    pub per_intent: Vec<IntentResult>,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub evidence_count: usize,
    /// Mean node confidence, 0 when no nodes matched
    pub confidence: f32,
}

/// Read-only query engine over a research graph
#[derive(Debug, Clone, Default)]
pub struct MultiIntentQueryEngine {
    decomposer: IntentDecomposer,
}

impl MultiIntentQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decomposer(decomposer: IntentDecomposer) -> Self {
        Self { decomposer }
    }

    /// Answer `question` across the given intents
    ///
    /// With no intents (or an empty list) the question is decomposed.
    /// Repeated intents are queried once, first occurrence wins, so a
    /// caller passing `["a", "a"]` gets one `per_intent` slice and the
    /// matching nodes are not counted twice in `evidence_count`.
    pub fn query(
        &self,
        graph: &ResearchGraph,
        question: &str,
        intents: Option<&[String]>,
    ) -> QueryResult {
        let requested: Vec<String> = match intents {
            Some(list) if !list.is_empty() => list.to_vec(),
            _ => self
                .decomposer
                .decompose(question)
                .into_iter()
                .map(|i| i.as_str().to_string())
                .collect(),
        };

        let mut seen = HashSet::new();
        let intents: Vec<String> = requested
            .into_iter()
            .filter(|i| seen.insert(i.clone()))
            .collect();

        let mut result = QueryResult {
            question: question.to_string(),
            intents: intents.clone(),
            per_intent: Vec::with_capacity(intents.len()),
            nodes: Vec::new(),
            edges: Vec::new(),
            evidence_count: 0,
            confidence: 0.0,
        };

        for intent in &intents {
            let (slice, nodes, edges) = query_intent(graph, intent);
            result.evidence_count += slice.evidence_count;
            result.nodes.extend(nodes);
            result.edges.extend(edges);
            result.per_intent.push(slice);
        }

        if !result.nodes.is_empty() {
            result.confidence = result.nodes.iter().map(|n| n.confidence).sum::<f32>()
                / result.nodes.len() as f32;
        }

        result
    }
}

/// Resolve an intent tag to its domain, falling back to Virology
pub fn domain_for_intent(intent: &str) -> ResearchDomain {
    match ResearchIntent::parse(intent) {
        Some(known) => known.domain(),
        None => {
            debug!(intent, "Unknown intent, resolving to Virology");
            ResearchDomain::Virology
        }
    }
}

fn query_intent(
    graph: &ResearchGraph,
    intent: &str,
) -> (IntentResult, Vec<GraphNode>, Vec<GraphEdge>) {
    let domain = domain_for_intent(intent);
    let nodes: Vec<GraphNode> = graph.nodes_for_intent(intent).into_iter().cloned().collect();

    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let edges: Vec<GraphEdge> = graph
        .edges()
        .iter()
        .filter(|e| ids.contains(e.source_id.as_str()) || ids.contains(e.target_id.as_str()))
        .cloned()
        .collect();

    debug!(intent, domain = %domain, nodes = nodes.len(), edges = edges.len(), "Queried intent");

    let slice = IntentResult {
        intent: intent.to_string(),
        domain,
        node_count: nodes.len(),
        edge_count: edges.len(),
        evidence_count: nodes.len(),
    };
    (slice, nodes, edges)
}
