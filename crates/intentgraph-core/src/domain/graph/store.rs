//! In-memory research graph store
//!
//! The store exclusively owns every node and edge, indexed by id with
//! insertion order preserved. Hypothesis paths and serendipity traces refer
//! to store ids by value. A single owner mutates the store; wrap it in a
//! mutex to share it between writers.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::rate_distortion::RDCurve;
use crate::error::{Error, Result};

use super::edge::{EdgeSpec, EdgeType, GraphEdge};
use super::event::GraphEvent;
use super::hypothesis::{HypothesisPath, HypothesisType};
use super::node::{GraphNode, NodePayload};
use super::research::ResearchDomain;
use super::trace::{ExplorationStep, SerendipityTrace};

/// How the store treats references to ids it does not hold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Reject edges and paths that reference unknown ids
    #[default]
    Strict,
    /// Accept dangling references (forward references while building)
    Permissive,
}

impl ReferencePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Permissive => "permissive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "permissive" => Some(Self::Permissive),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed multi-domain research graph
#[derive(Debug, Clone)]
pub struct ResearchGraph {
    id: String,
    policy: ReferencePolicy,
    nodes: Vec<GraphNode>,
    node_index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<String, usize>,
    hypothesis_paths: Vec<HypothesisPath>,
    traces: Vec<SerendipityTrace>,
    trace_index: HashMap<String, usize>,
    rd_curves: BTreeMap<String, RDCurve>,
    events: Vec<GraphEvent>,
}

impl Default for ResearchGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ResearchGraph {
    /// Create an empty graph with the strict reference policy
    pub fn new() -> Self {
        Self::with_policy(ReferencePolicy::default())
    }

    /// Create an empty graph with the given reference policy
    pub fn with_policy(policy: ReferencePolicy) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            policy,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
            hypothesis_paths: Vec::new(),
            traces: Vec::new(),
            trace_index: HashMap::new(),
            rd_curves: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: ReferencePolicy) {
        self.policy = policy;
    }

    // ========== Node Operations ==========

    /// Insert a caller-built node
    ///
    /// Fails when the confidence lies outside [0, 1] or the id is taken.
    pub fn add_node(&mut self, node: GraphNode) -> Result<&GraphNode> {
        if let Err(err) = check_unit("node.confidence", node.confidence) {
            return Err(self.reject("add_node", err));
        }
        if self.node_index.contains_key(&node.id) {
            let err = Error::InvalidInput(format!("node id '{}' already exists", node.id));
            return Err(self.reject("add_node", err));
        }
        Ok(self.insert_node(node))
    }

    /// Add a virology node (spike protein, receptor binding, ...)
    pub fn add_virology_node(
        &mut self,
        topic: impl Into<String>,
        details: impl Into<String>,
        intent: Option<&str>,
    ) -> GraphNode {
        self.add_typed_node(
            NodePayload::Virology {
                topic: topic.into(),
                details: details.into(),
            },
            intent,
        )
    }

    /// Add an immunology node (antibody response, T-cell response, ...)
    pub fn add_immunology_node(
        &mut self,
        topic: impl Into<String>,
        details: impl Into<String>,
        intent: Option<&str>,
    ) -> GraphNode {
        self.add_typed_node(
            NodePayload::Immunology {
                topic: topic.into(),
                details: details.into(),
            },
            intent,
        )
    }

    /// Add a variant node with its ordered mutation list
    pub fn add_variant_node(
        &mut self,
        variant: impl Into<String>,
        mutations: Vec<String>,
        intent: Option<&str>,
    ) -> GraphNode {
        self.add_typed_node(
            NodePayload::Genomics {
                variant: variant.into(),
                mutations,
            },
            intent,
        )
    }

    /// Add a treatment node
    pub fn add_treatment_node(
        &mut self,
        therapy: impl Into<String>,
        mechanism: impl Into<String>,
        intent: Option<&str>,
    ) -> GraphNode {
        self.add_typed_node(
            NodePayload::Treatment {
                therapy: therapy.into(),
                mechanism: mechanism.into(),
            },
            intent,
        )
    }

    /// Add a public-health policy node
    pub fn add_public_health_node(
        &mut self,
        policy: impl Into<String>,
        effect: impl Into<String>,
        intent: Option<&str>,
    ) -> GraphNode {
        self.add_typed_node(
            NodePayload::PublicHealth {
                policy: policy.into(),
                effect: effect.into(),
            },
            intent,
        )
    }

    fn add_typed_node(&mut self, payload: NodePayload, intent: Option<&str>) -> GraphNode {
        let mut node = GraphNode::new(payload);
        if let Some(intent) = intent {
            node.intent = intent.to_string();
        }
        // fresh id, zero confidence: nothing to validate
        self.insert_node(node).clone()
    }

    fn insert_node(&mut self, node: GraphNode) -> &GraphNode {
        debug!(node_id = %node.id, domain = %node.domain(), intent = %node.intent, "Adding node");
        self.events.push(GraphEvent::NodeAdded {
            node_id: node.id.clone(),
            domain: node.domain(),
            intent: node.intent.clone(),
            timestamp: Utc::now(),
        });
        let idx = self.nodes.len();
        self.node_index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        &self.nodes[idx]
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|idx| &self.nodes[*idx])
    }

    /// Get a node by ID, failing when absent
    pub fn require_node(&self, id: &str) -> Result<&GraphNode> {
        self.get_node(id).ok_or_else(|| Error::NodeNotFound(id.to_string()))
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Nodes whose payload belongs to `domain`
    pub fn nodes_by_domain(&self, domain: ResearchDomain) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.domain() == domain).collect()
    }

    /// Nodes whose intent tag equals `intent` exactly
    pub fn nodes_for_intent(&self, intent: &str) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.intent == intent).collect()
    }

    // ========== Edge Operations ==========

    /// Add a causal edge; weight equals confidence
    pub fn add_causal_edge(&mut self, spec: EdgeSpec, confidence: f32) -> Result<GraphEdge> {
        if let Err(err) = check_unit("edge.confidence", confidence) {
            return Err(self.reject("add_causal_edge", err));
        }
        self.insert_edge("add_causal_edge", GraphEdge::causal(spec, confidence))
    }

    /// Add a correlative edge; weight and confidence equal `|correlation|`
    pub fn add_correlative_edge(&mut self, spec: EdgeSpec, correlation: f32) -> Result<GraphEdge> {
        if let Err(err) = check_range("edge.correlation", correlation, -1.0, 1.0) {
            return Err(self.reject("add_correlative_edge", err));
        }
        self.insert_edge("add_correlative_edge", GraphEdge::correlative(spec, correlation))
    }

    fn insert_edge(&mut self, operation: &str, edge: GraphEdge) -> Result<GraphEdge> {
        if let Err(err) = self.check_edge_endpoints(&edge) {
            return Err(self.reject(operation, err));
        }

        debug!(
            edge_id = %edge.id,
            edge_type = %edge.edge_type,
            source = %edge.source_id,
            target = %edge.target_id,
            "Adding edge"
        );
        self.events.push(GraphEvent::EdgeAdded {
            edge_id: edge.id.clone(),
            edge_type: edge.edge_type,
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            timestamp: Utc::now(),
        });
        self.edge_index.insert(edge.id.clone(), self.edges.len());
        self.edges.push(edge.clone());
        Ok(edge)
    }

    /// Endpoints must exist under Strict, and stored endpoints must match
    /// the domains the edge claims for them
    fn check_edge_endpoints(&self, edge: &GraphEdge) -> Result<()> {
        let ends = [
            ("source", &edge.source_id, edge.source_domain),
            ("target", &edge.target_id, edge.target_domain),
        ];
        for (end, id, domain) in ends {
            match self.get_node(id) {
                Some(node) if node.domain() != domain => {
                    return Err(Error::InvalidInput(format!(
                        "edge {} '{}' is labelled {} but the node is {}",
                        end,
                        id,
                        domain,
                        node.domain()
                    )));
                }
                Some(_) => {}
                None => {
                    let message =
                        format!("edge {} '{}' does not reference an existing node", end, id);
                    match self.policy {
                        ReferencePolicy::Strict => {
                            return Err(Error::ReferentialIntegrity(message));
                        }
                        ReferencePolicy::Permissive => warn!(edge_id = %edge.id, "{}", message),
                    }
                }
            }
        }
        Ok(())
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edge_index.get(id).map(|idx| &self.edges[*idx])
    }

    /// Get an edge by ID, failing when absent
    pub fn require_edge(&self, id: &str) -> Result<&GraphEdge> {
        self.get_edge(id).ok_or_else(|| Error::EdgeNotFound(id.to_string()))
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Edges of one type
    pub fn edges_by_type(&self, edge_type: EdgeType) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.edge_type == edge_type).collect()
    }

    /// Edges whose source and target domains differ
    pub fn cross_domain_edges(&self) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.is_cross_domain()).collect()
    }

    /// Edges with `node_id` as source or target
    pub fn edges_touching(&self, node_id: &str) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.touches(node_id)).collect()
    }

    // ========== Graph Traversal ==========

    /// All simple directed paths from `start` to `end`
    ///
    /// Each path lists node ids including both ends. Partial paths longer
    /// than `max_depth` nodes are abandoned.
    pub fn find_paths(&self, start: &str, end: &str, max_depth: usize) -> Vec<Vec<String>> {
        let mut paths = Vec::new();
        let mut current = vec![start.to_string()];
        let mut visited = HashSet::new();

        self.dfs_paths(start, end, &mut current, &mut visited, &mut paths, max_depth);
        paths
    }

    fn dfs_paths(
        &self,
        current: &str,
        target: &str,
        path: &mut Vec<String>,
        visited: &mut HashSet<String>,
        paths: &mut Vec<Vec<String>>,
        max_depth: usize,
    ) {
        if path.len() > max_depth {
            return;
        }
        if current == target {
            paths.push(path.clone());
            return;
        }

        visited.insert(current.to_string());
        for edge in &self.edges {
            if edge.source_id == current && !visited.contains(&edge.target_id) {
                path.push(edge.target_id.clone());
                self.dfs_paths(&edge.target_id, target, path, visited, paths, max_depth);
                path.pop();
            }
        }
        visited.remove(current);
    }

    // ========== Hypothesis Paths ==========

    /// Record an immutable hypothesis path
    pub fn add_hypothesis_path(
        &mut self,
        hypothesis_type: HypothesisType,
        description: impl Into<String>,
        node_sequence: Vec<String>,
        edge_sequence: Vec<String>,
        confidence: f32,
        coverage: f32,
    ) -> Result<HypothesisPath> {
        let checked = check_unit("path.total_confidence", confidence)
            .and_then(|_| check_unit("path.evidence_coverage", coverage))
            .and_then(|_| self.check_path_references(&node_sequence, &edge_sequence));
        if let Err(err) = checked {
            return Err(self.reject("add_hypothesis_path", err));
        }

        let path = HypothesisPath::new(
            hypothesis_type,
            description,
            node_sequence,
            edge_sequence,
            confidence,
            coverage,
        );
        self.events.push(GraphEvent::HypothesisRecorded {
            path_id: path.id.clone(),
            hypothesis_type,
            timestamp: Utc::now(),
        });
        self.hypothesis_paths.push(path.clone());
        Ok(path)
    }

    fn check_path_references(&self, nodes: &[String], edges: &[String]) -> Result<()> {
        let missing_node = nodes.iter().find(|id| !self.node_index.contains_key(*id));
        let missing_edge = edges.iter().find(|id| !self.edge_index.contains_key(*id));

        let message = match (missing_node, missing_edge) {
            (Some(id), _) => format!("path node '{}' does not exist", id),
            (None, Some(id)) => format!("path edge '{}' does not exist", id),
            (None, None) => return Ok(()),
        };
        match self.policy {
            ReferencePolicy::Strict => Err(Error::ReferentialIntegrity(message)),
            ReferencePolicy::Permissive => {
                warn!("{}", message);
                Ok(())
            }
        }
    }

    pub fn hypothesis_paths(&self) -> &[HypothesisPath] {
        &self.hypothesis_paths
    }

    // ========== Serendipity Traces ==========

    /// Start an empty trace and return its id
    pub fn create_trace(
        &mut self,
        session_id: impl Into<String>,
        question: impl Into<String>,
    ) -> String {
        let trace = SerendipityTrace::new(session_id, question);
        let trace_id = trace.id.clone();

        info!(trace_id = %trace_id, session_id = %trace.session_id, "Created serendipity trace");
        self.events.push(GraphEvent::TraceCreated {
            trace_id: trace_id.clone(),
            session_id: trace.session_id.clone(),
            timestamp: Utc::now(),
        });
        self.trace_index.insert(trace_id.clone(), self.traces.len());
        self.traces.push(trace);
        trace_id
    }

    /// Append an exploration step to a trace
    pub fn add_step(
        &mut self,
        trace_id: &str,
        hypothesis: HypothesisType,
        query: impl Into<String>,
        domains: Vec<ResearchDomain>,
        evidence_count: usize,
        confidence: f32,
    ) -> Result<ExplorationStep> {
        let idx = match self.trace_index.get(trace_id) {
            Some(idx) => *idx,
            None => {
                let err = Error::TraceNotFound(trace_id.to_string());
                return Err(self.reject("add_step", err));
            }
        };
        if let Err(err) = check_unit("step.confidence", confidence) {
            return Err(self.reject("add_step", err));
        }

        let (step, jumped) =
            self.traces[idx].push_step(hypothesis, query, domains, evidence_count, confidence);
        let step = step.clone();

        debug!(
            trace_id = %trace_id,
            step = step.step_number,
            evidence = evidence_count,
            cross_domain_jump = jumped,
            "Appended exploration step"
        );
        self.events.push(GraphEvent::StepAppended {
            trace_id: trace_id.to_string(),
            step_number: step.step_number,
            cross_domain_jump: jumped,
            timestamp: Utc::now(),
        });
        Ok(step)
    }

    /// Get a trace by ID
    pub fn trace(&self, trace_id: &str) -> Option<&SerendipityTrace> {
        self.trace_index.get(trace_id).map(|idx| &self.traces[*idx])
    }

    pub fn traces(&self) -> &[SerendipityTrace] {
        &self.traces
    }

    // ========== Rate-Distortion Curves ==========

    /// Store a measured curve for an intent, replacing any previous one
    ///
    /// Redundancies must lie in `[0, 1]`.
    pub fn add_rd_curve(
        &mut self,
        intent: impl Into<String>,
        batch_sizes: &[u32],
        redundancies: &[f64],
    ) -> Result<&RDCurve> {
        match RDCurve::from_measurements(batch_sizes, redundancies) {
            Some(curve) => self.insert_rd_curve("add_rd_curve", intent.into(), curve),
            None => {
                let err = Error::InvalidInput(format!(
                    "{} batch sizes but {} redundancies",
                    batch_sizes.len(),
                    redundancies.len()
                ));
                Err(self.reject("add_rd_curve", err))
            }
        }
    }

    /// Store a computed curve for an intent, replacing any previous one
    pub fn record_rd_curve(
        &mut self,
        intent: impl Into<String>,
        curve: RDCurve,
    ) -> Result<&RDCurve> {
        self.insert_rd_curve("record_rd_curve", intent.into(), curve)
    }

    fn insert_rd_curve(
        &mut self,
        operation: &str,
        intent: String,
        curve: RDCurve,
    ) -> Result<&RDCurve> {
        if let Err(err) = check_curve(&curve) {
            return Err(self.reject(operation, err));
        }
        self.events.push(GraphEvent::RdCurveRecorded {
            intent: intent.clone(),
            points: curve.len(),
            timestamp: Utc::now(),
        });
        self.rd_curves.insert(intent.clone(), curve);
        Ok(&self.rd_curves[&intent])
    }

    pub fn rd_curve(&self, intent: &str) -> Option<&RDCurve> {
        self.rd_curves.get(intent)
    }

    pub fn rd_curves(&self) -> &BTreeMap<String, RDCurve> {
        &self.rd_curves
    }

    // ========== Audit Trail ==========

    /// Events recorded since the graph was created or loaded
    pub fn events(&self) -> &[GraphEvent] {
        &self.events
    }

    fn reject(&mut self, operation: &str, err: Error) -> Error {
        warn!(operation, error = %err, "Rejected graph mutation");
        self.events.push(GraphEvent::rejected(operation, err.to_string()));
        err
    }

    // ========== Statistics ==========

    /// Aggregate counts over the current contents
    pub fn get_statistics(&self) -> GraphStatistics {
        let mut causal_edges = 0;
        let mut correlative_edges = 0;
        let mut cross_domain_edges = 0;
        for edge in &self.edges {
            match edge.edge_type {
                EdgeType::Causal => causal_edges += 1,
                EdgeType::Correlative => correlative_edges += 1,
            }
            if edge.is_cross_domain() {
                cross_domain_edges += 1;
            }
        }

        let domains: HashSet<ResearchDomain> = self.nodes.iter().map(|n| n.domain()).collect();

        let avg_trace_diversity = if self.traces.is_empty() {
            0.0
        } else {
            self.traces.iter().map(|t| t.diversity_score()).sum::<f32>() / self.traces.len() as f32
        };

        GraphStatistics {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            causal_edges,
            correlative_edges,
            cross_domain_edges,
            hypothesis_paths: self.hypothesis_paths.len(),
            serendipity_traces: self.traces.len(),
            rd_curves: self.rd_curves.len(),
            domains_covered: domains.len(),
            avg_trace_diversity,
        }
    }

    // ========== Snapshot Support ==========

    /// Rebuild a graph from exported parts, preserving ids and order
    ///
    /// Imported records pass the same checks as live mutations under the
    /// imported policy. Duplicate ids are `Parse` errors.
    pub(crate) fn from_parts(parts: GraphParts) -> Result<Self> {
        let mut graph = Self::with_policy(parts.policy);
        graph.id = parts.id;

        for node in parts.nodes {
            if graph.node_index.contains_key(&node.id) {
                return Err(Error::Parse(format!("duplicate node id '{}'", node.id)));
            }
            check_unit("node.confidence", node.confidence)?;
            graph.node_index.insert(node.id.clone(), graph.nodes.len());
            graph.nodes.push(node);
        }
        for edge in parts.edges {
            if graph.edge_index.contains_key(&edge.id) {
                return Err(Error::Parse(format!("duplicate edge id '{}'", edge.id)));
            }
            check_edge_values(&edge)?;
            graph.check_edge_endpoints(&edge)?;
            graph.edge_index.insert(edge.id.clone(), graph.edges.len());
            graph.edges.push(edge);
        }

        let mut path_ids = HashSet::new();
        for path in parts.hypothesis_paths {
            if !path_ids.insert(path.id.clone()) {
                return Err(Error::Parse(format!("duplicate hypothesis path id '{}'", path.id)));
            }
            check_unit("path.total_confidence", path.total_confidence)?;
            check_unit("path.evidence_coverage", path.evidence_coverage)?;
            graph.check_path_references(&path.node_sequence, &path.edge_sequence)?;
            graph.hypothesis_paths.push(path);
        }

        for trace in parts.traces {
            if graph.trace_index.contains_key(&trace.id) {
                return Err(Error::Parse(format!("duplicate trace id '{}'", trace.id)));
            }
            for step in &trace.steps {
                check_unit("step.confidence", step.confidence)?;
            }
            graph.trace_index.insert(trace.id.clone(), graph.traces.len());
            graph.traces.push(trace);
        }

        for curve in parts.rd_curves.values() {
            check_curve(curve)?;
        }
        graph.rd_curves = parts.rd_curves;

        Ok(graph)
    }
}

/// Owned contents of a graph, used by export and import
#[derive(Debug, Clone)]
pub(crate) struct GraphParts {
    pub id: String,
    pub policy: ReferencePolicy,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub hypothesis_paths: Vec<HypothesisPath>,
    pub traces: Vec<SerendipityTrace>,
    pub rd_curves: BTreeMap<String, RDCurve>,
}

/// Statistics about the research graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub causal_edges: usize,
    pub correlative_edges: usize,
    pub cross_domain_edges: usize,
    pub hypothesis_paths: usize,
    pub serendipity_traces: usize,
    pub rd_curves: usize,
    /// Distinct domains among nodes
    pub domains_covered: usize,
    /// Mean hypothesis diversity over traces
    pub avg_trace_diversity: f32,
}

fn check_unit(field: &str, value: f32) -> Result<()> {
    check_range(field, value, 0.0, 1.0)
}

/// Stored confidence in range, and weight equal to it for both edge types
fn check_edge_values(edge: &GraphEdge) -> Result<()> {
    check_unit("edge.confidence", edge.confidence)?;
    if edge.weight != edge.confidence {
        return Err(Error::InvalidInput(format!(
            "edge '{}' has weight {} but confidence {}",
            edge.id, edge.weight, edge.confidence
        )));
    }
    Ok(())
}

fn check_curve(curve: &RDCurve) -> Result<()> {
    for point in &curve.points {
        if !point.rate.is_finite() || point.rate < 0.0 {
            return Err(Error::InvalidInput(format!(
                "rd_curve.rate must be a non-negative number, got {}",
                point.rate
            )));
        }
        if !(0.0..=1.0).contains(&point.distortion) {
            return Err(Error::out_of_range("rd_curve.distortion", point.distortion, 0.0, 1.0));
        }
    }
    Ok(())
}

fn check_range(field: &str, value: f32, min: f32, max: f32) -> Result<()> {
    // NaN fails the containment test
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::out_of_range(field, f64::from(value), f64::from(min), f64::from(max)))
    }
}
