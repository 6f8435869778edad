//! Causal and correlative edges
//!
//! Edges are directed, weighted relations between two nodes. Each carries
//! its evidence citations and a confidence score. The weight invariant is
//! fixed by the constructor: a causal edge weighs its confidence, a
//! correlative edge weighs the absolute correlation coefficient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::research::ResearchDomain;

/// A directed relation between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Unique identifier for the edge
    pub id: String,
    /// Relationship semantics
    pub edge_type: EdgeType,
    /// ID of the source node
    pub source_id: String,
    /// ID of the target node
    pub target_id: String,
    /// Free-text label (e.g., "BA.5 mutations → immune escape")
    pub label: String,
    /// Edge weight; equals `confidence` for both edge types
    pub weight: f32,
    /// Domain of the source node
    pub source_domain: ResearchDomain,
    /// Domain of the target node
    pub target_domain: ResearchDomain,
    /// Citation identifiers in insertion order (duplicates kept)
    pub evidence_refs: Vec<String>,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,
    /// When the edge was created
    pub created_at: DateTime<Utc>,
}

/// Endpoints and provenance shared by both edge constructors
#[derive(Debug, Clone)]
pub struct EdgeSpec {
    pub source_id: String,
    pub target_id: String,
    pub label: String,
    pub source_domain: ResearchDomain,
    pub target_domain: ResearchDomain,
    pub evidence_refs: Vec<String>,
}

impl EdgeSpec {
    /// Describe an edge between two nodes
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        label: impl Into<String>,
        source_domain: ResearchDomain,
        target_domain: ResearchDomain,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            label: label.into(),
            source_domain,
            target_domain,
            evidence_refs: Vec::new(),
        }
    }

    /// Attach evidence citations
    pub fn with_evidence(mut self, evidence_refs: Vec<String>) -> Self {
        self.evidence_refs = evidence_refs;
        self
    }
}

impl GraphEdge {
    /// Causal edge: source causes or leads to target
    pub fn causal(spec: EdgeSpec, confidence: f32) -> Self {
        Self::build(EdgeType::Causal, spec, confidence)
    }

    /// Correlative edge: source is associated with target
    ///
    /// The sign of the coefficient is dropped; weight and confidence are both
    /// `|correlation|`.
    pub fn correlative(spec: EdgeSpec, correlation: f32) -> Self {
        Self::build(EdgeType::Correlative, spec, correlation.abs())
    }

    fn build(edge_type: EdgeType, spec: EdgeSpec, confidence: f32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            edge_type,
            source_id: spec.source_id,
            target_id: spec.target_id,
            label: spec.label,
            weight: confidence,
            source_domain: spec.source_domain,
            target_domain: spec.target_domain,
            evidence_refs: spec.evidence_refs,
            confidence,
            created_at: Utc::now(),
        }
    }

    /// Whether the edge connects two different domains
    pub fn is_cross_domain(&self) -> bool {
        self.source_domain != self.target_domain
    }

    /// Whether the edge touches the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

/// Edge semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Mutation → immune escape
    Causal,
    /// Treatment → reduced hospitalization
    Correlative,
}

impl EdgeType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Causal => "Causal",
            Self::Correlative => "Correlative",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> EdgeSpec {
        EdgeSpec::new(
            "node-1",
            "node-2",
            "BA.5 mutations → immune escape",
            ResearchDomain::Genomics,
            ResearchDomain::Immunology,
        )
        .with_evidence(vec!["doi:10.1038/s41586-022-04980-y".into()])
    }

    #[test]
    fn test_causal_weight_equals_confidence() {
        let edge = GraphEdge::causal(spec(), 0.85);

        assert!(!edge.id.is_empty());
        assert_eq!(edge.edge_type, EdgeType::Causal);
        assert_eq!(edge.weight, 0.85);
        assert_eq!(edge.confidence, 0.85);
        assert_eq!(edge.evidence_refs.len(), 1);
    }

    #[test]
    fn test_correlative_weight_is_absolute_correlation() {
        let edge = GraphEdge::correlative(spec(), -0.89);

        assert_eq!(edge.edge_type, EdgeType::Correlative);
        assert_eq!(edge.weight, 0.89);
        assert_eq!(edge.confidence, 0.89);
    }

    #[test]
    fn test_cross_domain_detection() {
        let cross = GraphEdge::causal(spec(), 0.5);
        assert!(cross.is_cross_domain());

        let same = GraphEdge::causal(
            EdgeSpec::new(
                "a",
                "b",
                "within genomics",
                ResearchDomain::Genomics,
                ResearchDomain::Genomics,
            ),
            0.5,
        );
        assert!(!same.is_cross_domain());
    }

    #[test]
    fn test_evidence_refs_keep_duplicates_and_order() {
        let edge = GraphEdge::causal(
            spec().with_evidence(vec!["b".into(), "a".into(), "b".into()]),
            0.4,
        );
        assert_eq!(edge.evidence_refs, vec!["b", "a", "b"]);
    }

    #[test]
    fn test_touches() {
        let edge = GraphEdge::causal(spec(), 0.4);
        assert!(edge.touches("node-1"));
        assert!(edge.touches("node-2"));
        assert!(!edge.touches("node-3"));
    }
}
