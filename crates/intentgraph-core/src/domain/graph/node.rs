//! Graph node types
//!
//! A node is a typed fact attached to exactly one research domain. The
//! domain is derived from the payload variant, never stored separately.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::research::ResearchDomain;

/// A typed fact in the research graph
///
/// Nodes are immutable once inserted into the store. The `intent` tag is a
/// free-form string; canonical tags come from
/// [`ResearchIntent`](super::research::ResearchIntent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier for the node
    pub id: String,
    /// Research intent this node supports
    pub intent: String,
    /// Domain-specific content
    #[serde(flatten)]
    pub payload: NodePayload,
    /// Confidence score (0.0 to 1.0) averaged by multi-intent queries
    pub confidence: f32,
    /// Number of evidence items backing the node
    pub evidence_count: usize,
    /// Citation identifiers (DOIs, dataset refs)
    pub sources: Vec<String>,
    /// When the node was created
    pub created_at: DateTime<Utc>,
}

impl GraphNode {
    /// Create a node tagged with the payload domain's default intent
    pub fn new(payload: NodePayload) -> Self {
        let intent = payload.domain().default_intent().as_str().to_string();

        Self {
            id: Uuid::new_v4().to_string(),
            intent,
            payload,
            confidence: 0.0,
            evidence_count: 0,
            sources: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the intent tag
    pub fn with_intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = intent.into();
        self
    }

    /// Set the confidence score
    ///
    /// Not clamped here: the store rejects values outside [0, 1].
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the evidence count
    pub fn with_evidence_count(mut self, evidence_count: usize) -> Self {
        self.evidence_count = evidence_count;
        self
    }

    /// Set citation sources
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    /// Domain implied by the payload variant
    pub fn domain(&self) -> ResearchDomain {
        self.payload.domain()
    }

    /// Short human-readable title
    pub fn title(&self) -> &str {
        self.payload.title()
    }
}

/// Domain-specific node content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NodePayload {
    /// Viral biology (e.g., "Spike-ACE2 binding")
    Virology { topic: String, details: String },
    /// Immune response (e.g., "Antibody neutralization")
    Immunology { topic: String, details: String },
    /// Variant with its ordered mutation list
    Genomics {
        variant: String,
        mutations: Vec<String>,
    },
    /// Therapy and its mechanism of action
    Treatment { therapy: String, mechanism: String },
    /// Policy and its observed effect
    PublicHealth { policy: String, effect: String },
}

impl NodePayload {
    /// Domain of this payload
    pub fn domain(&self) -> ResearchDomain {
        match self {
            Self::Virology { .. } => ResearchDomain::Virology,
            Self::Immunology { .. } => ResearchDomain::Immunology,
            Self::Genomics { .. } => ResearchDomain::Genomics,
            Self::Treatment { .. } => ResearchDomain::Treatment,
            Self::PublicHealth { .. } => ResearchDomain::PublicHealth,
        }
    }

    /// Primary label of the payload
    pub fn title(&self) -> &str {
        match self {
            Self::Virology { topic, .. } | Self::Immunology { topic, .. } => topic,
            Self::Genomics { variant, .. } => variant,
            Self::Treatment { therapy, .. } => therapy,
            Self::PublicHealth { policy, .. } => policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn omicron() -> NodePayload {
        NodePayload::Genomics {
            variant: "Omicron BA.5".into(),
            mutations: vec!["L452R".into(), "F486V".into(), "R493Q".into()],
        }
    }

    #[test]
    fn test_node_creation_uses_domain_default_intent() {
        let node = GraphNode::new(omicron());

        assert!(!node.id.is_empty());
        assert_eq!(node.domain(), ResearchDomain::Genomics);
        assert_eq!(node.intent, "immune_escape");
        assert_eq!(node.confidence, 0.0);
        assert_eq!(node.title(), "Omicron BA.5");
    }

    #[test]
    fn test_node_builders() {
        let node = GraphNode::new(NodePayload::Treatment {
            therapy: "Paxlovid".into(),
            mechanism: "3CL protease inhibitor".into(),
        })
        .with_intent("custom_intent")
        .with_confidence(0.9)
        .with_evidence_count(10)
        .with_sources(vec!["doi:10.1056/NEJMoa2118542".into()]);

        assert_eq!(node.intent, "custom_intent");
        assert_eq!(node.confidence, 0.9);
        assert_eq!(node.evidence_count, 10);
        assert_eq!(node.sources.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = GraphNode::new(omicron());
        let b = GraphNode::new(omicron());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_payload_serializes_with_type_tag() {
        let node = GraphNode::new(NodePayload::PublicHealth {
            policy: "Indoor mask mandates".into(),
            effect: "Reduced transmission".into(),
        });
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["type"], "public_health");
        assert_eq!(value["data"]["policy"], "Indoor mask mandates");
        assert_eq!(value["intent"], "transmission_reduction");

        let back: GraphNode = serde_json::from_value(value).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_mutation_order_is_preserved() {
        let node = GraphNode::new(omicron());
        match &node.payload {
            NodePayload::Genomics { mutations, .. } => {
                assert_eq!(mutations, &["L452R", "F486V", "R493Q"]);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }
}
