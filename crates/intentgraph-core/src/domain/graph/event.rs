//! Domain events for the research graph
//!
//! Every accepted mutation of the store records an event, and so does every
//! rejected one. Events form an in-process audit trail; they are not part of
//! the exported snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edge::EdgeType;
use super::hypothesis::HypothesisType;
use super::research::ResearchDomain;

/// Events that can occur in the research graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GraphEvent {
    /// A node was added
    NodeAdded {
        node_id: String,
        domain: ResearchDomain,
        intent: String,
        timestamp: DateTime<Utc>,
    },
    /// An edge was added
    EdgeAdded {
        edge_id: String,
        edge_type: EdgeType,
        source_id: String,
        target_id: String,
        timestamp: DateTime<Utc>,
    },
    /// A hypothesis path was recorded
    HypothesisRecorded {
        path_id: String,
        hypothesis_type: HypothesisType,
        timestamp: DateTime<Utc>,
    },
    /// A serendipity trace was started
    TraceCreated {
        trace_id: String,
        session_id: String,
        timestamp: DateTime<Utc>,
    },
    /// An exploration step was appended to a trace
    StepAppended {
        trace_id: String,
        step_number: usize,
        cross_domain_jump: bool,
        timestamp: DateTime<Utc>,
    },
    /// A rate-distortion curve was stored for an intent
    RdCurveRecorded {
        intent: String,
        points: usize,
        timestamp: DateTime<Utc>,
    },
    /// A mutation was rejected and the store left unchanged
    MutationRejected {
        operation: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl GraphEvent {
    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::NodeAdded { timestamp, .. }
            | Self::EdgeAdded { timestamp, .. }
            | Self::HypothesisRecorded { timestamp, .. }
            | Self::TraceCreated { timestamp, .. }
            | Self::StepAppended { timestamp, .. }
            | Self::RdCurveRecorded { timestamp, .. }
            | Self::MutationRejected { timestamp, .. } => *timestamp,
        }
    }

    /// Get the event type name
    pub fn event_type_name(&self) -> &'static str {
        match self {
            Self::NodeAdded { .. } => "node_added",
            Self::EdgeAdded { .. } => "edge_added",
            Self::HypothesisRecorded { .. } => "hypothesis_recorded",
            Self::TraceCreated { .. } => "trace_created",
            Self::StepAppended { .. } => "step_appended",
            Self::RdCurveRecorded { .. } => "rd_curve_recorded",
            Self::MutationRejected { .. } => "mutation_rejected",
        }
    }

    /// Whether this event records a rejected mutation
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::MutationRejected { .. })
    }

    pub(crate) fn rejected(operation: &str, reason: impl Into<String>) -> Self {
        Self::MutationRejected {
            operation: operation.to_string(),
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}
