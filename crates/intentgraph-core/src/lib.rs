//! Intentgraph Core Library
//!
//! This crate provides the core functionality for intentgraph, including:
//! - Typed multi-domain research graph (nodes, edges, hypothesis paths)
//! - Intent decomposition and multi-intent queries
//! - Serendipity traces for exploration sessions
//! - Rate-distortion tuning of retrieval batch sizes
//! - Pluggable evidence retrieval
//! - JSON snapshot and JSONL sync storage
//! - Configuration with file persistence

pub mod config;
pub mod domain;
pub mod error;
pub mod retrieval;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::graph::{
        EdgeSpec, EdgeType, GraphEdge, GraphNode, GraphStatistics, HypothesisType, NodePayload,
        ReferencePolicy, ResearchDomain, ResearchGraph, ResearchIntent,
    };
    pub use crate::domain::query::{IntentDecomposer, MultiIntentQueryEngine, QueryResult};
    pub use crate::domain::rate_distortion::{KneeStrategy, RateDistortionAnalyzer};
    pub use crate::error::{Error, Result};
    pub use crate::retrieval::{EvidenceRetriever, HeuristicRetriever};
    pub use crate::session::ResearchSession;
}
