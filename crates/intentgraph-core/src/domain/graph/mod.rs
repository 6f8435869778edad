//! Typed multi-domain research graph
//!
//! The graph holds typed facts from five research disciplines and the
//! weighted relations between them:
//!
//! - **Nodes**: one payload variant per domain, tagged with a research intent
//! - **Edges**: causal or correlative, carrying evidence citations
//! - **Hypothesis paths**: named walks through the graph
//! - **Serendipity traces**: the step-by-step record of an exploration session
//! - **RD curves**: rate-distortion measurements keyed by intent
//!
//! ## Usage
//!
//! ```rust,ignore
//! use intentgraph_core::domain::graph::{EdgeSpec, ResearchGraph};
//!
//! let mut graph = ResearchGraph::new();
//! let variant = graph.add_variant_node("Omicron BA.5", vec!["L452R".into()], None);
//! let spike = graph.add_virology_node("Spike protein", "RBD binds ACE2", None);
//!
//! let spec = EdgeSpec::new(&variant.id, &spike.id, "mutations alter RBD",
//!     variant.domain(), spike.domain());
//! graph.add_causal_edge(spec, 0.85)?;
//!
//! println!("{:?}", graph.get_statistics());
//! ```

mod edge;
mod event;
mod governance;
mod hypothesis;
mod metrics;
mod node;
mod research;
mod store;
mod trace;

pub use edge::{EdgeSpec, EdgeType, GraphEdge};
pub use event::GraphEvent;
pub use governance::{EvidenceThresholds, GovernanceDecision, check_merge_allowed};
pub use hypothesis::{HypothesisPath, HypothesisType};
pub use metrics::{DomainCoverage, GraphMetrics};
pub use node::{GraphNode, NodePayload};
pub use research::{ResearchDomain, ResearchIntent};
pub use store::{GraphStatistics, ReferencePolicy, ResearchGraph};
pub(crate) use store::GraphParts;
pub use trace::{ExplorationStep, SerendipitySummary, SerendipityTrace};
