//! Intent decomposition and multi-intent retrieval
//!
//! Both components read the graph and never mutate it.

mod decomposer;
mod engine;

pub use decomposer::IntentDecomposer;
pub use engine::{IntentResult, MultiIntentQueryEngine, QueryResult, domain_for_intent};
