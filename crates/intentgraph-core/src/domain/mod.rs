//! Domain layer
//!
//! Contains the research graph model, the query engine and the
//! rate-distortion analyzer.

pub mod graph;
pub mod query;
pub mod rate_distortion;
