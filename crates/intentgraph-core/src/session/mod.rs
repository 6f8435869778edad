//! Research sessions
//!
//! A session owns no graph data. It remembers which serendipity trace its
//! exploration steps go to and how step confidence is derived from the
//! evidence a retriever returns. Several sessions can explore the same graph
//! one call at a time.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::graph::{HypothesisType, ResearchDomain, ResearchGraph};
use crate::error::Result;
use crate::retrieval::EvidenceRetriever;

/// Maps an evidence count to a step confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceModel {
    pub base_confidence: f32,
    pub per_evidence: f32,
    pub max_confidence: f32,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self {
            base_confidence: 0.6,
            per_evidence: 0.05,
            max_confidence: 0.95,
        }
    }
}

impl ConfidenceModel {
    pub fn confidence(&self, evidence: usize) -> f32 {
        self.max_confidence
            .min(self.base_confidence + evidence as f32 * self.per_evidence)
    }
}

/// What one exploration call produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationOutcome {
    pub trace_id: String,
    pub hypothesis: HypothesisType,
    pub query: String,
    pub domains: Vec<ResearchDomain>,
    pub evidence_found: usize,
    pub confidence: f32,
    pub step_number: usize,
    pub cross_domain_jump: bool,
}

/// Explicit exploration state for one research session
#[derive(Debug, Clone)]
pub struct ResearchSession {
    session_id: String,
    current_trace: Option<String>,
    confidence: ConfidenceModel,
}

impl ResearchSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            current_trace: None,
            confidence: ConfidenceModel::default(),
        }
    }

    pub fn with_confidence_model(mut self, confidence: ConfidenceModel) -> Self {
        self.confidence = confidence;
        self
    }

    /// Continue an existing trace, e.g. after loading a snapshot
    pub fn resume(mut self, trace_id: impl Into<String>) -> Self {
        self.current_trace = Some(trace_id.into());
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn current_trace(&self) -> Option<&str> {
        self.current_trace.as_deref()
    }

    /// Start a fresh trace; later steps go to it
    pub fn start_trace(&mut self, graph: &mut ResearchGraph, question: &str) -> String {
        let trace_id = graph.create_trace(&self.session_id, question);
        self.current_trace = Some(trace_id.clone());
        trace_id
    }

    /// Explore one hypothesis and record the step
    ///
    /// The hypothesis name is parsed strictly. Without a current trace, one
    /// is started with `query` as its question. Retriever errors propagate
    /// and leave the graph unchanged.
    pub async fn explore_hypothesis(
        &mut self,
        graph: &mut ResearchGraph,
        retriever: &dyn EvidenceRetriever,
        hypothesis: &str,
        query: &str,
        domains: &[ResearchDomain],
    ) -> Result<ExplorationOutcome> {
        let hypothesis: HypothesisType = hypothesis.parse()?;
        let evidence = retriever.retrieve(query, domains).await?;
        let confidence = self.confidence.confidence(evidence);

        let trace_id = match &self.current_trace {
            Some(id) => id.clone(),
            None => self.start_trace(graph, query),
        };

        let jumps_before = graph.trace(&trace_id).map_or(0, |t| t.cross_domain_jumps);
        let step = graph.add_step(
            &trace_id,
            hypothesis,
            query,
            domains.to_vec(),
            evidence,
            confidence,
        )?;
        let jumps_after = graph.trace(&trace_id).map_or(0, |t| t.cross_domain_jumps);

        info!(
            session_id = %self.session_id,
            hypothesis = %hypothesis,
            evidence,
            step = step.step_number,
            "Explored hypothesis"
        );

        Ok(ExplorationOutcome {
            trace_id,
            hypothesis,
            query: step.query,
            domains: step.domains_explored,
            evidence_found: evidence,
            confidence,
            step_number: step.step_number,
            cross_domain_jump: jumps_after > jumps_before,
        })
    }
}
