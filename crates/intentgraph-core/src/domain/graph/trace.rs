//! Serendipity traces: the ordered record of an exploration session
//!
//! A trace collects exploration steps and keeps two running counters: total
//! evidence and cross-domain jumps. A jump is counted whenever a step's
//! domain list differs from the previous step's list, compared as ordered
//! sequences: `[Genomics, Virology]` followed by `[Virology, Genomics]` is a
//! jump.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hypothesis::HypothesisType;
use super::research::ResearchDomain;

/// Single step in an exploration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationStep {
    pub id: String,
    /// 1-based, sequential, no gaps
    pub step_number: usize,
    pub hypothesis: HypothesisType,
    pub query: String,
    /// Domains explored, in order; duplicates allowed
    pub domains_explored: Vec<ResearchDomain>,
    pub evidence_found: usize,
    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

/// Complete serendipity trace for a research session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerendipityTrace {
    pub id: String,
    pub session_id: String,
    pub question: String,
    pub steps: Vec<ExplorationStep>,
    /// Sum of `evidence_found` over all steps
    pub total_evidence: usize,
    /// Number of consecutive step pairs with differing domain lists
    pub cross_domain_jumps: usize,
    pub created_at: DateTime<Utc>,
}

impl SerendipityTrace {
    /// Create an empty trace
    pub fn new(session_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            question: question.into(),
            steps: Vec::new(),
            total_evidence: 0,
            cross_domain_jumps: 0,
            created_at: Utc::now(),
        }
    }

    /// Append a step, updating both counters
    ///
    /// Returns the new step and whether it was a cross-domain jump.
    pub(crate) fn push_step(
        &mut self,
        hypothesis: HypothesisType,
        query: impl Into<String>,
        domains: Vec<ResearchDomain>,
        evidence_found: usize,
        confidence: f32,
    ) -> (&ExplorationStep, bool) {
        let jumped = self
            .steps
            .last()
            .is_some_and(|prev| prev.domains_explored != domains);

        let step = ExplorationStep {
            id: Uuid::new_v4().to_string(),
            step_number: self.steps.len() + 1,
            hypothesis,
            query: query.into(),
            domains_explored: domains,
            evidence_found,
            confidence,
            timestamp: Utc::now(),
        };

        self.total_evidence += evidence_found;
        if jumped {
            self.cross_domain_jumps += 1;
        }
        self.steps.push(step);

        let step = &self.steps[self.steps.len() - 1];
        (step, jumped)
    }

    /// Count of steps per hypothesis type
    pub fn hypotheses_explored(&self) -> BTreeMap<HypothesisType, usize> {
        let mut counts = BTreeMap::new();
        for step in &self.steps {
            *counts.entry(step.hypothesis).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct hypothesis types per step
    pub fn branching_factor(&self) -> f32 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.hypotheses_explored().len() as f32 / self.steps.len() as f32
    }

    /// Shannon entropy (natural log) of the hypothesis distribution
    pub fn diversity_score(&self) -> f32 {
        let total = self.steps.len() as f32;
        if total == 0.0 {
            return 0.0;
        }

        self.hypotheses_explored()
            .values()
            .map(|count| *count as f32 / total)
            .filter(|p| *p > 0.0)
            .map(|p| -p * p.ln())
            .sum()
    }

    pub fn exploration_depth(&self) -> usize {
        self.steps.len()
    }

    pub fn avg_confidence(&self) -> f32 {
        if self.steps.is_empty() {
            return 0.0;
        }
        self.steps.iter().map(|s| s.confidence).sum::<f32>() / self.steps.len() as f32
    }

    pub fn summary(&self) -> SerendipitySummary {
        SerendipitySummary {
            trace_id: self.id.clone(),
            question: self.question.clone(),
            total_steps: self.steps.len(),
            unique_hypotheses: self.hypotheses_explored().len(),
            branching_factor: self.branching_factor(),
            diversity_score: self.diversity_score(),
            cross_domain_jumps: self.cross_domain_jumps,
            total_evidence: self.total_evidence,
            avg_confidence: self.avg_confidence(),
        }
    }
}

/// Aggregate view of a trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerendipitySummary {
    pub trace_id: String,
    pub question: String,
    pub total_steps: usize,
    pub unique_hypotheses: usize,
    pub branching_factor: f32,
    pub diversity_score: f32,
    pub cross_domain_jumps: usize,
    pub total_evidence: usize,
    pub avg_confidence: f32,
}
