//! Evidence thresholds gating graph merges

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::research::ResearchDomain;
use super::store::ResearchGraph;

/// Minimum node counts a graph needs before it may be merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceThresholds {
    pub virology_min: usize,
    pub genomics_min: usize,
    pub treatment_min: usize,
}

impl Default for EvidenceThresholds {
    fn default() -> Self {
        Self {
            virology_min: 1,
            genomics_min: 1,
            treatment_min: 1,
        }
    }
}

/// Outcome of a merge check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceDecision {
    pub allowed: bool,
    pub reason: String,
}

/// Check the thresholds in order: virology, genomics, treatment
///
/// The first shortfall decides the outcome.
pub fn check_merge_allowed(
    graph: &ResearchGraph,
    thresholds: &EvidenceThresholds,
) -> GovernanceDecision {
    let checks = [
        (ResearchDomain::Virology, thresholds.virology_min),
        (ResearchDomain::Genomics, thresholds.genomics_min),
        (ResearchDomain::Treatment, thresholds.treatment_min),
    ];

    for (domain, min) in checks {
        let count = graph.nodes_by_domain(domain).len();
        if count < min {
            debug!(domain = %domain, count, min, "Merge blocked");
            return GovernanceDecision {
                allowed: false,
                reason: format!(
                    "Insufficient {} evidence: {} < {}",
                    domain.as_str().to_lowercase(),
                    count,
                    min
                ),
            };
        }
    }

    GovernanceDecision {
        allowed: true,
        reason: "Merge allowed: thresholds satisfied".to_string(),
    }
}
