//! Hypothesis types and recorded hypothesis paths

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Type of hypothesis being explored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HypothesisType {
    /// "mutation X increases transmissibility"
    Transmissibility,
    /// "mutation X affects vaccine efficacy"
    VaccineEfficacy,
    /// "mutation X enables immune escape"
    ImmuneEscape,
    /// "variant X responds to treatment Y"
    TreatmentResponse,
    /// "policy X reduces transmission"
    PublicHealthImpact,
}

impl HypothesisType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transmissibility => "Transmissibility",
            Self::VaccineEfficacy => "VaccineEfficacy",
            Self::ImmuneEscape => "ImmuneEscape",
            Self::TreatmentResponse => "TreatmentResponse",
            Self::PublicHealthImpact => "PublicHealthImpact",
        }
    }

    /// Get all hypothesis types
    pub fn all() -> &'static [HypothesisType] {
        &[
            Self::Transmissibility,
            Self::VaccineEfficacy,
            Self::ImmuneEscape,
            Self::TreatmentResponse,
            Self::PublicHealthImpact,
        ]
    }
}

impl FromStr for HypothesisType {
    type Err = Error;

    /// Strict parse: variant name in any case, separators ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "transmissibility" => Ok(Self::Transmissibility),
            "vaccineefficacy" => Ok(Self::VaccineEfficacy),
            "immuneescape" => Ok(Self::ImmuneEscape),
            "treatmentresponse" => Ok(Self::TreatmentResponse),
            "publichealthimpact" => Ok(Self::PublicHealthImpact),
            _ => Err(Error::UnrecognizedHypothesis(s.to_string())),
        }
    }
}

impl std::fmt::Display for HypothesisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered walk through the graph supporting a named hypothesis
///
/// Created once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisPath {
    pub id: String,
    pub hypothesis_type: HypothesisType,
    pub description: String,
    /// Ordered node IDs
    pub node_sequence: Vec<String>,
    /// Ordered edge IDs
    pub edge_sequence: Vec<String>,
    /// Aggregate confidence (0.0 to 1.0)
    pub total_confidence: f32,
    /// Fraction of claims backed by evidence (0.0 to 1.0)
    pub evidence_coverage: f32,
}

impl HypothesisPath {
    pub fn new(
        hypothesis_type: HypothesisType,
        description: impl Into<String>,
        node_sequence: Vec<String>,
        edge_sequence: Vec<String>,
        total_confidence: f32,
        evidence_coverage: f32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            hypothesis_type,
            description: description.into(),
            node_sequence,
            edge_sequence,
            total_confidence,
            evidence_coverage,
        }
    }
}
