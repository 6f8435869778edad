//! Research domains and canonical research intents
//!
//! Domains are the five fixed disciplines every node and edge belongs to.
//! Intents are the named research angles used to tag nodes and to decompose
//! questions. Both tables are closed enums so every lookup is an exhaustive
//! match.

use serde::{Deserialize, Serialize};

/// One of the five fixed research disciplines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResearchDomain {
    /// Viral biology (spike protein, receptor binding)
    Virology,
    /// Host immune response (antibodies, T-cells)
    Immunology,
    /// Variants and mutations
    Genomics,
    /// Therapies and their mechanisms
    Treatment,
    /// Policies and population-level effects
    PublicHealth,
}

impl ResearchDomain {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Virology => "Virology",
            Self::Immunology => "Immunology",
            Self::Genomics => "Genomics",
            Self::Treatment => "Treatment",
            Self::PublicHealth => "PublicHealth",
        }
    }

    /// Parse from string (case-insensitive, snake_case accepted)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "virology" => Some(Self::Virology),
            "immunology" => Some(Self::Immunology),
            "genomics" => Some(Self::Genomics),
            "treatment" => Some(Self::Treatment),
            "publichealth" => Some(Self::PublicHealth),
            _ => None,
        }
    }

    /// Intent tag given to nodes of this domain when the caller supplies none
    pub fn default_intent(&self) -> ResearchIntent {
        match self {
            Self::Virology => ResearchIntent::Transmissibility,
            Self::Immunology => ResearchIntent::VaccineEfficacy,
            Self::Genomics => ResearchIntent::ImmuneEscape,
            Self::Treatment => ResearchIntent::TreatmentEfficacy,
            Self::PublicHealth => ResearchIntent::TransmissionReduction,
        }
    }

    /// Get all domains
    pub fn all() -> &'static [ResearchDomain] {
        &[
            Self::Virology,
            Self::Immunology,
            Self::Genomics,
            Self::Treatment,
            Self::PublicHealth,
        ]
    }
}

impl std::fmt::Display for ResearchDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical research intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchIntent {
    /// How readily the virus spreads
    Transmissibility,
    /// How well vaccines protect
    VaccineEfficacy,
    /// How variants evade immunity
    ImmuneEscape,
    /// How patients respond to therapies
    TreatmentEfficacy,
    /// How interventions reduce spread
    TransmissionReduction,
}

impl ResearchIntent {
    /// Get the string representation used as a node intent tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transmissibility => "transmissibility",
            Self::VaccineEfficacy => "vaccine_efficacy",
            Self::ImmuneEscape => "immune_escape",
            Self::TreatmentEfficacy => "treatment_efficacy",
            Self::TransmissionReduction => "transmission_reduction",
        }
    }

    /// Parse from an exact intent tag
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transmissibility" => Some(Self::Transmissibility),
            "vaccine_efficacy" => Some(Self::VaccineEfficacy),
            "immune_escape" => Some(Self::ImmuneEscape),
            "treatment_efficacy" => Some(Self::TreatmentEfficacy),
            "transmission_reduction" => Some(Self::TransmissionReduction),
            _ => None,
        }
    }

    /// Domain this intent is answered from
    pub fn domain(&self) -> ResearchDomain {
        match self {
            Self::Transmissibility => ResearchDomain::Virology,
            Self::VaccineEfficacy => ResearchDomain::Immunology,
            Self::ImmuneEscape => ResearchDomain::Genomics,
            Self::TreatmentEfficacy => ResearchDomain::Treatment,
            Self::TransmissionReduction => ResearchDomain::PublicHealth,
        }
    }

    /// Lower-case keywords that signal this intent in a question
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Transmissibility => &["transmit", "spread", "contagious", "infection rate"],
            Self::VaccineEfficacy => &["vaccine", "vaccination", "immunization", "efficacy"],
            Self::ImmuneEscape => &["escape", "evade", "antibody", "neutralization"],
            Self::TreatmentEfficacy => &["treatment", "therapy", "drug", "medication"],
            Self::TransmissionReduction => &["mask", "policy", "mandate", "intervention"],
        }
    }

    /// Get all intents in table order
    pub fn all() -> &'static [ResearchIntent] {
        &[
            Self::Transmissibility,
            Self::VaccineEfficacy,
            Self::ImmuneEscape,
            Self::TreatmentEfficacy,
            Self::TransmissionReduction,
        ]
    }
}

impl std::fmt::Display for ResearchIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
