//! Error types for intentgraph

use thiserror::Error;

/// Result type alias using intentgraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// intentgraph error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Lookup errors (E001-E099)
    #[error("Node '{0}' not found. Run `intentgraph stats` to inspect the graph.")]
    NodeNotFound(String),

    #[error("Edge '{0}' not found.")]
    EdgeNotFound(String),

    #[error("Serendipity trace '{0}' not found.")]
    TraceNotFound(String),

    // Integrity errors (E100-E199)
    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    #[error("Value {value} for '{field}' is outside [{min}, {max}]")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unrecognized hypothesis type '{0}'. Expected one of: Transmissibility, VaccineEfficacy, ImmuneEscape, TreatmentResponse, PublicHealthImpact.")]
    UnrecognizedHypothesis(String),

    // Collaborator errors (E200-E299)
    #[error("Evidence retrieval failed: {0}")]
    RetrievalFailed(String),

    // Serialization errors (E400-E499)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an out-of-range error for a named field
    pub fn out_of_range(field: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "E001",
            Self::EdgeNotFound(_) => "E002",
            Self::TraceNotFound(_) => "E003",
            Self::ReferentialIntegrity(_) => "E100",
            Self::OutOfRange { .. } => "E101",
            Self::UnrecognizedHypothesis(_) => "E102",
            Self::RetrievalFailed(_) => "E200",
            Self::Serialization(_) => "E400",
            Self::Parse(_) => "E401",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NodeNotFound(_) => Some("intentgraph stats".to_string()),
            Self::ReferentialIntegrity(_) => {
                Some("intentgraph config set graph.reference_policy permissive".to_string())
            }
            Self::ConfigError(_) => Some("intentgraph config list".to_string()),
            _ => None,
        }
    }

    /// Whether the caller can recover by correcting the rejected mutation
    pub fn is_rejected_mutation(&self) -> bool {
        matches!(
            self,
            Self::ReferentialIntegrity(_)
                | Self::OutOfRange { .. }
                | Self::TraceNotFound(_)
                | Self::InvalidInput(_)
        )
    }
}
