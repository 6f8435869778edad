//! Rate-distortion analysis for retrieval batch sizing

mod analyzer;
mod curve;

pub use analyzer::{
    DistortionModel, KneeStrategy, LinearRedundancy, RateDistortionAnalyzer, RdAnalysis,
    select_knee,
};
pub use curve::{RDCurve, RDPoint};
