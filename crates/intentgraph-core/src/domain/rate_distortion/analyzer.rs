//! Batch-size tuning over a rate/distortion trade-off
//!
//! A distortion model scores each candidate batch size, the resulting
//! points form a curve, and a knee strategy picks the operating point.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::graph::ResearchGraph;
use crate::error::{Error, Result};

use super::curve::{RDCurve, RDPoint};

/// Source of the distortion value for a batch size
pub trait DistortionModel: Send + Sync {
    /// Redundancy expected at `batch_size`
    ///
    /// Graphs only store curves whose redundancies lie in `[0, 1]`.
    fn distortion(&self, batch_size: u32) -> Result<f64>;
}

/// Reference model: redundancy falls linearly with batch size to a floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearRedundancy {
    pub slope: f64,
    pub floor: f64,
}

impl Default for LinearRedundancy {
    fn default() -> Self {
        Self {
            slope: 0.03,
            floor: 0.1,
        }
    }
}

impl DistortionModel for LinearRedundancy {
    fn distortion(&self, batch_size: u32) -> Result<f64> {
        Ok(self.floor.max(1.0 - f64::from(batch_size) * self.slope))
    }
}

/// Rule used to pick the operating point on a curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KneeStrategy {
    /// Smallest `rate + distortion`, first occurrence on ties
    #[default]
    MinCombined,
    /// Largest normalised drop below the chord from first to last point
    MaxCurvature,
}

impl KneeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinCombined => "min_combined",
            Self::MaxCurvature => "max_curvature",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "min_combined" => Some(Self::MinCombined),
            "max_curvature" => Some(Self::MaxCurvature),
            _ => None,
        }
    }
}

impl std::fmt::Display for KneeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Curve plus the chosen operating point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RdAnalysis {
    pub intent: String,
    pub curve: RDCurve,
    pub knee_index: usize,
    pub knee: RDPoint,
    pub strategy: KneeStrategy,
    pub recommendation: String,
}

/// Computes rate-distortion curves and their knee points
pub struct RateDistortionAnalyzer {
    model: Box<dyn DistortionModel>,
    strategy: KneeStrategy,
}

impl Default for RateDistortionAnalyzer {
    fn default() -> Self {
        Self::new(Box::new(LinearRedundancy::default()))
    }
}

impl RateDistortionAnalyzer {
    pub fn new(model: Box<dyn DistortionModel>) -> Self {
        Self {
            model,
            strategy: KneeStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: KneeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> KneeStrategy {
        self.strategy
    }

    /// Score every batch size and pick the knee
    ///
    /// Model failures propagate unchanged.
    pub fn compute_curve(&self, intent: &str, batch_sizes: &[u32]) -> Result<RdAnalysis> {
        if batch_sizes.is_empty() {
            return Err(Error::InvalidInput(
                "batch_sizes must contain at least one size".to_string(),
            ));
        }

        let points = batch_sizes
            .iter()
            .map(|size| Ok(RDPoint::new(f64::from(*size), self.model.distortion(*size)?)))
            .collect::<Result<Vec<_>>>()?;

        self.analyze(intent, RDCurve::new(points))
    }

    /// Compute a curve and store it on the graph under `intent`
    pub fn compute_and_record(
        &self,
        graph: &mut ResearchGraph,
        intent: &str,
        batch_sizes: &[u32],
    ) -> Result<RdAnalysis> {
        let analysis = self.compute_curve(intent, batch_sizes)?;
        graph.record_rd_curve(intent, analysis.curve.clone())?;
        Ok(analysis)
    }

    /// Pick the knee of an existing curve
    pub fn analyze(&self, intent: &str, curve: RDCurve) -> Result<RdAnalysis> {
        let knee_index = select_knee(&curve.points, self.strategy).ok_or_else(|| {
            Error::InvalidInput(format!("curve for '{}' has no points", intent))
        })?;
        let knee = curve.points[knee_index];

        info!(
            intent,
            strategy = %self.strategy,
            batch_size = knee.rate,
            distortion = knee.distortion,
            "Selected rate-distortion knee"
        );

        Ok(RdAnalysis {
            intent: intent.to_string(),
            recommendation: format!("Use batch size {} for optimal coverage/quality", knee.rate),
            curve,
            knee_index,
            knee,
            strategy: self.strategy,
        })
    }
}

/// Index of the knee point, `None` for an empty slice
pub fn select_knee(points: &[RDPoint], strategy: KneeStrategy) -> Option<usize> {
    match strategy {
        KneeStrategy::MinCombined => min_combined(points),
        KneeStrategy::MaxCurvature => max_curvature(points).or_else(|| min_combined(points)),
    }
}

fn min_combined(points: &[RDPoint]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, point) in points.iter().enumerate() {
        let cost = point.combined();
        if best.is_none_or(|(_, b)| cost < b) {
            best = Some((idx, cost));
        }
    }
    best.map(|(idx, _)| idx)
}

/// `None` when the curve is too short, flat in rate, or never dips below
/// its chord
fn max_curvature(points: &[RDPoint]) -> Option<usize> {
    if points.len() < 3 {
        return None;
    }

    let (r_min, r_max) = bounds(points.iter().map(|p| p.rate));
    let (d_min, d_max) = bounds(points.iter().map(|p| p.distortion));
    let norm = |v: f64, lo: f64, hi: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 };

    let normalised: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (norm(p.rate, r_min, r_max), norm(p.distortion, d_min, d_max)))
        .collect();

    let (x0, y0) = normalised[0];
    let (xn, yn) = normalised[normalised.len() - 1];
    if (xn - x0).abs() < f64::EPSILON {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (idx, (x, y)) in normalised.iter().enumerate() {
        let chord = y0 + (x - x0) * (yn - y0) / (xn - x0);
        let drop = chord - y;
        if drop > 0.0 && best.is_none_or(|(_, b)| drop > b) {
            best = Some((idx, drop));
        }
    }

    debug!(?best, "Max-curvature knee search");
    best.map(|(idx, _)| idx)
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
