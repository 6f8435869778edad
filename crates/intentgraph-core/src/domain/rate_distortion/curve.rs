//! Rate-distortion curve types

use serde::{Deserialize, Serialize};

/// One evaluated operating point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RDPoint {
    /// Retrieval batch size
    pub rate: f64,
    /// Redundancy left at this batch size
    pub distortion: f64,
}

impl RDPoint {
    pub fn new(rate: f64, distortion: f64) -> Self {
        Self { rate, distortion }
    }

    /// Linear cost used by the default knee selector
    pub fn combined(&self) -> f64 {
        self.rate + self.distortion
    }
}

/// Ordered points, one per evaluated batch size
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RDCurve {
    pub points: Vec<RDPoint>,
}

impl RDCurve {
    pub fn new(points: Vec<RDPoint>) -> Self {
        Self { points }
    }

    /// Pair batch sizes with measured redundancies
    ///
    /// Returns `None` when the two slices differ in length.
    pub fn from_measurements(batch_sizes: &[u32], redundancies: &[f64]) -> Option<Self> {
        if batch_sizes.len() != redundancies.len() {
            return None;
        }
        Some(Self::new(
            batch_sizes
                .iter()
                .zip(redundancies)
                .map(|(size, redundancy)| RDPoint::new(f64::from(*size), *redundancy))
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
