//! Distributed loads on bar elements

use serde::{Deserialize, Serialize};

use super::point_load::LoadDirection;
use super::LoadCase;

/// A uniform line load over the full member length
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformLoad {
    /// Load intensity per unit member length
    pub magnitude: f64,
    /// Load direction (forces only)
    pub direction: LoadDirection,
    /// Load case
    pub case: LoadCase,
}

impl UniformLoad {
    /// Create a new uniform load
    pub fn new(magnitude: f64, direction: LoadDirection, case: &LoadCase) -> Self {
        Self {
            magnitude,
            direction,
            case: case.clone(),
        }
    }

    /// Create a uniform downward load (negative global Y)
    pub fn downward(w: f64, case: &LoadCase) -> Self {
        Self::new(-w.abs(), LoadDirection::FY, case)
    }
}
