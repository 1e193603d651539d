//! Node loads - forces and moments applied directly to nodes

use serde::{Deserialize, Serialize};

use super::LoadCase;
use crate::results::Force;

/// A load applied directly to a node, in global coordinates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodalLoad {
    pub force: Force,
    /// Load case this load belongs to
    pub case: LoadCase,
}

impl NodalLoad {
    /// Create a new node load with all components
    pub fn new(force: Force, case: &LoadCase) -> Self {
        Self {
            force,
            case: case.clone(),
        }
    }

    /// Create a force-only node load
    pub fn force(fx: f64, fy: f64, fz: f64, case: &LoadCase) -> Self {
        Self::new(Force::new(fx, fy, fz, 0.0, 0.0, 0.0), case)
    }

    /// Create a moment-only node load
    pub fn moment(mx: f64, my: f64, mz: f64, case: &LoadCase) -> Self {
        Self::new(Force::new(0.0, 0.0, 0.0, mx, my, mz), case)
    }

    /// Create a load in X direction
    pub fn fx(value: f64, case: &LoadCase) -> Self {
        Self::force(value, 0.0, 0.0, case)
    }

    /// Create a load in Y direction
    pub fn fy(value: f64, case: &LoadCase) -> Self {
        Self::force(0.0, value, 0.0, case)
    }

    /// Create a load in Z direction
    pub fn fz(value: f64, case: &LoadCase) -> Self {
        Self::force(0.0, 0.0, value, case)
    }
}
