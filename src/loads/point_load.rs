//! Concentrated loads on bar elements

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use super::LoadCase;

/// Direction of an element load
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoadDirection {
    /// Force in member's local x direction (axial)
    Fx,
    /// Force in member's local y direction
    Fy,
    /// Force in member's local z direction
    Fz,
    /// Moment about member's local x axis (torsion)
    Mx,
    /// Moment about member's local y axis
    My,
    /// Moment about member's local z axis
    Mz,
    /// Force in global X direction
    FX,
    /// Force in global Y direction
    FY,
    /// Force in global Z direction
    FZ,
    /// Moment about global X axis
    MX,
    /// Moment about global Y axis
    MY,
    /// Moment about global Z axis
    MZ,
}

impl LoadDirection {
    /// Check if this direction is given in the member's local frame
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            LoadDirection::Fx
                | LoadDirection::Fy
                | LoadDirection::Fz
                | LoadDirection::Mx
                | LoadDirection::My
                | LoadDirection::Mz
        )
    }

    pub fn is_moment(&self) -> bool {
        matches!(
            self,
            LoadDirection::Mx
                | LoadDirection::My
                | LoadDirection::Mz
                | LoadDirection::MX
                | LoadDirection::MY
                | LoadDirection::MZ
        )
    }

    /// Unit vector of the direction in its own frame
    fn unit(&self) -> Vector3<f64> {
        match self {
            LoadDirection::Fx | LoadDirection::Mx | LoadDirection::FX | LoadDirection::MX => {
                Vector3::x()
            }
            LoadDirection::Fy | LoadDirection::My | LoadDirection::FY | LoadDirection::MY => {
                Vector3::y()
            }
            LoadDirection::Fz | LoadDirection::Mz | LoadDirection::FZ | LoadDirection::MZ => {
                Vector3::z()
            }
        }
    }

    /// Unit vector of the direction expressed in the member's local frame.
    ///
    /// `lambda` holds the local axes as rows.
    pub fn local_unit(&self, lambda: &Matrix3<f64>) -> Vector3<f64> {
        if self.is_local() {
            self.unit()
        } else {
            lambda * self.unit()
        }
    }
}

/// A concentrated force or moment on a member
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentratedLoad {
    /// Load magnitude
    pub magnitude: f64,
    /// Position as isoparametric coordinate in [-1, 1]
    pub xi: f64,
    /// Load direction
    pub direction: LoadDirection,
    /// Load case
    pub case: LoadCase,
}

impl ConcentratedLoad {
    /// Create a new concentrated load
    pub fn new(magnitude: f64, xi: f64, direction: LoadDirection, case: &LoadCase) -> Self {
        Self {
            magnitude,
            xi,
            direction,
            case: case.clone(),
        }
    }

    /// Create a downward (negative global Y) point force
    pub fn downward(magnitude: f64, xi: f64, case: &LoadCase) -> Self {
        Self::new(-magnitude.abs(), xi, LoadDirection::FY, case)
    }

    /// Create an axial point force (local x)
    pub fn axial(magnitude: f64, xi: f64, case: &LoadCase) -> Self {
        Self::new(magnitude, xi, LoadDirection::Fx, case)
    }
}
