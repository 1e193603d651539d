//! Load types and load combinations

mod distributed;
mod load_case;
mod load_combo;
mod node_load;
mod point_load;

pub use distributed::UniformLoad;
pub use load_case::{LoadCase, LoadType};
pub use load_combo::LoadCombination;
pub use node_load::NodalLoad;
pub use point_load::{ConcentratedLoad, LoadDirection};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{FEAError, FEAResult};

/// A load carried by a bar element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElementLoad {
    Uniform(UniformLoad),
    Concentrated(ConcentratedLoad),
}

/// How a load is spread along the element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadDistribution {
    /// Constant intensity per unit length over the whole element
    Uniform,
    /// Point load at an isoparametric position
    Concentrated { xi: f64 },
}

/// An element load resolved into the element's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalLoad {
    pub distribution: LoadDistribution,
    /// Local force components (intensity for uniform loads)
    pub force: Vector3<f64>,
    /// Local moment components
    pub moment: Vector3<f64>,
}

impl ElementLoad {
    /// Uniform line load over the full element
    pub fn uniform(magnitude: f64, direction: LoadDirection, case: &LoadCase) -> Self {
        ElementLoad::Uniform(UniformLoad::new(magnitude, direction, case))
    }

    /// Concentrated force or moment at isoparametric position `xi`
    pub fn concentrated(
        magnitude: f64,
        xi: f64,
        direction: LoadDirection,
        case: &LoadCase,
    ) -> Self {
        ElementLoad::Concentrated(ConcentratedLoad::new(magnitude, xi, direction, case))
    }

    pub fn case(&self) -> &LoadCase {
        match self {
            ElementLoad::Uniform(l) => &l.case,
            ElementLoad::Concentrated(l) => &l.case,
        }
    }

    pub fn direction(&self) -> LoadDirection {
        match self {
            ElementLoad::Uniform(l) => l.direction,
            ElementLoad::Concentrated(l) => l.direction,
        }
    }

    /// Isoparametric position of a concentrated load
    pub fn xi(&self) -> Option<f64> {
        match self {
            ElementLoad::Uniform(_) => None,
            ElementLoad::Concentrated(l) => Some(l.xi),
        }
    }

    /// Check that the element formulation can carry this load
    pub fn validate(&self) -> FEAResult<()> {
        match self {
            ElementLoad::Uniform(l) => {
                if l.direction.is_moment() {
                    return Err(FEAError::UnsupportedConfiguration(format!(
                        "uniform distributed moment ({:?}) is not supported",
                        l.direction
                    )));
                }
            }
            ElementLoad::Concentrated(l) => {
                if !l.xi.is_finite() || !(-1.0..=1.0).contains(&l.xi) {
                    return Err(FEAError::Configuration(format!(
                        "concentrated load position xi = {} is outside [-1, 1]",
                        l.xi
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolve the load into the element's local frame
    pub fn to_local(&self, lambda: &Matrix3<f64>) -> FEAResult<LocalLoad> {
        self.validate()?;

        let (magnitude, direction, distribution) = match self {
            ElementLoad::Uniform(l) => (l.magnitude, l.direction, LoadDistribution::Uniform),
            ElementLoad::Concentrated(l) => (
                l.magnitude,
                l.direction,
                LoadDistribution::Concentrated { xi: l.xi },
            ),
        };

        let v = direction.local_unit(lambda) * magnitude;
        let (force, moment) = if direction.is_moment() {
            (Vector3::zeros(), v)
        } else {
            (v, Vector3::zeros())
        };

        Ok(LocalLoad {
            distribution,
            force,
            moment,
        })
    }
}

impl From<UniformLoad> for ElementLoad {
    fn from(load: UniformLoad) -> Self {
        ElementLoad::Uniform(load)
    }
}

impl From<ConcentratedLoad> for ElementLoad {
    fn from(load: ConcentratedLoad) -> Self {
        ElementLoad::Concentrated(load)
    }
}
