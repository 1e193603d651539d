//! Element helpers: one closed-form formulation per element behaviour
//!
//! Each helper works on its own subset of the element's local DOFs and
//! returns matrices in that order. The bar element scatters them into its
//! 6n x 6n local matrices.

mod euler_bernoulli;
mod shaft;
mod timoshenko;
mod truss;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use super::{BarElement, Dof, ElementDof, Section};
use crate::error::{FEAError, FEAResult};
use crate::loads::{LoadDistribution, LocalLoad};
use crate::results::Force;

/// Bending plane of a beam helper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeamDirection {
    /// Deflection along local y, rotation about local z (uses Iz)
    Y,
    /// Deflection along local z, rotation about local y (uses Iy)
    Z,
}

impl BeamDirection {
    /// (deflection, rotation) DOFs
    pub fn dofs(self) -> (Dof, Dof) {
        match self {
            BeamDirection::Y => (Dof::Dy, Dof::Rz),
            BeamDirection::Z => (Dof::Dz, Dof::Ry),
        }
    }

    pub(crate) fn inertia(self, section: &Section) -> f64 {
        match self {
            BeamDirection::Y => section.iz,
            BeamDirection::Z => section.iy,
        }
    }

    pub(crate) fn shear_factor(self, section: &Section) -> Option<f64> {
        match self {
            BeamDirection::Y => section.shear_factor_y,
            BeamDirection::Z => section.shear_factor_z,
        }
    }

    /// Sign relating the local rotation to the slope of the deflection.
    ///
    /// In the x-z plane a positive rotation about y lowers z, so θy = -dw/dx.
    pub(crate) fn rotation_sign(self) -> f64 {
        match self {
            BeamDirection::Y => 1.0,
            BeamDirection::Z => -1.0,
        }
    }

    /// Map between element DOF order (v1, θ1, v2, θ2) and the slope-based
    /// order used by the shape functions. The map is its own inverse.
    pub(crate) fn flip(self, v: &DVector<f64>) -> DVector<f64> {
        let s = self.rotation_sign();
        DVector::from_vec(vec![v[0], s * v[1], v[2], s * v[3]])
    }

    pub(crate) fn flip_matrix(self, k: DMatrix<f64>) -> DMatrix<f64> {
        let s = self.rotation_sign();
        let d = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, s, 1.0, s]));
        &d * k * &d
    }

    /// Map slope-based (shear, moment) resultants to element DOF kinds
    pub(crate) fn resultants(self, shear: f64, moment: f64) -> Vec<(Dof, f64)> {
        let (v, r) = self.dofs();
        vec![(v, shear), (r, self.rotation_sign() * moment)]
    }

    /// Map a deflection and its slope-based rotation to element DOF kinds
    pub(crate) fn displacements(self, deflection: f64, rotation: f64) -> Vec<(Dof, f64)> {
        let (v, r) = self.dofs();
        vec![(v, deflection), (r, self.rotation_sign() * rotation)]
    }
}

/// Transverse load on a beam, in the slope-based convention of the shape
/// functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum BeamLoad {
    /// Intensity per unit length over the whole element
    Uniform(f64),
    /// Point force at distance `a` from the start node
    Force { a: f64, p: f64 },
    /// Point moment at distance `a` (conjugate to the slope)
    Moment { a: f64, m: f64 },
}

/// Transverse components of a local load acting on the given beam plane
pub(crate) fn beam_loads(
    bar: &BarElement,
    direction: BeamDirection,
    load: &LocalLoad,
) -> FEAResult<Vec<BeamLoad>> {
    let (force, moment) = match direction {
        BeamDirection::Y => (load.force.y, load.moment.z),
        BeamDirection::Z => (load.force.z, -load.moment.y),
    };

    let mut loads = Vec::new();
    match load.distribution {
        LoadDistribution::Uniform => {
            if load.moment.norm() != 0.0 {
                return Err(FEAError::UnsupportedConfiguration(
                    "uniform distributed moments are not supported".into(),
                ));
            }
            if force != 0.0 {
                loads.push(BeamLoad::Uniform(force));
            }
        }
        LoadDistribution::Concentrated { xi } => {
            let a = bar.iso_to_local(xi)?;
            if force != 0.0 {
                loads.push(BeamLoad::Force { a, p: force });
            }
            if moment != 0.0 {
                loads.push(BeamLoad::Moment { a, m: moment });
            }
        }
    }
    Ok(loads)
}

/// Shear and moment inside a fully clamped beam due to `loads`, given the
/// equivalent nodal loads `f_eq` (slope-based order) they produce.
///
/// Resultants on the +x face of the segment [0, x].
pub(crate) fn clamped_beam_resultants(f_eq: &DVector<f64>, loads: &[BeamLoad], x: f64) -> (f64, f64) {
    let (f1, m1) = (f_eq[0], f_eq[1]);
    let mut shear = f1;
    let mut moment = m1 - x * f1;

    for load in loads {
        match *load {
            BeamLoad::Uniform(w) => {
                shear -= w * x;
                moment += w * x * x / 2.0;
            }
            BeamLoad::Force { a, p } if a < x => {
                shear -= p;
                moment += p * (x - a);
            }
            BeamLoad::Moment { a, m } if a < x => {
                moment -= m;
            }
            _ => {}
        }
    }

    (shear, moment)
}

/// Axial (or torsional) line loads: (uniform intensities, point loads at a)
pub(crate) fn axial_loads(
    bar: &BarElement,
    component: f64,
    load: &LocalLoad,
) -> FEAResult<Vec<BeamLoad>> {
    if component == 0.0 {
        return Ok(Vec::new());
    }
    Ok(match load.distribution {
        LoadDistribution::Uniform => vec![BeamLoad::Uniform(component)],
        LoadDistribution::Concentrated { xi } => vec![BeamLoad::Force {
            a: bar.iso_to_local(xi)?,
            p: component,
        }],
    })
}

/// Equivalent nodal loads of an axial/torsional line load on a 2-node bar
pub(crate) fn axial_equivalent_loads(loads: &[BeamLoad], l: f64) -> DVector<f64> {
    let mut f = DVector::zeros(2);
    for load in loads {
        match *load {
            BeamLoad::Uniform(w) => {
                f[0] += w * l / 2.0;
                f[1] += w * l / 2.0;
            }
            BeamLoad::Force { a, p } | BeamLoad::Moment { a, m: p } => {
                f[0] += p * (l - a) / l;
                f[1] += p * a / l;
            }
        }
    }
    f
}

/// Axial/torsional resultant inside a clamped bar
pub(crate) fn clamped_axial_resultant(f_eq: &DVector<f64>, loads: &[BeamLoad], x: f64) -> f64 {
    let mut s = f_eq[0];
    for load in loads {
        match *load {
            BeamLoad::Uniform(w) => s -= w * x,
            BeamLoad::Force { a, p } | BeamLoad::Moment { a, m: p } if a < x => s -= p,
            _ => {}
        }
    }
    s
}

/// Shortest bar the formulations accept
const MIN_LENGTH: f64 = 1e-12;

/// Reject anything but prismatic two-node bars of non-zero length
pub(crate) fn require_two_node_bar(bar: &BarElement, theory: &str) -> FEAResult<()> {
    if bar.nodes.len() != 2 {
        return Err(FEAError::UnsupportedConfiguration(format!(
            "{} formulation supports 2-node bars only, element has {} nodes",
            theory,
            bar.nodes.len()
        )));
    }
    let l = bar.length();
    if !l.is_finite() || l <= MIN_LENGTH {
        return Err(FEAError::InvalidGeometry(format!(
            "{} element {:?} has degenerate length {}",
            theory,
            bar.id(),
            l
        )));
    }
    Ok(())
}

/// Require a finite, strictly positive property
pub(crate) fn positive(name: &str, value: f64) -> FEAResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FEAError::Configuration(format!(
            "{} must be positive, got {}",
            name, value
        )))
    }
}

/// Linear interpolation between the two end values of a bar
pub(crate) fn linear_interpolation(d: &DVector<f64>, x: f64, l: f64) -> f64 {
    d[0] + (d[1] - d[0]) * x / l
}

/// Lumped-density mass shape for a two-DOF bar: `c/6 [[2,1],[1,2]]`
pub(crate) fn two_node_mass(c: f64) -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[2.0 * c / 6.0, c / 6.0, c / 6.0, 2.0 * c / 6.0])
}

pub(crate) fn two_node_stiffness(k: f64) -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[k, -k, -k, k])
}

/// Formulation contributing part of a bar element's behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementHelper {
    EulerBernoulliBeam(BeamDirection),
    TimoshenkoBeam(BeamDirection),
    Truss,
    Shaft,
}

impl ElementHelper {
    /// Local DOFs this helper addresses, in the order of its matrices
    pub fn dof_order(&self, bar: &BarElement) -> Vec<ElementDof> {
        let last = bar.nodes.len().saturating_sub(1);
        let per_node: Vec<Dof> = match self {
            ElementHelper::EulerBernoulliBeam(d) | ElementHelper::TimoshenkoBeam(d) => {
                let (v, r) = d.dofs();
                vec![v, r]
            }
            ElementHelper::Truss => vec![Dof::Dx],
            ElementHelper::Shaft => vec![Dof::Rx],
        };

        [0, last]
            .iter()
            .flat_map(|&n| per_node.iter().map(move |&dof| ElementDof::new(n, dof)))
            .collect()
    }

    pub fn local_stiffness(&self, bar: &BarElement) -> FEAResult<DMatrix<f64>> {
        match self {
            ElementHelper::EulerBernoulliBeam(d) => euler_bernoulli::stiffness(bar, *d),
            ElementHelper::TimoshenkoBeam(d) => timoshenko::stiffness(bar, *d),
            ElementHelper::Truss => truss::stiffness(bar),
            ElementHelper::Shaft => shaft::stiffness(bar),
        }
    }

    pub fn local_mass(&self, bar: &BarElement) -> FEAResult<DMatrix<f64>> {
        self.density_matrix(bar, bar.material.rho, "density")
    }

    /// Damping matrix: the mass formulation with the damping density
    pub fn local_damping(&self, bar: &BarElement) -> FEAResult<DMatrix<f64>> {
        self.density_matrix(bar, bar.material.mu, "damping density")
    }

    fn density_matrix(&self, bar: &BarElement, density: f64, name: &str) -> FEAResult<DMatrix<f64>> {
        if !density.is_finite() || density < 0.0 {
            return Err(FEAError::Configuration(format!(
                "{} must be non-negative, got {}",
                name, density
            )));
        }
        match self {
            ElementHelper::EulerBernoulliBeam(d) => euler_bernoulli::mass(bar, *d, density),
            ElementHelper::TimoshenkoBeam(d) => timoshenko::mass(bar, *d, density),
            ElementHelper::Truss => truss::mass(bar, density),
            ElementHelper::Shaft => shaft::mass(bar, density),
        }
    }

    /// Stress resultants at `xi` from the element's local displacement
    /// vector (6n entries)
    pub fn internal_force_at(
        &self,
        bar: &BarElement,
        local_displacements: &DVector<f64>,
        xi: f64,
    ) -> FEAResult<Vec<(Dof, f64)>> {
        let d = self.gather(bar, local_displacements);
        let x = bar.iso_to_local(xi)?;
        match self {
            ElementHelper::EulerBernoulliBeam(dir) => euler_bernoulli::internal_force(bar, *dir, &d, x),
            ElementHelper::TimoshenkoBeam(dir) => timoshenko::internal_force(bar, *dir, &d, x),
            ElementHelper::Truss => truss::internal_force(bar, &d, x),
            ElementHelper::Shaft => shaft::internal_force(bar, &d, x),
        }
    }

    /// Displacements at `xi` interpolated from the element's local
    /// displacement vector (6n entries)
    pub fn local_displacement_at(
        &self,
        bar: &BarElement,
        local_displacements: &DVector<f64>,
        xi: f64,
    ) -> FEAResult<Vec<(Dof, f64)>> {
        let d = self.gather(bar, local_displacements);
        let x = bar.iso_to_local(xi)?;
        match self {
            ElementHelper::EulerBernoulliBeam(dir) => euler_bernoulli::displacement(bar, *dir, &d, x),
            ElementHelper::TimoshenkoBeam(dir) => timoshenko::displacement(bar, *dir, &d, x),
            ElementHelper::Truss => truss::displacement(bar, &d, x),
            ElementHelper::Shaft => shaft::displacement(bar, &d, x),
        }
    }

    /// Equivalent nodal loads in the helper's DOF order
    pub(crate) fn equivalent_loads(&self, bar: &BarElement, load: &LocalLoad) -> FEAResult<DVector<f64>> {
        match self {
            ElementHelper::EulerBernoulliBeam(d) => euler_bernoulli::equivalent_loads(bar, *d, load),
            ElementHelper::TimoshenkoBeam(d) => timoshenko::equivalent_loads(bar, *d, load),
            ElementHelper::Truss => truss::equivalent_loads(bar, load),
            ElementHelper::Shaft => shaft::equivalent_loads(bar, load),
        }
    }

    /// Work-equivalent nodal loads as one local `Force` per element node
    pub fn local_equivalent_nodal_loads(
        &self,
        bar: &BarElement,
        load: &LocalLoad,
    ) -> FEAResult<Vec<Force>> {
        let f = self.equivalent_loads(bar, load)?;
        let mut forces = vec![Force::default(); bar.nodes.len()];
        for (value, edof) in f.iter().zip(self.dof_order(bar)) {
            forces[edof.node_index].add_component(edof.dof, *value);
        }
        Ok(forces)
    }

    /// Internal force contributed by `load` inside the fully clamped element
    pub fn load_internal_force_at(
        &self,
        bar: &BarElement,
        load: &LocalLoad,
        xi: f64,
    ) -> FEAResult<Vec<(Dof, f64)>> {
        let x = bar.iso_to_local(xi)?;
        match self {
            ElementHelper::EulerBernoulliBeam(d) => {
                let loads = beam_loads(bar, *d, load)?;
                let f_eq = d.flip(&euler_bernoulli::equivalent_loads(bar, *d, load)?);
                let (shear, moment) = clamped_beam_resultants(&f_eq, &loads, x);
                Ok(d.resultants(shear, moment))
            }
            ElementHelper::TimoshenkoBeam(d) => {
                let loads = beam_loads(bar, *d, load)?;
                let f_eq = d.flip(&timoshenko::equivalent_loads(bar, *d, load)?);
                let (shear, moment) = clamped_beam_resultants(&f_eq, &loads, x);
                Ok(d.resultants(shear, moment))
            }
            ElementHelper::Truss => {
                let loads = axial_loads(bar, load.force.x, load)?;
                let f_eq = truss::equivalent_loads(bar, load)?;
                Ok(vec![(Dof::Dx, clamped_axial_resultant(&f_eq, &loads, x))])
            }
            ElementHelper::Shaft => {
                let loads = axial_loads(bar, load.moment.x, load)?;
                let f_eq = shaft::equivalent_loads(bar, load)?;
                Ok(vec![(Dof::Rx, clamped_axial_resultant(&f_eq, &loads, x))])
            }
        }
    }

    /// Pick this helper's entries out of a 6n local vector
    fn gather(&self, bar: &BarElement, full: &DVector<f64>) -> DVector<f64> {
        let order = self.dof_order(bar);
        DVector::from_iterator(order.len(), order.iter().map(|e| full[e.local_index()]))
    }
}
