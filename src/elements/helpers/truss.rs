//! Truss (axial) formulation on local Dx

use nalgebra::{DMatrix, DVector};

use super::{
    axial_equivalent_loads, axial_loads, linear_interpolation, positive, require_two_node_bar,
    two_node_mass, two_node_stiffness,
};
use crate::elements::{BarElement, Dof};
use crate::error::FEAResult;
use crate::loads::LocalLoad;

fn axial_rigidity(bar: &BarElement) -> FEAResult<f64> {
    require_two_node_bar(bar, "truss")?;
    let e = positive("Young's modulus E", bar.material.e)?;
    let a = positive("area A", bar.section.a)?;
    Ok(e * a)
}

pub(crate) fn stiffness(bar: &BarElement) -> FEAResult<DMatrix<f64>> {
    let ea = axial_rigidity(bar)?;
    Ok(two_node_stiffness(ea / bar.length()))
}

pub(crate) fn mass(bar: &BarElement, density: f64) -> FEAResult<DMatrix<f64>> {
    require_two_node_bar(bar, "truss")?;
    let a = positive("area A", bar.section.a)?;
    Ok(two_node_mass(density * a * bar.length()))
}

pub(crate) fn equivalent_loads(bar: &BarElement, load: &LocalLoad) -> FEAResult<DVector<f64>> {
    require_two_node_bar(bar, "truss")?;
    let loads = axial_loads(bar, load.force.x, load)?;
    Ok(axial_equivalent_loads(&loads, bar.length()))
}

/// Axial force, tension positive
pub(crate) fn internal_force(bar: &BarElement, d: &DVector<f64>, _x: f64) -> FEAResult<Vec<(Dof, f64)>> {
    let ea = axial_rigidity(bar)?;
    Ok(vec![(Dof::Dx, ea * (d[1] - d[0]) / bar.length())])
}

pub(crate) fn displacement(bar: &BarElement, d: &DVector<f64>, x: f64) -> FEAResult<Vec<(Dof, f64)>> {
    require_two_node_bar(bar, "truss")?;
    Ok(vec![(Dof::Dx, linear_interpolation(d, x, bar.length()))])
}
