//! Shaft (St. Venant torsion) formulation on local Rx

use nalgebra::{DMatrix, DVector};

use super::{
    axial_equivalent_loads, axial_loads, linear_interpolation, positive, require_two_node_bar,
    two_node_mass, two_node_stiffness,
};
use crate::elements::{BarElement, Dof};
use crate::error::FEAResult;
use crate::loads::LocalLoad;

fn torsional_rigidity(bar: &BarElement) -> FEAResult<f64> {
    require_two_node_bar(bar, "shaft")?;
    let g = positive("shear modulus G", bar.material.g)?;
    let j = positive("torsional constant J", bar.section.j)?;
    Ok(g * j)
}

pub(crate) fn stiffness(bar: &BarElement) -> FEAResult<DMatrix<f64>> {
    let gj = torsional_rigidity(bar)?;
    Ok(two_node_stiffness(gj / bar.length()))
}

/// Rotary inertia of the section about the bar axis
pub(crate) fn mass(bar: &BarElement, density: f64) -> FEAResult<DMatrix<f64>> {
    require_two_node_bar(bar, "shaft")?;
    let ip = positive("polar moment Iy + Iz", bar.section.ip())?;
    Ok(two_node_mass(density * ip * bar.length()))
}

pub(crate) fn equivalent_loads(bar: &BarElement, load: &LocalLoad) -> FEAResult<DVector<f64>> {
    require_two_node_bar(bar, "shaft")?;
    let loads = axial_loads(bar, load.moment.x, load)?;
    Ok(axial_equivalent_loads(&loads, bar.length()))
}

/// Torque, right-hand rule about +x on the +x face
pub(crate) fn internal_force(bar: &BarElement, d: &DVector<f64>, _x: f64) -> FEAResult<Vec<(Dof, f64)>> {
    let gj = torsional_rigidity(bar)?;
    Ok(vec![(Dof::Rx, gj * (d[1] - d[0]) / bar.length())])
}

pub(crate) fn displacement(bar: &BarElement, d: &DVector<f64>, x: f64) -> FEAResult<Vec<(Dof, f64)>> {
    require_two_node_bar(bar, "shaft")?;
    Ok(vec![(Dof::Rx, linear_interpolation(d, x, bar.length()))])
}
