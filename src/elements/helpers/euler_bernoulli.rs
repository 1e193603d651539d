//! Euler-Bernoulli beam (Hermite cubic interpolation)

use nalgebra::{DMatrix, DVector};

use super::{beam_loads, positive, require_two_node_bar, BeamDirection, BeamLoad};
use crate::elements::{BarElement, Dof};
use crate::error::FEAResult;
use crate::loads::LocalLoad;

/// Hermite shape functions at s = x / L
pub(crate) fn shape(s: f64, l: f64) -> [f64; 4] {
    let s2 = s * s;
    let s3 = s2 * s;
    [
        1.0 - 3.0 * s2 + 2.0 * s3,
        l * (s - 2.0 * s2 + s3),
        3.0 * s2 - 2.0 * s3,
        l * (-s2 + s3),
    ]
}

/// First derivatives with respect to x
pub(crate) fn shape_dx(s: f64, l: f64) -> [f64; 4] {
    [
        (-6.0 * s + 6.0 * s * s) / l,
        1.0 - 4.0 * s + 3.0 * s * s,
        (6.0 * s - 6.0 * s * s) / l,
        -2.0 * s + 3.0 * s * s,
    ]
}

fn shape_dx2(s: f64, l: f64) -> [f64; 4] {
    [
        (-6.0 + 12.0 * s) / (l * l),
        (-4.0 + 6.0 * s) / l,
        (6.0 - 12.0 * s) / (l * l),
        (-2.0 + 6.0 * s) / l,
    ]
}

fn shape_dx3(l: f64) -> [f64; 4] {
    [12.0 / l.powi(3), 6.0 / (l * l), -12.0 / l.powi(3), 6.0 / (l * l)]
}

fn bending_stiffness(bar: &BarElement, direction: BeamDirection) -> FEAResult<f64> {
    require_two_node_bar(bar, "Euler-Bernoulli beam")?;
    let e = positive("Young's modulus E", bar.material.e)?;
    let i = match direction {
        BeamDirection::Y => positive("Iz", direction.inertia(&bar.section))?,
        BeamDirection::Z => positive("Iy", direction.inertia(&bar.section))?,
    };
    Ok(e * i)
}

pub(crate) fn stiffness(bar: &BarElement, direction: BeamDirection) -> FEAResult<DMatrix<f64>> {
    let ei = bending_stiffness(bar, direction)?;
    let l = bar.length();
    let l2 = l * l;
    let c = ei / (l2 * l);

    #[rustfmt::skip]
    let k = DMatrix::from_row_slice(4, 4, &[
        12.0 * c,     6.0 * l * c,   -12.0 * c,    6.0 * l * c,
        6.0 * l * c,  4.0 * l2 * c,  -6.0 * l * c, 2.0 * l2 * c,
        -12.0 * c,    -6.0 * l * c,  12.0 * c,     -6.0 * l * c,
        6.0 * l * c,  2.0 * l2 * c,  -6.0 * l * c, 4.0 * l2 * c,
    ]);

    Ok(direction.flip_matrix(k))
}

/// Consistent translational mass (ρAL/420)
pub(crate) fn mass(bar: &BarElement, direction: BeamDirection, density: f64) -> FEAResult<DMatrix<f64>> {
    require_two_node_bar(bar, "Euler-Bernoulli beam")?;
    let a = positive("area A", bar.section.a)?;
    let l = bar.length();
    let l2 = l * l;
    let c = density * a * l / 420.0;

    #[rustfmt::skip]
    let m = DMatrix::from_row_slice(4, 4, &[
        156.0 * c,     22.0 * l * c,  54.0 * c,      -13.0 * l * c,
        22.0 * l * c,  4.0 * l2 * c,  13.0 * l * c,  -3.0 * l2 * c,
        54.0 * c,      13.0 * l * c,  156.0 * c,     -22.0 * l * c,
        -13.0 * l * c, -3.0 * l2 * c, -22.0 * l * c, 4.0 * l2 * c,
    ]);

    Ok(direction.flip_matrix(m))
}

pub(crate) fn equivalent_loads(
    bar: &BarElement,
    direction: BeamDirection,
    load: &LocalLoad,
) -> FEAResult<DVector<f64>> {
    require_two_node_bar(bar, "Euler-Bernoulli beam")?;
    let l = bar.length();
    let mut f = DVector::zeros(4);

    for beam_load in beam_loads(bar, direction, load)? {
        match beam_load {
            BeamLoad::Uniform(w) => {
                f[0] += w * l / 2.0;
                f[1] += w * l * l / 12.0;
                f[2] += w * l / 2.0;
                f[3] -= w * l * l / 12.0;
            }
            BeamLoad::Force { a, p } => {
                let n = shape(a / l, l);
                for i in 0..4 {
                    f[i] += p * n[i];
                }
            }
            BeamLoad::Moment { a, m } => {
                let g = shape_dx(a / l, l);
                for i in 0..4 {
                    f[i] += m * g[i];
                }
            }
        }
    }

    Ok(direction.flip(&f))
}

/// Deflection and rotation at x from the Hermite interpolation
pub(crate) fn displacement(
    bar: &BarElement,
    direction: BeamDirection,
    d: &DVector<f64>,
    x: f64,
) -> FEAResult<Vec<(Dof, f64)>> {
    require_two_node_bar(bar, "Euler-Bernoulli beam")?;
    let l = bar.length();
    let s = x / l;
    let d = direction.flip(d);

    let v: f64 = shape(s, l).iter().zip(d.iter()).map(|(n, v)| n * v).sum();
    let slope: f64 = shape_dx(s, l).iter().zip(d.iter()).map(|(n, v)| n * v).sum();

    Ok(direction.displacements(v, slope))
}

pub(crate) fn internal_force(
    bar: &BarElement,
    direction: BeamDirection,
    d: &DVector<f64>,
    x: f64,
) -> FEAResult<Vec<(Dof, f64)>> {
    let ei = bending_stiffness(bar, direction)?;
    let l = bar.length();
    let s = x / l;
    let d = direction.flip(d);

    let curvature: f64 = shape_dx2(s, l).iter().zip(d.iter()).map(|(n, v)| n * v).sum();
    let third: f64 = shape_dx3(l).iter().zip(d.iter()).map(|(n, v)| n * v).sum();

    Ok(direction.resultants(-ei * third, ei * curvature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shape_functions_partition_of_unity() {
        for s in [0.0, 0.2, 0.5, 0.9, 1.0] {
            let n = shape(s, 3.0);
            assert_relative_eq!(n[0] + n[2], 1.0, epsilon = 1e-14);
        }
        let n = shape(0.0, 3.0);
        assert_eq!(n, [1.0, 0.0, 0.0, 0.0]);
        let dn = shape_dx(1.0, 3.0);
        assert_relative_eq!(dn[3], 1.0, epsilon = 1e-14);
    }
}
