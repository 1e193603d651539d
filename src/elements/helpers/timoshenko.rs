//! Timoshenko beam with interdependent interpolation (IIE)
//!
//! Shear deformation enters through φ = 12EI / (kGAL²). At φ = 0 every
//! matrix reduces to its Euler-Bernoulli counterpart.

use nalgebra::{DMatrix, DVector};

use super::{beam_loads, positive, require_two_node_bar, BeamDirection, BeamLoad};
use crate::elements::{BarElement, Dof};
use crate::error::{FEAError, FEAResult};
use crate::loads::LocalLoad;

struct BeamProperties {
    ei: f64,
    phi: f64,
    l: f64,
}

fn properties(bar: &BarElement, direction: BeamDirection) -> FEAResult<BeamProperties> {
    require_two_node_bar(bar, "Timoshenko beam")?;

    let k = direction.shear_factor(&bar.section).ok_or_else(|| {
        FEAError::UnsupportedConfiguration(format!(
            "Timoshenko beam ({:?} plane) requires a shear correction factor",
            direction
        ))
    })?;
    let k = positive("shear correction factor", k)?;
    let e = positive("Young's modulus E", bar.material.e)?;
    let g = positive("shear modulus G", bar.material.g)?;
    let a = positive("area A", bar.section.a)?;
    let i = match direction {
        BeamDirection::Y => positive("Iz", direction.inertia(&bar.section))?,
        BeamDirection::Z => positive("Iy", direction.inertia(&bar.section))?,
    };

    let l = bar.length();
    let ei = e * i;
    Ok(BeamProperties {
        ei,
        phi: 12.0 * ei / (k * g * a * l * l),
        l,
    })
}

/// Deflection shape functions at s = x / L
fn shape(s: f64, l: f64, phi: f64) -> [f64; 4] {
    let s2 = s * s;
    let s3 = s2 * s;
    let c = 1.0 + phi;
    [
        (2.0 * s3 - 3.0 * s2 - phi * s + 1.0 + phi) / c,
        l * (s3 - (2.0 + phi / 2.0) * s2 + (1.0 + phi / 2.0) * s) / c,
        (-2.0 * s3 + 3.0 * s2 + phi * s) / c,
        l * (s3 - (1.0 - phi / 2.0) * s2 - (phi / 2.0) * s) / c,
    ]
}

/// Section rotation shape functions
fn rotation_shape(s: f64, l: f64, phi: f64) -> [f64; 4] {
    let c = 1.0 + phi;
    let g1 = 6.0 * (s * s - s) / (c * l);
    [
        g1,
        (3.0 * s * s - (4.0 + phi) * s + 1.0 + phi) / c,
        -g1,
        (3.0 * s * s - (2.0 - phi) * s) / c,
    ]
}

fn rotation_shape_dx(s: f64, l: f64, phi: f64) -> [f64; 4] {
    let c = 1.0 + phi;
    let g1 = 6.0 * (2.0 * s - 1.0) / (c * l * l);
    [
        g1,
        (6.0 * s - (4.0 + phi)) / (c * l),
        -g1,
        (6.0 * s - (2.0 - phi)) / (c * l),
    ]
}

fn rotation_shape_dx2(l: f64, phi: f64) -> [f64; 4] {
    let c = 1.0 + phi;
    let g1 = 12.0 / (c * l.powi(3));
    [g1, 6.0 / (c * l * l), -g1, 6.0 / (c * l * l)]
}

pub(crate) fn stiffness(bar: &BarElement, direction: BeamDirection) -> FEAResult<DMatrix<f64>> {
    let BeamProperties { ei, phi, l } = properties(bar, direction)?;
    let l2 = l * l;
    let c = ei / ((1.0 + phi) * l2 * l);

    #[rustfmt::skip]
    let k = DMatrix::from_row_slice(4, 4, &[
        12.0 * c,     6.0 * l * c,               -12.0 * c,    6.0 * l * c,
        6.0 * l * c,  (4.0 + phi) * l2 * c,      -6.0 * l * c, (2.0 - phi) * l2 * c,
        -12.0 * c,    -6.0 * l * c,              12.0 * c,     -6.0 * l * c,
        6.0 * l * c,  (2.0 - phi) * l2 * c,      -6.0 * l * c, (4.0 + phi) * l2 * c,
    ]);

    Ok(direction.flip_matrix(k))
}

/// Consistent translational mass including shear terms
pub(crate) fn mass(bar: &BarElement, direction: BeamDirection, density: f64) -> FEAResult<DMatrix<f64>> {
    let BeamProperties { phi, l, .. } = properties(bar, direction)?;
    let l2 = l * l;
    let p2 = phi * phi;
    let c = density * bar.section.a * l / ((1.0 + phi) * (1.0 + phi));

    let m11 = 13.0 / 35.0 + 7.0 * phi / 10.0 + p2 / 3.0;
    let m12 = (11.0 / 210.0 + 11.0 * phi / 120.0 + p2 / 24.0) * l;
    let m13 = 9.0 / 70.0 + 3.0 * phi / 10.0 + p2 / 6.0;
    let m14 = -(13.0 / 420.0 + 3.0 * phi / 40.0 + p2 / 24.0) * l;
    let m22 = (1.0 / 105.0 + phi / 60.0 + p2 / 120.0) * l2;
    let m23 = (13.0 / 420.0 + 3.0 * phi / 40.0 + p2 / 24.0) * l;
    let m24 = -(1.0 / 140.0 + phi / 60.0 + p2 / 120.0) * l2;

    #[rustfmt::skip]
    let m = DMatrix::from_row_slice(4, 4, &[
        m11, m12, m13, m14,
        m12, m22, m23, m24,
        m13, m23, m11, -m12,
        m14, m24, -m12, m22,
    ]) * c;

    Ok(direction.flip_matrix(m))
}

pub(crate) fn equivalent_loads(
    bar: &BarElement,
    direction: BeamDirection,
    load: &LocalLoad,
) -> FEAResult<DVector<f64>> {
    let BeamProperties { phi, l, .. } = properties(bar, direction)?;
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
                let n = shape(a / l, l, phi);
                for i in 0..4 {
                    f[i] += p * n[i];
                }
            }
            BeamLoad::Moment { a, m } => {
                let g = rotation_shape(a / l, l, phi);
                for i in 0..4 {
                    f[i] += m * g[i];
                }
            }
        }
    }

    Ok(direction.flip(&f))
}

/// Deflection and section rotation at x
pub(crate) fn displacement(
    bar: &BarElement,
    direction: BeamDirection,
    d: &DVector<f64>,
    x: f64,
) -> FEAResult<Vec<(Dof, f64)>> {
    let BeamProperties { phi, l, .. } = properties(bar, direction)?;
    let s = x / l;
    let d = direction.flip(d);

    let v: f64 = shape(s, l, phi).iter().zip(d.iter()).map(|(n, v)| n * v).sum();
    let psi: f64 = rotation_shape(s, l, phi)
        .iter()
        .zip(d.iter())
        .map(|(g, v)| g * v)
        .sum();

    Ok(direction.displacements(v, psi))
}

pub(crate) fn internal_force(
    bar: &BarElement,
    direction: BeamDirection,
    d: &DVector<f64>,
    x: f64,
) -> FEAResult<Vec<(Dof, f64)>> {
    let BeamProperties { ei, phi, l } = properties(bar, direction)?;
    let s = x / l;
    let d = direction.flip(d);

    let dpsi: f64 = rotation_shape_dx(s, l, phi)
        .iter()
        .zip(d.iter())
        .map(|(g, v)| g * v)
        .sum();
    let d2psi: f64 = rotation_shape_dx2(l, phi)
        .iter()
        .zip(d.iter())
        .map(|(g, v)| g * v)
        .sum();

    Ok(direction.resultants(-ei * d2psi, ei * dpsi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::helpers::euler_bernoulli;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_shear_deformation_matches_hermite() {
        for s in [0.0, 0.3, 0.75, 1.0] {
            let n = shape(s, 2.0, 0.0);
            let h = euler_bernoulli::shape(s, 2.0);
            let g = rotation_shape(s, 2.0, 0.0);
            let dh = euler_bernoulli::shape_dx(s, 2.0);
            for i in 0..4 {
                assert_relative_eq!(n[i], h[i], epsilon = 1e-14);
                assert_relative_eq!(g[i], dh[i], epsilon = 1e-14);
            }
        }
    }

    #[test]
    fn test_nodal_values_with_shear() {
        let phi = 0.4;
        let n0 = shape(0.0, 1.5, phi);
        let n1 = shape(1.0, 1.5, phi);
        assert_relative_eq!(n0[0], 1.0, epsilon = 1e-14);
        assert_relative_eq!(n1[2], 1.0, epsilon = 1e-14);

        let g0 = rotation_shape(0.0, 1.5, phi);
        let g1 = rotation_shape(1.0, 1.5, phi);
        assert_relative_eq!(g0[1], 1.0, epsilon = 1e-14);
        assert_relative_eq!(g1[3], 1.0, epsilon = 1e-14);
    }
}
