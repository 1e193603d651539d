//! Mathematical utilities for FEA calculations

pub mod polynomial;
pub mod sparse;
pub mod transform;

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use crate::error::{FEAError, FEAResult};

pub use polynomial::Polynomial;
pub use sparse::{
    csr_matvec, csr_submatrix, inverse_permutation, reverse_cuthill_mckee, PivotFailure,
    SparseCholeskySolver, SparseMatrixBuilder,
};
pub use transform::TransformManager;

pub type Mat = DMatrix<f64>;
pub type DVec = DVector<f64>;
pub type Mat3 = Matrix3<f64>;
pub type Vec3 = Vector3<f64>;

/// Split `0..n` into retained and released indices
fn partition_indices(n: usize, released: &[usize]) -> Vec<usize> {
    (0..n).filter(|i| !released.contains(i)).collect()
}

fn sub_matrix(k: &Mat, rows: &[usize], cols: &[usize]) -> Mat {
    Mat::from_fn(rows.len(), cols.len(), |i, j| k[(rows[i], cols[j])])
}

fn sub_vector(v: &DVec, rows: &[usize]) -> DVec {
    DVec::from_fn(rows.len(), |i, _| v[rows[i]])
}

/// Inverse of the released-released block, or an error if the releases form
/// a mechanism inside the element
fn released_block_inverse(k: &Mat, released: &[usize]) -> FEAResult<Mat> {
    let k22 = sub_matrix(k, released, released);
    k22.try_inverse().ok_or_else(|| {
        FEAError::UnsupportedConfiguration(format!(
            "element releases at local DOFs {:?} form a mechanism",
            released
        ))
    })
}

/// Static condensation of released DOFs.
///
/// Returns a matrix of the original size holding `K11 - K12 * inv(K22) * K21`
/// at the retained positions and zeros in released rows and columns.
pub fn condense_stiffness(k: &Mat, released: &[usize]) -> FEAResult<Mat> {
    if released.is_empty() {
        return Ok(k.clone());
    }

    let kept = partition_indices(k.nrows(), released);
    let k11 = sub_matrix(k, &kept, &kept);
    let k12 = sub_matrix(k, &kept, released);
    let k21 = sub_matrix(k, released, &kept);
    let k22_inv = released_block_inverse(k, released)?;

    let k_condensed = &k11 - &k12 * &k22_inv * &k21;

    let mut result = Mat::zeros(k.nrows(), k.ncols());
    for (i, &ki) in kept.iter().enumerate() {
        for (j, &kj) in kept.iter().enumerate() {
            result[(ki, kj)] = k_condensed[(i, j)];
        }
    }
    Ok(result)
}

/// Static condensation of an equivalent load vector: `f1 - K12 * inv(K22) * f2`
pub fn condense_loads(k: &Mat, f: &DVec, released: &[usize]) -> FEAResult<DVec> {
    if released.is_empty() {
        return Ok(f.clone());
    }

    let kept = partition_indices(k.nrows(), released);
    let k12 = sub_matrix(k, &kept, released);
    let k22_inv = released_block_inverse(k, released)?;
    let f1 = sub_vector(f, &kept);
    let f2 = sub_vector(f, released);

    let f_condensed = &f1 - &k12 * &k22_inv * &f2;

    let mut result = DVec::zeros(f.len());
    for (i, &ki) in kept.iter().enumerate() {
        result[ki] = f_condensed[i];
    }
    Ok(result)
}

/// Recover the element-side displacements of released DOFs:
/// `d2 = inv(K22) * (f2 - K21 * d1)`.
///
/// `d` carries the nodal values at the retained positions; the released
/// entries are overwritten.
pub fn recover_released(k: &Mat, d: &DVec, f: &DVec, released: &[usize]) -> FEAResult<DVec> {
    if released.is_empty() {
        return Ok(d.clone());
    }

    let kept = partition_indices(k.nrows(), released);
    let k21 = sub_matrix(k, released, &kept);
    let k22_inv = released_block_inverse(k, released)?;
    let d1 = sub_vector(d, &kept);
    let f2 = sub_vector(f, released);

    let d2 = &k22_inv * (&f2 - &k21 * &d1);

    let mut result = d.clone();
    for (i, &ri) in released.iter().enumerate() {
        result[ri] = d2[i];
    }
    Ok(result)
}

/// Check a matrix for symmetry within an absolute tolerance
pub fn is_symmetric(k: &Mat, tol: f64) -> bool {
    k.is_square()
        && (0..k.nrows()).all(|i| (0..i).all(|j| (k[(i, j)] - k[(j, i)]).abs() <= tol))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn beam_stiffness(ei: f64, l: f64) -> Mat {
        let l2 = l * l;
        let c = ei / (l2 * l);
        #[rustfmt::skip]
        let data = [
            12.0 * c,     6.0 * l * c,        -12.0 * c,    6.0 * l * c,
            6.0 * l * c,  4.0 * l2 * c,       -6.0 * l * c, 2.0 * l2 * c,
            -12.0 * c,    -6.0 * l * c,       12.0 * c,     -6.0 * l * c,
            6.0 * l * c,  2.0 * l2 * c,       -6.0 * l * c, 4.0 * l2 * c,
        ];
        Mat::from_row_slice(4, 4, &data)
    }

    #[test]
    fn test_condensation_of_end_rotation() {
        // Releasing the end rotation leaves the propped-cantilever stiffness 3EI/L^3
        let (ei, l) = (2.0e6, 3.0);
        let k = beam_stiffness(ei, l);
        let kc = condense_stiffness(&k, &[3]).unwrap();

        assert_relative_eq!(kc[(2, 2)], 3.0 * ei / l.powi(3), max_relative = 1e-12);
        assert_eq!(kc[(3, 3)], 0.0);
        assert!(is_symmetric(&kc, 1e-9));
    }

    #[test]
    fn test_recovered_rotation_zeroes_end_moment() {
        let (ei, l) = (1.0e5, 2.0);
        let k = beam_stiffness(ei, l);
        let d = DVec::from_vec(vec![0.0, 0.0, 0.01, 0.0]);
        let f = DVec::zeros(4);

        let full = recover_released(&k, &d, &f, &[3]).unwrap();
        let end_forces = &k * &full;
        assert!(end_forces[3].abs() < 1e-9);
    }

    #[test]
    fn test_singular_release_is_mechanism() {
        let k = Mat::zeros(2, 2);
        assert!(matches!(
            condense_stiffness(&k, &[0, 1]),
            Err(FEAError::UnsupportedConfiguration(_))
        ));
    }
}
