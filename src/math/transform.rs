//! Local / global coordinate transformation for bar elements

use nalgebra::{DMatrix, Matrix3, Vector3};

use crate::error::{FEAError, FEAResult};
use crate::results::{Displacement, Force};

/// Relative tolerance below which a member axis is treated as parallel to global Z
const VERTICAL_TOLERANCE: f64 = 1e-9;

/// Direction cosines of a bar and the operations built on them.
///
/// Rows of `lambda` are the local x, y and z axes in global coordinates, so
/// `local = lambda * global` and `global = lambda^T * local`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformManager {
    lambda: Matrix3<f64>,
}

impl TransformManager {
    /// Build the direction cosines of the bar from `start` to `end`.
    ///
    /// `web_rotation` turns the local y and z axes about local x, in degrees.
    pub fn from_points(
        start: &Vector3<f64>,
        end: &Vector3<f64>,
        web_rotation: f64,
    ) -> FEAResult<Self> {
        let v = end - start;
        let length = v.norm();

        if !length.is_finite() || length < 1e-12 {
            return Err(FEAError::InvalidGeometry(format!(
                "bar has zero length between {:?} and {:?}",
                start.as_slice(),
                end.as_slice()
            )));
        }

        let (x, y, z) = if v.x.abs() <= VERTICAL_TOLERANCE * length
            && v.y.abs() <= VERTICAL_TOLERANCE * length
        {
            // Member parallel to global Z
            if v.z > 0.0 {
                (Vector3::z(), Vector3::y(), -Vector3::x())
            } else {
                (-Vector3::z(), Vector3::y(), Vector3::x())
            }
        } else {
            let (cxx, cyx, czx) = (v.x / length, v.y / length, v.z / length);
            let d = (cxx * cxx + cyx * cyx).sqrt();
            (
                Vector3::new(cxx, cyx, czx),
                Vector3::new(-cyx / d, cxx / d, 0.0),
                Vector3::new(-cxx * czx / d, -cyx * czx / d, d),
            )
        };

        let (y, z) = if web_rotation != 0.0 {
            let (s, c) = web_rotation.to_radians().sin_cos();
            (y * c + z * s, -y * s + z * c)
        } else {
            (y, z)
        };

        Ok(Self {
            lambda: Matrix3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]),
        })
    }

    /// 3x3 direction cosine matrix
    pub fn lambda(&self) -> &Matrix3<f64> {
        &self.lambda
    }

    pub fn to_local_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.lambda * v
    }

    pub fn to_global_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.lambda.transpose() * v
    }

    pub fn force_to_local(&self, f: &Force) -> Force {
        Force::from_vectors(
            self.to_local_vector(&f.force()),
            self.to_local_vector(&f.moment()),
        )
    }

    pub fn force_to_global(&self, f: &Force) -> Force {
        Force::from_vectors(
            self.to_global_vector(&f.force()),
            self.to_global_vector(&f.moment()),
        )
    }

    pub fn displacement_to_local(&self, d: &Displacement) -> Displacement {
        Displacement::from_vectors(
            self.to_local_vector(&d.translation()),
            self.to_local_vector(&d.rotation()),
        )
    }

    pub fn displacement_to_global(&self, d: &Displacement) -> Displacement {
        Displacement::from_vectors(
            self.to_global_vector(&d.translation()),
            self.to_global_vector(&d.rotation()),
        )
    }

    /// Block-diagonal transformation matrix for `nodes` nodes (6n x 6n)
    pub fn expand(&self, nodes: usize) -> DMatrix<f64> {
        let size = nodes * 6;
        let mut t = DMatrix::zeros(size, size);
        for block in 0..nodes * 2 {
            let offset = block * 3;
            t.fixed_view_mut::<3, 3>(offset, offset)
                .copy_from(&self.lambda);
        }
        t
    }

    /// `T^T * K * T`, computed block by block
    pub fn local_to_global_matrix(&self, k: &DMatrix<f64>) -> DMatrix<f64> {
        let lt = self.lambda.transpose();
        self.congruence(k, &lt, &self.lambda)
    }

    /// `T * K * T^T`, computed block by block
    pub fn global_to_local_matrix(&self, k: &DMatrix<f64>) -> DMatrix<f64> {
        let lt = self.lambda.transpose();
        self.congruence(k, &self.lambda, &lt)
    }

    fn congruence(
        &self,
        k: &DMatrix<f64>,
        left: &Matrix3<f64>,
        right: &Matrix3<f64>,
    ) -> DMatrix<f64> {
        let blocks = k.nrows() / 3;
        let mut result = DMatrix::zeros(k.nrows(), k.ncols());
        for bi in 0..blocks {
            for bj in 0..blocks {
                let block: Matrix3<f64> = k.fixed_view::<3, 3>(bi * 3, bj * 3).into_owned();
                result
                    .fixed_view_mut::<3, 3>(bi * 3, bj * 3)
                    .copy_from(&(left * block * right));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_horizontal_member_along_x() {
        let t = TransformManager::from_points(&Vector3::zeros(), &Vector3::new(10.0, 0.0, 0.0), 0.0)
            .unwrap();
        assert_relative_eq!(*t.lambda(), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_member_along_y() {
        let t = TransformManager::from_points(&Vector3::zeros(), &Vector3::new(0.0, 4.0, 0.0), 0.0)
            .unwrap();
        let l = t.lambda();
        // local x = global Y, local y = -global X, local z = global Z
        assert_relative_eq!(l[(0, 1)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(l[(1, 0)], -1.0, epsilon = 1e-12);
        assert_relative_eq!(l[(2, 2)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_web_rotation_quarter_turn() {
        let t = TransformManager::from_points(&Vector3::zeros(), &Vector3::new(1.0, 0.0, 0.0), 90.0)
            .unwrap();
        let l = t.lambda();
        // y' = z, z' = -y
        assert_relative_eq!(l[(1, 2)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(l[(2, 1)], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        let p = Vector3::new(1.0, 2.0, 3.0);
        assert!(matches!(
            TransformManager::from_points(&p, &p, 0.0),
            Err(FEAError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_blockwise_congruence_matches_dense_product() {
        let t = TransformManager::from_points(
            &Vector3::new(1.0, -2.0, 0.5),
            &Vector3::new(3.0, 1.0, 2.0),
            30.0,
        )
        .unwrap();
        let k = DMatrix::from_fn(12, 12, |i, j| ((i * 7 + j * 3) % 11) as f64 + (i == j) as u8 as f64);
        let tm = t.expand(2);

        let expected = tm.transpose() * &k * &tm;
        let blockwise = t.local_to_global_matrix(&k);
        assert_relative_eq!(blockwise, expected, epsilon = 1e-9);

        let back = t.global_to_local_matrix(&blockwise);
        assert_relative_eq!(back, k, epsilon = 1e-9);
    }

    #[test]
    fn test_force_round_trip_through_frames() {
        let t = TransformManager::from_points(&Vector3::zeros(), &Vector3::new(1.0, 2.0, 2.0), 15.0)
            .unwrap();
        let f = Force::new(1.0, -2.0, 3.0, 0.5, 0.0, -1.5);
        let local = t.force_to_local(&f);
        let global = t.force_to_global(&local);
        assert_relative_eq!(global.fx, f.fx, epsilon = 1e-12);
        assert_relative_eq!(global.mz, f.mz, epsilon = 1e-12);
        assert_relative_eq!(local.force().norm(), f.force().norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_member_along_y_displacement_frames() {
        // local y points to global -X
        let t = TransformManager::from_points(&Vector3::zeros(), &Vector3::new(0.0, 4.0, 0.0), 0.0)
            .unwrap();
        let local = Displacement::from_array([0.1, 0.2, 0.3, 0.01, 0.02, 0.03]);
        let global = t.displacement_to_global(&local);
        assert_relative_eq!(global.dx, -0.2, epsilon = 1e-12);
        assert_relative_eq!(global.dy, 0.1, epsilon = 1e-12);
        assert_relative_eq!(global.rz, 0.03, epsilon = 1e-12);
        assert_relative_eq!(t.displacement_to_local(&global).dy, 0.2, epsilon = 1e-12);
    }
}
