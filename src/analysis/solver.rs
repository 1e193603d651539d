//! Reduced linear solve: factorise K_ff once, solve every load case

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use nalgebra_sparse::CsrMatrix;

use super::{DofMap, SolverKind};
use crate::error::{FEAError, FEAResult};
use crate::math::{
    csr_matvec, csr_submatrix, inverse_permutation, reverse_cuthill_mckee, PivotFailure,
    SparseCholeskySolver,
};

/// Factorisation of the free-free stiffness matrix
#[derive(Debug, Clone)]
pub enum Factorization {
    Dense(Cholesky<f64, Dyn>),
    Sparse {
        solver: SparseCholeskySolver,
        /// `perm[new] = old`
        perm: Vec<usize>,
    },
}

impl Factorization {
    /// Factorise a symmetric positive definite matrix.
    ///
    /// On failure the pivot index refers to the rows of `k`.
    pub fn new(k: &CsrMatrix<f64>, kind: SolverKind, tolerance: f64) -> Result<Self, PivotFailure> {
        match kind {
            SolverKind::Dense => Self::dense(k, tolerance),
            SolverKind::Sparse => Self::sparse(k, tolerance),
        }
    }

    fn dense(k: &CsrMatrix<f64>, tolerance: f64) -> Result<Self, PivotFailure> {
        let dense = DMatrix::from(k);
        let diagonal = dense.diagonal();

        let chol = match dense.cholesky() {
            Some(chol) => chol,
            None => {
                // Locate the pivot with the skyline factorisation; if it
                // succeeds, report its weakest pivot
                let mut skyline = SparseCholeskySolver::new(k);
                skyline.factorize(tolerance)?;
                return Err(skyline.weakest_pivot().unwrap_or(PivotFailure {
                    index: 0,
                    ratio: 0.0,
                }));
            }
        };

        let l = chol.l_dirty();
        for i in 0..diagonal.len() {
            let ratio = l[(i, i)] * l[(i, i)] / diagonal[i];
            if ratio < tolerance {
                return Err(PivotFailure { index: i, ratio });
            }
        }

        Ok(Factorization::Dense(chol))
    }

    fn sparse(k: &CsrMatrix<f64>, tolerance: f64) -> Result<Self, PivotFailure> {
        let perm = reverse_cuthill_mckee(k);
        let inv = inverse_permutation(&perm);
        let map: Vec<Option<usize>> = inv.iter().map(|&new| Some(new)).collect();
        let permuted = csr_submatrix(k, &map, k.nrows());

        let mut solver = SparseCholeskySolver::new(&permuted);
        solver.factorize(tolerance).map_err(|failure| PivotFailure {
            index: perm[failure.index],
            ratio: failure.ratio,
        })?;

        Ok(Factorization::Sparse { solver, perm })
    }

    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        match self {
            Factorization::Dense(chol) => chol.solve(b),
            Factorization::Sparse { solver, perm } => {
                let pb = DVector::from_iterator(perm.len(), perm.iter().map(|&old| b[old]));
                let px = solver.solve(&pb);
                let mut x = DVector::zeros(perm.len());
                for (new, &old) in perm.iter().enumerate() {
                    x[old] = px[new];
                }
                x
            }
        }
    }
}

/// Displacements and reactions of one load case (global DOF vectors)
#[derive(Debug, Clone)]
pub struct CaseSolution {
    pub displacements: DVector<f64>,
    /// Non-zero at restrained DOFs only
    pub reactions: DVector<f64>,
}

/// Assembled, partitioned and factorised structure
#[derive(Debug, Clone)]
pub struct LinearSystem {
    pub k: CsrMatrix<f64>,
    pub dofs: DofMap,
    factorization: Option<Factorization>,
}

impl LinearSystem {
    /// Partition the global matrix and factorise K_ff
    pub fn new(
        k: CsrMatrix<f64>,
        dofs: DofMap,
        kind: SolverKind,
        tolerance: f64,
    ) -> FEAResult<Self> {
        let free_count = dofs.free.len();
        if free_count == 0 && dofs.restrained.is_empty() {
            return Err(FEAError::StructuralSingularity {
                free_dofs: 0,
                detail: "no element contributes stiffness".into(),
            });
        }

        let factorization = if free_count > 0 {
            let k_ff = csr_submatrix(&k, &dofs.free_index, free_count);
            let factor = Factorization::new(&k_ff, kind, tolerance).map_err(|failure| {
                let (node, dof) = DofMap::locate(dofs.free[failure.index]);
                FEAError::StructuralSingularity {
                    free_dofs: free_count,
                    detail: format!(
                        "pivot ratio {:.3e} at node {} {:?}; the structure is a mechanism \
                         or insufficiently supported",
                        failure.ratio, node, dof
                    ),
                }
            })?;
            Some(factor)
        } else {
            None
        };

        Ok(Self {
            k,
            dofs,
            factorization,
        })
    }

    /// Solve `K_ff U_f = F_f - K_fr U_r` and recover reactions
    /// `R = K_rf U_f + K_rr U_r - F_r`.
    ///
    /// `loads` and `prescribed` are full global vectors; only the restrained
    /// entries of `prescribed` are used.
    pub fn solve_case(&self, loads: &DVector<f64>, prescribed: &DVector<f64>) -> FEAResult<CaseSolution> {
        let n = self.dofs.n_dofs;

        for &i in &self.dofs.inactive {
            if loads[i] != 0.0 {
                let (node, dof) = DofMap::locate(i);
                return Err(FEAError::StructuralSingularity {
                    free_dofs: self.dofs.free.len(),
                    detail: format!(
                        "load {} on node {} {:?}, which has no stiffness",
                        loads[i], node, dof
                    ),
                });
            }
        }

        let mut u = DVector::zeros(n);
        for &i in &self.dofs.restrained {
            u[i] = prescribed[i];
        }

        if let Some(factor) = &self.factorization {
            // K_fr * U_r through the full matrix with U_f = 0
            let k_ur = csr_matvec(&self.k, &u);
            let rhs = DVector::from_iterator(
                self.dofs.free.len(),
                self.dofs.free.iter().map(|&i| loads[i] - k_ur[i]),
            );
            let u_f = factor.solve(&rhs);
            for (f, &i) in self.dofs.free.iter().enumerate() {
                u[i] = u_f[f];
            }
        }

        let ku = csr_matvec(&self.k, &u);
        let mut reactions = DVector::zeros(n);
        for &i in &self.dofs.restrained {
            reactions[i] = ku[i] - loads[i];
        }

        Ok(CaseSolution {
            displacements: u,
            reactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::SparseMatrixBuilder;
    use approx::assert_relative_eq;

    fn spring_chain() -> CsrMatrix<f64> {
        // 3 springs in series, k = 2
        let mut builder = SparseMatrixBuilder::new(4);
        for e in 0..3 {
            builder.add(e, e, 2.0);
            builder.add(e + 1, e + 1, 2.0);
            builder.add(e, e + 1, -2.0);
            builder.add(e + 1, e, -2.0);
        }
        builder.to_csr()
    }

    #[test]
    fn test_dense_and_sparse_agree() {
        let k = spring_chain();
        let map: Vec<Option<usize>> = vec![None, Some(0), Some(1), Some(2)];
        let k_ff = csr_submatrix(&k, &map, 3);
        let b = DVector::from_vec(vec![0.0, 0.0, 1.0]);

        let dense = Factorization::new(&k_ff, SolverKind::Dense, 1e-10).unwrap();
        let sparse = Factorization::new(&k_ff, SolverKind::Sparse, 1e-10).unwrap();
        let xd = dense.solve(&b);
        let xs = sparse.solve(&b);

        assert_relative_eq!(xd, xs, epsilon = 1e-12);
        assert_relative_eq!(xd[2], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_free_chain_is_singular() {
        let k = spring_chain();
        assert!(Factorization::new(&k, SolverKind::Dense, 1e-10).is_err());
        assert!(Factorization::new(&k, SolverKind::Sparse, 1e-10).is_err());
    }
}
