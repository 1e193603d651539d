//! Sparse matrix utilities for the global stiffness matrix
//!
//! Frame stiffness matrices are mostly empty. Element matrices are collected
//! as COO triplets and merged into CSR for the reduced solve.

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Sparse matrix builder using COO format
/// More efficient for incremental assembly
#[derive(Debug, Clone)]
pub struct SparseMatrixBuilder {
    size: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl SparseMatrixBuilder {
    /// Create a new sparse matrix builder
    pub fn new(size: usize) -> Self {
        // 6 DOFs per node, a handful of neighbours per node
        let estimated_nnz = size * 36;
        Self {
            size,
            entries: Vec::with_capacity(estimated_nnz),
        }
    }

    /// Add a value to the matrix (accumulates if already exists)
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value != 0.0 {
            self.entries.push((row, col, value));
        }
    }

    /// Append triplets produced elsewhere (e.g. by a worker thread)
    pub fn extend<I: IntoIterator<Item = (usize, usize, f64)>>(&mut self, triplets: I) {
        for (row, col, value) in triplets {
            self.add(row, col, value);
        }
    }

    /// Convert to CSR format for efficient solves (duplicates are summed)
    pub fn to_csr(&self) -> CsrMatrix<f64> {
        let mut coo = CooMatrix::new(self.size, self.size);

        for &(row, col, val) in &self.entries {
            coo.push(row, col, val);
        }

        CsrMatrix::from(&coo)
    }

    /// Number of stored triplets (before merging duplicates)
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }
}

/// A pivot that failed during factorisation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotFailure {
    /// Row of the factorised matrix
    pub index: usize,
    /// Remaining pivot divided by the original diagonal entry
    pub ratio: f64,
}

/// Skyline Cholesky solver for symmetric positive definite matrices.
///
/// The factorisation is computed once and reused for any number of
/// right-hand sides.
#[derive(Debug, Clone)]
pub struct SparseCholeskySolver {
    size: usize,
    // Row-wise skyline: for each row, entries from the first non-zero to the diagonal
    skyline: Vec<Vec<f64>>,
    heights: Vec<usize>,
    diagonal: Vec<f64>,
}

impl SparseCholeskySolver {
    /// Create solver from the lower triangle of a symmetric CSR matrix
    pub fn new(csr: &CsrMatrix<f64>) -> Self {
        let size = csr.nrows();

        let mut heights = vec![0usize; size];
        for (row, col, _val) in csr.triplet_iter() {
            if col < row {
                heights[row] = heights[row].max(row - col);
            }
        }

        let mut skyline: Vec<Vec<f64>> = heights.iter().map(|h| vec![0.0; h + 1]).collect();
        let mut diagonal = vec![0.0; size];

        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                let idx = col - (row - heights[row]);
                skyline[row][idx] += val;
                if col == row {
                    diagonal[row] += val;
                }
            }
        }

        Self {
            size,
            skyline,
            heights,
            diagonal,
        }
    }

    /// Factorize in place.
    ///
    /// A pivot whose remaining value falls below `tolerance` times the
    /// original diagonal entry is reported as a failure.
    pub fn factorize(&mut self, tolerance: f64) -> Result<(), PivotFailure> {
        for i in 0..self.size {
            let hi = self.heights[i];
            let start_i = i - hi;

            // L[i,j] for j < i
            for j in start_i..i {
                let hj = self.heights[j];
                let start_j = j - hj;

                let start = start_i.max(start_j);
                let mut sum = 0.0;
                for k in start..j {
                    sum += self.get(i, k) * self.get(j, k);
                }

                let diag_j = self.skyline[j][hj];
                let idx = j - start_i;
                self.skyline[i][idx] = (self.skyline[i][idx] - sum) / diag_j;
            }

            // L[i,i]
            let mut sum = 0.0;
            for j in start_i..i {
                let val = self.get(i, j);
                sum += val * val;
            }

            let pivot = self.skyline[i][hi] - sum;
            let ratio = if self.diagonal[i] > 0.0 {
                pivot / self.diagonal[i]
            } else {
                0.0
            };
            if !(pivot > 0.0) || ratio < tolerance {
                return Err(PivotFailure { index: i, ratio });
            }
            self.skyline[i][hi] = pivot.sqrt();
        }

        Ok(())
    }

    /// Smallest pivot ratio L_ii² / K_ii of a factorised matrix
    pub fn weakest_pivot(&self) -> Option<PivotFailure> {
        (0..self.size)
            .map(|i| {
                let l = self.get(i, i);
                PivotFailure {
                    index: i,
                    ratio: l * l / self.diagonal[i],
                }
            })
            .min_by(|a, b| a.ratio.total_cmp(&b.ratio))
    }

    /// Entry of the lower triangle (L after factorisation)
    #[inline]
    fn get(&self, row: usize, col: usize) -> f64 {
        let start = row - self.heights[row];
        if col < start || col > row {
            return 0.0;
        }
        self.skyline[row][col - start]
    }

    /// Solve L * L^T * x = b
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let mut x = b.clone();

        // Forward substitution: L * y = b
        for i in 0..self.size {
            let start = i - self.heights[i];
            let mut sum = 0.0;
            for j in start..i {
                sum += self.get(i, j) * x[j];
            }
            x[i] = (x[i] - sum) / self.get(i, i);
        }

        // Backward substitution: L^T * x = y
        for i in (0..self.size).rev() {
            x[i] /= self.get(i, i);
            let start = i - self.heights[i];
            for j in start..i {
                x[j] -= self.get(i, j) * x[i];
            }
        }

        x
    }
}

/// Sparse matrix-vector multiplication
pub fn csr_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    let mut y = DVector::zeros(csr.nrows());
    for (row, lane) in csr.row_iter().enumerate() {
        y[row] = lane
            .col_indices()
            .iter()
            .zip(lane.values())
            .map(|(&col, &val)| val * x[col])
            .sum();
    }
    y
}

/// Extract the square sub-matrix addressed by `map`.
///
/// `map[i]` is the new index of row/column `i`, or `None` to drop it.
pub fn csr_submatrix(csr: &CsrMatrix<f64>, map: &[Option<usize>], size: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(size, size);
    for (row, col, &val) in csr.triplet_iter() {
        if let (Some(r), Some(c)) = (map[row], map[col]) {
            coo.push(r, c, val);
        }
    }
    CsrMatrix::from(&coo)
}

/// Bandwidth reduction using Reverse Cuthill-McKee algorithm
///
/// Returns `perm` with `perm[new] = old`
pub fn reverse_cuthill_mckee(csr: &CsrMatrix<f64>) -> Vec<usize> {
    let n = csr.nrows();
    if n == 0 {
        return vec![];
    }

    // Build adjacency list
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (row, col, &val) in csr.triplet_iter() {
        if val != 0.0 && row != col {
            adj[row].push(col);
        }
    }

    let degrees: Vec<usize> = adj.iter().map(|v| v.len()).collect();
    for neighbors in &mut adj {
        neighbors.sort_by_key(|&i| degrees[i]);
    }

    let mut visited = vec![false; n];
    let mut result = Vec::with_capacity(n);
    let mut queue = std::collections::VecDeque::new();

    // Start from node with minimum degree
    let start = (0..n).min_by_key(|&i| degrees[i]).unwrap_or(0);
    queue.push_back(start);
    visited[start] = true;

    while let Some(node) = queue.pop_front() {
        result.push(node);

        for &neighbor in &adj[node] {
            if !visited[neighbor] {
                visited[neighbor] = true;
                queue.push_back(neighbor);
            }
        }

        // Disconnected components
        if queue.is_empty() && result.len() < n {
            if let Some(next) = (0..n).filter(|&i| !visited[i]).min_by_key(|&i| degrees[i]) {
                visited[next] = true;
                queue.push_back(next);
            }
        }
    }

    result.reverse();
    result
}

/// Create inverse permutation
pub fn inverse_permutation(perm: &[usize]) -> Vec<usize> {
    let mut inv = vec![0; perm.len()];
    for (new_idx, &old_idx) in perm.iter().enumerate() {
        inv[old_idx] = new_idx;
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn tridiagonal(n: usize) -> SparseMatrixBuilder {
        let mut builder = SparseMatrixBuilder::new(n);
        for i in 0..n {
            builder.add(i, i, 4.0);
            if i + 1 < n {
                builder.add(i, i + 1, -1.0);
                builder.add(i + 1, i, -1.0);
            }
        }
        builder
    }

    #[test]
    fn test_duplicates_are_summed() {
        let mut builder = SparseMatrixBuilder::new(2);
        builder.add(0, 0, 1.5);
        builder.add(0, 0, 2.5);
        builder.add(1, 1, 1.0);

        let csr = builder.to_csr();
        let dense = DMatrix::from(&csr);
        assert_relative_eq!(dense[(0, 0)], 4.0);
        assert_eq!(builder.nnz(), 3);
    }

    #[test]
    fn test_skyline_cholesky_solve() {
        let builder = tridiagonal(5);
        let csr = builder.to_csr();
        let b = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut solver = SparseCholeskySolver::new(&csr);
        solver.factorize(1e-10).unwrap();
        let x = solver.solve(&b);

        let residual = (csr_matvec(&csr, &x) - &b).norm();
        assert!(residual < 1e-10, "residual: {}", residual);
    }

    #[test]
    fn test_singular_pivot_is_located() {
        let mut builder = SparseMatrixBuilder::new(3);
        builder.add(0, 0, 1.0);
        builder.add(0, 1, -1.0);
        builder.add(1, 0, -1.0);
        builder.add(1, 1, 1.0);
        builder.add(2, 2, 1.0);

        let mut solver = SparseCholeskySolver::new(&builder.to_csr());
        let failure = solver.factorize(1e-10).unwrap_err();
        assert_eq!(failure.index, 1);
    }

    #[test]
    fn test_weakest_pivot_ratio() {
        let mut builder = SparseMatrixBuilder::new(2);
        builder.add(0, 0, 4.0);
        builder.add(0, 1, 2.0);
        builder.add(1, 0, 2.0);
        builder.add(1, 1, 2.0);

        let mut solver = SparseCholeskySolver::new(&builder.to_csr());
        solver.factorize(1e-10).unwrap();
        let weakest = solver.weakest_pivot().unwrap();
        assert_eq!(weakest.index, 1);
        assert_relative_eq!(weakest.ratio, 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_rcm_is_a_permutation() {
        let csr = tridiagonal(6).to_csr();
        let perm = reverse_cuthill_mckee(&csr);
        let inv = inverse_permutation(&perm);

        let mut sorted = perm.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());
        for (new, &old) in perm.iter().enumerate() {
            assert_eq!(inv[old], new);
        }
    }
}
