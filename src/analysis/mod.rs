//! Analysis options, global assembly and the constrained linear solve

mod assembly;
mod solver;

pub use assembly::{assemble_stiffness, element_triplets, DofMap};
pub use solver::{CaseSolution, Factorization, LinearSystem};

use serde::{Deserialize, Serialize};

use crate::loads::LoadCase;

/// Factorisation used for the reduced stiffness matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverKind {
    /// nalgebra dense Cholesky
    Dense,
    /// Skyline Cholesky after reverse Cuthill-McKee reordering
    #[default]
    Sparse,
}

/// Options for structural analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Factorisation of the free-free stiffness matrix
    pub solver: SolverKind,
    /// Smallest accepted ratio of a Cholesky pivot to its diagonal entry
    pub singularity_tolerance: f64,
    /// Check static equilibrium after analysis
    pub check_statics: bool,
    /// Load cases to analyze (None = every case referenced by the model)
    pub cases: Option<Vec<LoadCase>>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            solver: SolverKind::Sparse,
            singularity_tolerance: 1e-10,
            check_statics: false,
            cases: None,
        }
    }
}

impl AnalysisOptions {
    /// Dense Cholesky solve
    pub fn dense() -> Self {
        Self {
            solver: SolverKind::Dense,
            ..Self::default()
        }
    }

    /// Sparse skyline solve
    pub fn sparse() -> Self {
        Self::default()
    }

    /// Restrict the analysis to some load cases
    pub fn with_cases(mut self, cases: Vec<LoadCase>) -> Self {
        self.cases = Some(cases);
        self
    }

    pub fn with_statics_check(mut self) -> Self {
        self.check_statics = true;
        self
    }

    pub fn with_singularity_tolerance(mut self, tol: f64) -> Self {
        self.singularity_tolerance = tol;
        self
    }
}
