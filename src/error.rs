//! Error types for the skeletal solver

use thiserror::Error;

/// Main error type for analysis operations
#[derive(Error, Debug)]
pub enum FEAError {
    #[error("Node {0} not found in model")]
    NodeNotFound(usize),

    #[error("Element {0} not found in model")]
    ElementNotFound(usize),

    #[error("Load case '{0}' not found in model")]
    LoadCaseNotFound(String),

    #[error("Load combination '{0}' not found in model")]
    LoadCombinationNotFound(String),

    #[error("Duplicate name '{0}' already exists")]
    DuplicateName(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Bad input detected while computing an element or query
    /// (iso-coordinate out of range, missing material/section data, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Node counts, behaviour combinations or shape orders the closed-form
    /// formulations do not cover
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// The reduced free-free stiffness matrix cannot be factorised
    #[error("Structure is under-restrained (singular stiffness, {free_dofs} free DOFs): {detail}")]
    StructuralSingularity { free_dofs: usize, detail: String },

    #[error(
        "Internal force is discontinuous at xi = {xi}; query slightly before or after this point"
    )]
    DiscontinuityQuery { xi: f64 },

    #[error("Model not analyzed - run solve() first")]
    NotAnalyzed,

    #[error("Math error: {0}")]
    MathError(String),
}

/// Result type for analysis operations
pub type FEAResult<T> = Result<T, FEAError>;
