//! Skeletal FEA - linear static analysis of bar and frame structures
//!
//! Bar elements combine independent closed-form formulations selected by a
//! behaviour mask:
//! - Euler-Bernoulli or Timoshenko bending in each local plane
//! - Truss (axial) and shaft (torsion) action
//! - End releases by static condensation
//! - Exact internal forces between nodes, including element loads
//!
//! ## Example
//! ```rust
//! use skeletal_fea::prelude::*;
//!
//! let mut model = Model::new();
//!
//! // 10m cantilever along X
//! let n1 = model.add_node(Node::new(0.0, 0.0, 0.0).with_constraint(Constraint::fixed()));
//! let n2 = model.add_node(Node::new(10.0, 0.0, 0.0));
//!
//! let bar = BarElement::new(model.node(n1).unwrap(), model.node(n2).unwrap())
//!     .with_material(Material::steel())
//!     .with_section(Section::rectangular(0.3, 0.5));
//! let e1 = model.add_element(bar).unwrap();
//!
//! // 10 kN downward at the tip
//! let dead = LoadCase::dead();
//! model.add_node_load(n2, NodalLoad::fy(-10_000.0, &dead)).unwrap();
//!
//! model.solve().unwrap();
//!
//! let tip = model.node_displacement(n2, &dead).unwrap();
//! assert!(tip.dy < 0.0);
//! let mid = model.internal_force_at(e1, 0.0, &dead).unwrap();
//! assert!((mid.mz + 50_000.0).abs() < 1e-3);
//! ```

pub mod analysis;
pub mod elements;
pub mod error;
pub mod loads;
pub mod math;
pub mod model;
pub mod results;

// Re-export common types
pub mod prelude {
    pub use crate::analysis::{AnalysisOptions, SolverKind};
    pub use crate::elements::{
        BarBehavior, BarElement, Constraint, Dof, DofConstraint, Material, Node, Release,
        Section,
    };
    pub use crate::error::{FEAError, FEAResult};
    pub use crate::loads::{
        ConcentratedLoad, ElementLoad, LoadCase, LoadCombination, LoadDirection, LoadType,
        NodalLoad, UniformLoad,
    };
    pub use crate::model::Model;
    pub use crate::results::{AnalysisSummary, Displacement, Force};
}
