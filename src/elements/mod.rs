//! Structural elements module

mod bar;
mod constraint;
mod dof;
pub mod helpers;
mod material;
mod node;
mod section;

pub use bar::{BarBehavior, BarElement, ElementNode};
pub use constraint::{Constraint, DofConstraint, Release};
pub use dof::{Dof, ElementDof, DOFS_PER_NODE};
pub use helpers::{BeamDirection, ElementHelper};
pub use material::Material;
pub use node::Node;
pub use section::Section;
