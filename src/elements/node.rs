//! Node - a point in 3D space carrying six DOFs

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Constraint, Dof, DofConstraint};
use crate::loads::LoadCase;
use crate::results::{Displacement, Force};

/// A 3D node of the structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,

    /// Boundary conditions
    pub constraint: Constraint,

    /// Prescribed displacements by load case (used for `Prescribed` DOFs)
    pub settlements: HashMap<String, Displacement>,

    /// Index assigned when the node is added to a model
    #[serde(skip)]
    pub(crate) id: Option<usize>,

    /// Displacement results by load case
    #[serde(skip)]
    pub(crate) displacements: HashMap<LoadCase, Displacement>,

    /// Reaction results by load case
    #[serde(skip)]
    pub(crate) reactions: HashMap<LoadCase, Force>,
}

impl Node {
    /// Create a new unconstrained node at the given coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            constraint: Constraint::free(),
            settlements: HashMap::new(),
            id: None,
            displacements: HashMap::new(),
            reactions: HashMap::new(),
        }
    }

    /// Set the boundary conditions
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Prescribe a displacement for one load case.
    ///
    /// Only the components whose DOF is `Prescribed` are used.
    pub fn with_settlement(mut self, case: &LoadCase, settlement: Displacement) -> Self {
        self.settlements.insert(case.name.clone(), settlement);
        self
    }

    /// Index of the node in its model
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    /// Get the coordinates as an array
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn location(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Calculate distance to another node
    pub fn distance_to(&self, other: &Node) -> f64 {
        (other.location() - self.location()).norm()
    }

    /// Prescribed value of a DOF for a load case (zero unless `Prescribed`)
    pub fn prescribed_value(&self, dof: Dof, case: &LoadCase) -> f64 {
        match self.constraint.get(dof) {
            DofConstraint::Prescribed => self
                .settlements
                .get(&case.name)
                .map(|s| s.get(dof))
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Get displacement for a load case
    pub fn displacement(&self, case: &LoadCase) -> Option<Displacement> {
        self.displacements.get(case).copied()
    }

    /// Get reactions for a load case
    pub fn reaction(&self, case: &LoadCase) -> Option<Force> {
        self.reactions.get(case).copied()
    }

    pub(crate) fn clear_results(&mut self) {
        self.displacements.clear();
        self.reactions.clear();
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new(1.0, 2.0, 3.0);
        assert_eq!(node.coords(), [1.0, 2.0, 3.0]);
        assert_eq!(node.id(), None);
    }

    #[test]
    fn test_node_distance() {
        let n1 = Node::new(0.0, 0.0, 0.0);
        let n2 = Node::new(3.0, 4.0, 0.0);
        assert!((n1.distance_to(&n2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_prescribed_value_only_for_prescribed_dofs() {
        let case = LoadCase::new("Settle");
        let node = Node::new(0.0, 0.0, 0.0)
            .with_constraint(
                Constraint::fixed().with(Dof::Dz, DofConstraint::Prescribed),
            )
            .with_settlement(
                &case,
                Displacement::from_array([0.1, 0.0, -0.02, 0.0, 0.0, 0.0]),
            );

        assert_eq!(node.prescribed_value(Dof::Dz, &case), -0.02);
        // Dx is Fixed, so the settlement value is ignored
        assert_eq!(node.prescribed_value(Dof::Dx, &case), 0.0);
        assert_eq!(node.prescribed_value(Dof::Dz, &LoadCase::new("Other")), 0.0);
    }
}
