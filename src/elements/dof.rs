//! Degree-of-freedom identifiers

use serde::{Deserialize, Serialize};

/// Number of DOFs carried by every node
pub const DOFS_PER_NODE: usize = 6;

/// One of the six nodal degrees of freedom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dof {
    Dx,
    Dy,
    Dz,
    Rx,
    Ry,
    Rz,
}

impl Dof {
    pub const ALL: [Dof; 6] = [Dof::Dx, Dof::Dy, Dof::Dz, Dof::Rx, Dof::Ry, Dof::Rz];

    /// Position of this DOF inside a node's 6-DOF block
    pub fn ordinal(self) -> usize {
        match self {
            Dof::Dx => 0,
            Dof::Dy => 1,
            Dof::Dz => 2,
            Dof::Rx => 3,
            Dof::Ry => 4,
            Dof::Rz => 5,
        }
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Dof> {
        Dof::ALL.get(ordinal).copied()
    }

    /// Global DOF index for a node
    pub fn global_index(self, node_index: usize) -> usize {
        node_index * DOFS_PER_NODE + self.ordinal()
    }
}

/// A DOF of a specific element node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDof {
    /// Index of the node inside the element's node list
    pub node_index: usize,
    pub dof: Dof,
}

impl ElementDof {
    pub fn new(node_index: usize, dof: Dof) -> Self {
        Self { node_index, dof }
    }

    /// Row/column inside the element's 6n local matrices
    pub fn local_index(&self) -> usize {
        self.node_index * DOFS_PER_NODE + self.dof.ordinal()
    }
}
