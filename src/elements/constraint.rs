//! Node constraints and element end releases

use serde::{Deserialize, Serialize};

use super::Dof;

/// State of a single nodal DOF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DofConstraint {
    /// Unknown displacement, solved for
    #[default]
    Free,
    /// Zero displacement
    Fixed,
    /// Displacement given by the node's settlement for each load case
    Prescribed,
}

impl DofConstraint {
    pub fn is_restrained(self) -> bool {
        !matches!(self, DofConstraint::Free)
    }
}

/// Boundary conditions of a node [DX, DY, DZ, RX, RY, RZ]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraint {
    pub dofs: [DofConstraint; 6],
}

impl Constraint {
    /// No restraints
    pub fn free() -> Self {
        Self::default()
    }

    /// All DOFs restrained
    pub fn fixed() -> Self {
        Self {
            dofs: [DofConstraint::Fixed; 6],
        }
    }

    /// Translations restrained, rotations free
    pub fn pinned() -> Self {
        Self::free()
            .with(Dof::Dx, DofConstraint::Fixed)
            .with(Dof::Dy, DofConstraint::Fixed)
            .with(Dof::Dz, DofConstraint::Fixed)
    }

    /// Create a constraint with specific restraints
    pub fn with_restraints(dx: bool, dy: bool, dz: bool, rx: bool, ry: bool, rz: bool) -> Self {
        let flag = |b: bool| if b { DofConstraint::Fixed } else { DofConstraint::Free };
        Self {
            dofs: [flag(dx), flag(dy), flag(dz), flag(rx), flag(ry), flag(rz)],
        }
    }

    /// Set the state of one DOF
    pub fn with(mut self, dof: Dof, state: DofConstraint) -> Self {
        self.dofs[dof.ordinal()] = state;
        self
    }

    pub fn get(&self, dof: Dof) -> DofConstraint {
        self.dofs[dof.ordinal()]
    }

    /// Get list of restrained DOFs
    pub fn restrained_dofs(&self) -> Vec<Dof> {
        Dof::ALL
            .into_iter()
            .filter(|d| self.get(*d).is_restrained())
            .collect()
    }

    /// Get list of free DOFs
    pub fn free_dofs(&self) -> Vec<Dof> {
        Dof::ALL
            .into_iter()
            .filter(|d| !self.get(*d).is_restrained())
            .collect()
    }

    /// Check if any DOF is restrained
    pub fn is_supported(&self) -> bool {
        self.dofs.iter().any(|d| d.is_restrained())
    }

    /// Count number of restrained DOFs
    pub fn num_restrained(&self) -> usize {
        self.restrained_dofs().len()
    }
}

/// Connection of an element to one of its nodes, in the element's local frame.
///
/// A released DOF is disconnected from the node for this element only; the
/// node's own constraint is not affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Release {
    /// Released flags [DX, DY, DZ, RX, RY, RZ]
    pub released: [bool; 6],
}

impl Release {
    /// Rigid connection
    pub fn none() -> Self {
        Self::default()
    }

    /// Bending moment hinge (local RY and RZ released)
    pub fn pin() -> Self {
        Self::none().with(Dof::Ry).with(Dof::Rz)
    }

    /// Release an additional DOF
    pub fn with(mut self, dof: Dof) -> Self {
        self.released[dof.ordinal()] = true;
        self
    }

    pub fn is_released(&self, dof: Dof) -> bool {
        self.released[dof.ordinal()]
    }

    pub fn any(&self) -> bool {
        self.released.iter().any(|r| *r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constraint() {
        let c = Constraint::fixed();
        assert_eq!(c.num_restrained(), 6);
        assert!(c.free_dofs().is_empty());
    }

    #[test]
    fn test_pinned_constraint() {
        let c = Constraint::pinned();
        assert_eq!(c.num_restrained(), 3);
        assert_eq!(c.free_dofs(), vec![Dof::Rx, Dof::Ry, Dof::Rz]);
    }

    #[test]
    fn test_prescribed_counts_as_restrained() {
        let c = Constraint::free().with(Dof::Dz, DofConstraint::Prescribed);
        assert!(c.is_supported());
        assert_eq!(c.restrained_dofs(), vec![Dof::Dz]);
    }

    #[test]
    fn test_pin_release() {
        let r = Release::pin();
        assert!(!r.is_released(Dof::Dx));
        assert!(r.is_released(Dof::Ry));
        assert!(r.is_released(Dof::Rz));
        assert!(r.any());
        assert!(!Release::none().any());
    }
}
