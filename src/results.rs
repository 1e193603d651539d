//! Result types for static analysis

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::elements::Dof;

/// Displacement of a node (or of a point along an element)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    /// Displacement in X direction
    pub dx: f64,
    /// Displacement in Y direction
    pub dy: f64,
    /// Displacement in Z direction
    pub dz: f64,
    /// Rotation about X axis
    pub rx: f64,
    /// Rotation about Y axis
    pub ry: f64,
    /// Rotation about Z axis
    pub rz: f64,
}

impl Displacement {
    /// Create from array [DX, DY, DZ, RX, RY, RZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self {
            dx: arr[0],
            dy: arr[1],
            dz: arr[2],
            rx: arr[3],
            ry: arr[4],
            rz: arr[5],
        }
    }

    /// Create from translation and rotation vectors
    pub fn from_vectors(translation: Vector3<f64>, rotation: Vector3<f64>) -> Self {
        Self {
            dx: translation.x,
            dy: translation.y,
            dz: translation.z,
            rx: rotation.x,
            ry: rotation.y,
            rz: rotation.z,
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.dx, self.dy, self.dz)
    }

    pub fn rotation(&self) -> Vector3<f64> {
        Vector3::new(self.rx, self.ry, self.rz)
    }

    /// Component for a single DOF
    pub fn get(&self, dof: Dof) -> f64 {
        self.as_array()[dof.ordinal()]
    }

    pub fn add_component(&mut self, dof: Dof, value: f64) {
        match dof {
            Dof::Dx => self.dx += value,
            Dof::Dy => self.dy += value,
            Dof::Dz => self.dz += value,
            Dof::Rx => self.rx += value,
            Dof::Ry => self.ry += value,
            Dof::Rz => self.rz += value,
        }
    }

    /// Get translation magnitude
    pub fn translation_magnitude(&self) -> f64 {
        (self.dx.powi(2) + self.dy.powi(2) + self.dz.powi(2)).sqrt()
    }

    /// Get rotation magnitude
    pub fn rotation_magnitude(&self) -> f64 {
        (self.rx.powi(2) + self.ry.powi(2) + self.rz.powi(2)).sqrt()
    }
}

/// Force and moment resultant: nodal load, reaction or internal force
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Force {
    /// Force in X direction
    pub fx: f64,
    /// Force in Y direction
    pub fy: f64,
    /// Force in Z direction
    pub fz: f64,
    /// Moment about X axis
    pub mx: f64,
    /// Moment about Y axis
    pub my: f64,
    /// Moment about Z axis
    pub mz: f64,
}

impl Force {
    /// Create a new force with all components
    pub fn new(fx: f64, fy: f64, fz: f64, mx: f64, my: f64, mz: f64) -> Self {
        Self { fx, fy, fz, mx, my, mz }
    }

    /// Create from array [FX, FY, FZ, MX, MY, MZ]
    pub fn from_array(arr: [f64; 6]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3], arr[4], arr[5])
    }

    /// Create from force and moment vectors
    pub fn from_vectors(force: Vector3<f64>, moment: Vector3<f64>) -> Self {
        Self::new(force.x, force.y, force.z, moment.x, moment.y, moment.z)
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.mx, self.my, self.mz]
    }

    pub fn force(&self) -> Vector3<f64> {
        Vector3::new(self.fx, self.fy, self.fz)
    }

    pub fn moment(&self) -> Vector3<f64> {
        Vector3::new(self.mx, self.my, self.mz)
    }

    /// Component acting along / about a single DOF
    pub fn get(&self, dof: Dof) -> f64 {
        self.as_array()[dof.ordinal()]
    }

    /// Add a value to the component matching `dof`
    pub fn add_component(&mut self, dof: Dof, value: f64) {
        match dof {
            Dof::Dx => self.fx += value,
            Dof::Dy => self.fy += value,
            Dof::Dz => self.fz += value,
            Dof::Rx => self.mx += value,
            Dof::Ry => self.my += value,
            Dof::Rz => self.mz += value,
        }
    }

    /// Get total force magnitude
    pub fn force_magnitude(&self) -> f64 {
        (self.fx.powi(2) + self.fy.powi(2) + self.fz.powi(2)).sqrt()
    }

    /// Get total moment magnitude
    pub fn moment_magnitude(&self) -> f64 {
        (self.mx.powi(2) + self.my.powi(2) + self.mz.powi(2)).sqrt()
    }
}

macro_rules! impl_linear_ops {
    ($ty:ident, $($field:ident),+) => {
        impl Add for $ty {
            type Output = $ty;
            fn add(self, rhs: $ty) -> $ty {
                $ty { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, rhs: $ty) {
                $(self.$field += rhs.$field;)+
            }
        }

        impl Sub for $ty {
            type Output = $ty;
            fn sub(self, rhs: $ty) -> $ty {
                $ty { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl Neg for $ty {
            type Output = $ty;
            fn neg(self) -> $ty {
                $ty { $($field: -self.$field),+ }
            }
        }

        impl Mul<f64> for $ty {
            type Output = $ty;
            fn mul(self, factor: f64) -> $ty {
                $ty { $($field: self.$field * factor),+ }
            }
        }
    };
}

impl_linear_ops!(Displacement, dx, dy, dz, rx, ry, rz);
impl_linear_ops!(Force, fx, fy, fz, mx, my, mz);

/// Summary of analysis results for one load case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Load case the summary refers to
    pub load_case: String,
    /// Maximum translation magnitude
    pub max_displacement: f64,
    /// Node with maximum displacement
    pub max_disp_node: Option<usize>,
    /// Maximum reaction force magnitude
    pub max_reaction: f64,
    /// Node with maximum reaction
    pub max_reaction_node: Option<usize>,
    /// Sum of all reaction forces
    pub total_reaction: [f64; 3],
    /// Total number of nodes
    pub num_nodes: usize,
    /// Total number of elements
    pub num_elements: usize,
    /// Total DOFs
    pub total_dofs: usize,
    /// Free DOFs that carry stiffness
    pub free_dofs: usize,
    /// Restrained DOFs (fixed or prescribed)
    pub restrained_dofs: usize,
}
