//! Material properties

use serde::{Deserialize, Serialize};

/// Uniform elastic material for bar elements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Modulus of elasticity (Young's modulus) in Pa
    pub e: f64,
    /// Shear modulus in Pa
    pub g: f64,
    /// Density in kg/m³ (mass matrices)
    pub rho: f64,
    /// Damping density (damping matrices)
    pub mu: f64,
}

impl Material {
    /// Create a new material from E and G
    pub fn new(e: f64, g: f64) -> Self {
        Self {
            e,
            g,
            rho: 0.0,
            mu: 0.0,
        }
    }

    /// Create a new isotropic material from E and nu
    /// G is calculated as E / (2 * (1 + nu))
    pub fn isotropic(e: f64, nu: f64) -> Self {
        Self::new(e, e / (2.0 * (1.0 + nu)))
    }

    /// Set the density
    pub fn with_density(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    /// Set the damping density
    pub fn with_damping(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Create a standard structural steel
    pub fn steel() -> Self {
        Self::new(200e9, 77e9).with_density(7850.0)
    }

    /// Create an aluminum material (6061-T6)
    pub fn aluminum() -> Self {
        Self::new(68.9e9, 26e9).with_density(2700.0)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isotropic_shear_modulus() {
        let m = Material::isotropic(210e9, 0.3);
        assert!((m.g - 210e9 / 2.6).abs() < 1.0);
        assert_eq!(m.rho, 0.0);
    }
}
