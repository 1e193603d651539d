//! Cross-section properties for bar elements

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Uniform cross-section of a prismatic bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Cross-sectional area in m²
    pub a: f64,
    /// Second moment of area about local y-axis in m⁴ (bending in local x-z plane)
    pub iy: f64,
    /// Second moment of area about local z-axis in m⁴ (bending in local x-y plane)
    pub iz: f64,
    /// Torsional constant in m⁴
    pub j: f64,
    /// Shear correction factor for shear along local y (Timoshenko BeamY)
    pub shear_factor_y: Option<f64>,
    /// Shear correction factor for shear along local z (Timoshenko BeamZ)
    pub shear_factor_z: Option<f64>,
}

impl Section {
    /// Create a new section with basic properties and no shear data
    pub fn new(a: f64, iy: f64, iz: f64, j: f64) -> Self {
        Self {
            a,
            iy,
            iz,
            j,
            shear_factor_y: None,
            shear_factor_z: None,
        }
    }

    /// Set the shear correction factors
    pub fn with_shear_factors(mut self, ky: f64, kz: f64) -> Self {
        self.shear_factor_y = Some(ky);
        self.shear_factor_z = Some(kz);
        self
    }

    /// Create a rectangular section (`depth` along local z)
    pub fn rectangular(width: f64, depth: f64) -> Self {
        let a = width * depth;
        let iy = width * depth.powi(3) / 12.0;
        let iz = depth * width.powi(3) / 12.0;

        // Torsional constant for rectangle (approximate)
        let (a_dim, b_dim) = if width > depth { (width, depth) } else { (depth, width) };
        let j = a_dim * b_dim.powi(3) / 3.0 * (1.0 - 0.63 * b_dim / a_dim);

        Self::new(a, iy, iz, j).with_shear_factors(5.0 / 6.0, 5.0 / 6.0)
    }

    /// Create a solid circular section
    pub fn circular(diameter: f64) -> Self {
        let r = diameter / 2.0;
        let a = PI * r.powi(2);
        let i = PI * r.powi(4) / 4.0;
        let j = PI * r.powi(4) / 2.0;

        Self::new(a, i, i, j).with_shear_factors(0.9, 0.9)
    }

    /// Create a hollow circular (pipe) section
    pub fn pipe(outer_diameter: f64, wall_thickness: f64) -> Self {
        let r_o = outer_diameter / 2.0;
        let r_i = r_o - wall_thickness;

        let a = PI * (r_o.powi(2) - r_i.powi(2));
        let i = PI * (r_o.powi(4) - r_i.powi(4)) / 4.0;
        let j = PI * (r_o.powi(4) - r_i.powi(4)) / 2.0;

        Self::new(a, i, i, j).with_shear_factors(0.5, 0.5)
    }

    /// Get the polar moment of inertia
    pub fn ip(&self) -> f64 {
        self.iy + self.iz
    }
}

impl Default for Section {
    fn default() -> Self {
        // 200mm x 200mm rectangular section
        Self::rectangular(0.2, 0.2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_section() {
        let section = Section::rectangular(0.3, 0.5);
        let expected_iy = 0.3 * 0.5_f64.powi(3) / 12.0;

        assert!((section.a - 0.15).abs() < 1e-10);
        assert!((section.iy - expected_iy).abs() < 1e-10);
        assert_eq!(section.shear_factor_y, Some(5.0 / 6.0));
    }

    #[test]
    fn test_plain_section_has_no_shear_data() {
        let section = Section::new(0.01, 1e-5, 2e-5, 3e-6);
        assert!(section.shear_factor_y.is_none());
        assert!(section.shear_factor_z.is_none());
    }

    #[test]
    fn test_circular_section() {
        let section = Section::circular(0.5);
        assert!((section.a - PI * 0.0625).abs() < 1e-10);
        assert!((section.iy - section.iz).abs() < 1e-10);
    }
}
