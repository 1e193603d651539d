//! Load combinations

use serde::{Deserialize, Serialize};

use super::LoadCase;

/// A load combination is a factored sum of already solved load cases.
///
/// Combination results are obtained by superposition; a combination is never
/// assembled or solved on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadCombination {
    /// Name of the load combination
    pub name: String,
    /// Factors for each load case
    pub factors: Vec<(LoadCase, f64)>,
}

impl LoadCombination {
    /// Create a new empty load combination
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            factors: Vec::new(),
        }
    }

    /// Create a load combination with a single load case at factor 1.0
    pub fn single(name: &str, case: &LoadCase) -> Self {
        Self::new(name).with_case(case, 1.0)
    }

    /// Add a load case with a factor (replaces an existing factor for the case)
    pub fn with_case(mut self, case: &LoadCase, factor: f64) -> Self {
        match self.factors.iter_mut().find(|(c, _)| c == case) {
            Some(entry) => entry.1 = factor,
            None => self.factors.push((case.clone(), factor)),
        }
        self
    }

    /// Get the factor for a load case
    pub fn factor(&self, case: &LoadCase) -> f64 {
        self.factors
            .iter()
            .find(|(c, _)| c == case)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Check if this combination includes a specific load case
    pub fn includes(&self, case: &LoadCase) -> bool {
        self.factor(case).abs() > 1e-10
    }

    /// Factored dead + live combination
    pub fn lrfd_dead_live() -> Self {
        Self::new("1.2D + 1.6L")
            .with_case(&LoadCase::dead(), 1.2)
            .with_case(&LoadCase::live(), 1.6)
    }

    pub fn asd_dead_live() -> Self {
        Self::new("D + L")
            .with_case(&LoadCase::dead(), 1.0)
            .with_case(&LoadCase::live(), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_replaces_existing() {
        let dead = LoadCase::dead();
        let combo = LoadCombination::new("C")
            .with_case(&dead, 1.2)
            .with_case(&dead, 1.4);
        assert_eq!(combo.factors.len(), 1);
        assert_eq!(combo.factor(&dead), 1.4);
        assert!(!combo.includes(&LoadCase::live()));
    }
}
