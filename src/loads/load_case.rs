//! Load cases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Nature of the loads grouped in a load case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoadType {
    #[default]
    Default,
    Dead,
    Live,
    Snow,
    Wind,
    Quake,
    Other,
}

/// A load case groups loads that are solved together as one linear system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadCase {
    /// Name of the load case
    pub name: String,
    /// Load type
    pub load_type: LoadType,
}

impl LoadCase {
    /// Create a new load case of default type
    pub fn new(name: &str) -> Self {
        Self::with_type(name, LoadType::Default)
    }

    /// Create a load case with explicit type
    pub fn with_type(name: &str, load_type: LoadType) -> Self {
        Self {
            name: name.to_string(),
            load_type,
        }
    }

    /// Common load cases
    pub fn dead() -> Self {
        Self::with_type("Dead", LoadType::Dead)
    }

    pub fn live() -> Self {
        Self::with_type("Live", LoadType::Live)
    }

    pub fn wind() -> Self {
        Self::with_type("Wind", LoadType::Wind)
    }

    pub fn snow() -> Self {
        Self::with_type("Snow", LoadType::Snow)
    }
}

impl Default for LoadCase {
    fn default() -> Self {
        Self::new("Case 1")
    }
}

impl fmt::Display for LoadCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.load_type)
    }
}
