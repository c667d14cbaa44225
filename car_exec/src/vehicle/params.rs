//! Parameters structure for the vehicle

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleParams {
    /// Smallest speed magnitude at which the motors overcome static friction. Any nonzero speed
    /// demand is raised to at least this value.
    pub min_effective_speed: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            min_effective_speed: 0.4,
        }
    }
}
