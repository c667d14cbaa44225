//! Obstacle detection with a forward facing distance sensor

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use util::maths::{clamp, lin_map};

use crate::{
    hw::{DistanceSensor, HwError},
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleParams {
    /// Distance at or below which the pushback is 1, stopping forward travel.
    ///
    /// Units: centimeters
    pub min_cm: f64,

    /// Distance at or above which obstacles are ignored.
    ///
    /// Units: centimeters
    pub max_cm: f64,
}

/// Converts the distance to the nearest obstacle into an obstacle pushback, falling linearly from
/// 1 at `min_cm` to 0 at `max_cm`.
pub struct ObstacleDetector<D> {
    sensor: D,
    params: ObstacleParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            min_cm: 10.0,
            max_cm: 100.0,
        }
    }
}

impl<D: DistanceSensor> ObstacleDetector<D> {
    pub fn new(sensor: D, params: ObstacleParams) -> Result<Self, ModuleError> {
        if !(params.min_cm < params.max_cm) {
            return Err(ModuleError::InvalidParams(format!(
                "obstacle range {} cm to {} cm is empty",
                params.min_cm, params.max_cm
            )))
        }

        Ok(Self { sensor, params })
    }

    /// Pushback caused by an obstacle at the given distance.
    pub fn pushback(&self, distance_cm: f64) -> f64 {
        clamp(
            lin_map((self.params.min_cm, self.params.max_cm), (1.0, 0.0), distance_cm),
            0.0,
            1.0
        )
    }
}

impl<D: DistanceSensor> Module for ObstacleDetector<D> {
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
        let distance_cm = self.sensor.read_cm()?;

        if distance_cm.is_nan() {
            return Err(HwError::InvalidReading(String::from("distance is NaN")).into())
        }

        state.obstacle_pushback = self.pushback(distance_cm);
        trace!("Obstacle at {:.1} cm, pushback {:.2}", distance_cm, state.obstacle_pushback);

        Ok(())
    }
}
