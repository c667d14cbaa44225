//! Servo turning the sensor head into the direction of travel

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use util::maths::{clamp, lin_map};

use crate::{
    hw::Servo,
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionServoParams {
    /// Servo angle when steering fully right.
    ///
    /// Units: degrees
    pub min_angle_deg: f64,

    /// Servo angle when steering fully left.
    ///
    /// Units: degrees
    pub max_angle_deg: f64,
}

pub struct DirectionServo<S> {
    servo: S,
    params: DirectionServoParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for DirectionServoParams {
    fn default() -> Self {
        Self {
            min_angle_deg: 10.0,
            max_angle_deg: 170.0,
        }
    }
}

impl<S: Servo> DirectionServo<S> {
    pub fn new(servo: S, params: DirectionServoParams) -> Self {
        Self { servo, params }
    }

    /// Servo angle for the given direction, the servo turns the opposite way to the direction.
    pub fn angle_deg(&self, direction: f64) -> f64 {
        lin_map(
            (-1.0, 1.0),
            (self.params.max_angle_deg, self.params.min_angle_deg),
            clamp(direction, -1.0, 1.0)
        )
    }
}

impl<S: Servo> Module for DirectionServo<S> {
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
        let angle = self.angle_deg(state.direction);
        self.servo.set_angle(angle)?;
        Ok(())
    }
}
