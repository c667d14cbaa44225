//! Driving back and forth without steering

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::{DirectionChange, DirectionChangeParams};
use crate::{
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackAndForthParams {
    /// Slowest speed picked on a change
    pub min_speed: f64,

    /// Fastest speed picked on a change
    pub max_speed: f64,

    pub direction_change: DirectionChangeParams,
}

/// Reverses the direction of travel whenever the direction change strategy triggers, with a new
/// random speed and the steering centred.
pub struct BackAndForthDrive<C, R = StdRng> {
    change: C,
    rng: R,
    min_speed: f64,
    max_speed: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for BackAndForthParams {
    fn default() -> Self {
        Self {
            min_speed: 0.4,
            max_speed: 1.0,
            direction_change: DirectionChangeParams {
                obstacle_threshold: 0.9,
                ..Default::default()
            },
        }
    }
}

impl<C: DirectionChange> BackAndForthDrive<C> {
    pub fn new(change: C, params: &BackAndForthParams) -> Result<Self, ModuleError> {
        Self::with_rng(change, params, StdRng::from_entropy())
    }
}

impl<C: DirectionChange, R: Rng> BackAndForthDrive<C, R> {
    pub fn with_rng(change: C, params: &BackAndForthParams, rng: R) -> Result<Self, ModuleError> {
        let valid = |s: f64| (0.0..=1.0).contains(&s);

        if !valid(params.min_speed) || !valid(params.max_speed) || params.min_speed > params.max_speed {
            return Err(ModuleError::InvalidParams(format!(
                "back and forth speed range {} to {} is not within 0 to 1",
                params.min_speed, params.max_speed
            )))
        }

        Ok(Self {
            change,
            rng,
            min_speed: params.min_speed,
            max_speed: params.max_speed,
        })
    }

    /// Reverse if the strategy says so.
    pub fn step(&mut self, now: Instant, state: &mut VehicleState) {
        if !self.change.next(now, state) {
            return
        }

        let speed = self.rng.gen_range(self.min_speed..=self.max_speed);

        state.direction = 0.0;
        state.target_speed = match state.target_speed >= 0.0 {
            true => -speed,
            false => speed
        };
    }
}

impl<C: DirectionChange, R: Rng> Module for BackAndForthDrive<C, R> {
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
        self.step(Instant::now(), state);
        Ok(())
    }
}
