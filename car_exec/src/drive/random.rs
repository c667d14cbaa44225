//! Random driving

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;

use super::DirectionChange;
use crate::{
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drives forwards in random curves, picking a new curve whenever the direction change strategy
/// triggers.
pub struct RandomDrive<C, R = StdRng> {
    change: C,
    rng: R,

    /// Direction of the previous curve
    last_turn: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<C: DirectionChange> RandomDrive<C> {
    pub fn new(change: C) -> Self {
        Self::with_rng(change, StdRng::from_entropy())
    }
}

impl<C: DirectionChange, R: Rng> RandomDrive<C, R> {
    pub fn with_rng(change: C, rng: R) -> Self {
        Self {
            change,
            rng,
            last_turn: 0.0,
        }
    }

    /// Pick a new curve if the strategy says so.
    pub fn step(&mut self, now: Instant, state: &mut VehicleState) {
        if !self.change.next(now, state) {
            return
        }

        // Steering in steps of 0.1 between -0.5 and 0.5
        let mut turn = (self.rng.gen_range(0..=10) - 5) as f64 / 10.0;

        // Avoid turning to the same side twice in a row
        if turn * self.last_turn > 0.0 {
            turn = -turn;
        }

        self.last_turn = turn;

        state.direction = turn;
        state.target_speed = self.rng.gen_range(4..=10) as f64 / 10.0;
    }
}

impl<C: DirectionChange, R: Rng> Module for RandomDrive<C, R> {
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
        self.step(Instant::now(), state);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::drive::{direction_change::test::Scripted, fixed_interval};

    #[test]
    fn test_random_curves() {
        let mut drive = RandomDrive::with_rng(fixed_interval(0.0), StdRng::seed_from_u64(7));
        let mut state = VehicleState::default();
        let now = Instant::now();

        let mut prev_turn = 0.0;
        for _ in 0..200 {
            drive.step(now, &mut state);

            assert!(state.direction >= -0.5 && state.direction <= 0.5);
            assert!(state.target_speed >= 0.4 && state.target_speed <= 1.0);

            // Values lie on the 0.1 grid
            assert!(((state.direction * 10.0).round() - state.direction * 10.0).abs() < 1e-9);
            assert!(((state.target_speed * 10.0).round() - state.target_speed * 10.0).abs() < 1e-9);

            assert!(state.direction * prev_turn <= 0.0, "Turned the same way twice");
            prev_turn = state.direction;
        }
    }

    #[test]
    fn test_no_change_keeps_state() {
        let mut drive = RandomDrive::with_rng(Scripted(vec![false]), StdRng::seed_from_u64(7));
        let mut state = VehicleState::default();
        state.target_speed = -0.3;
        state.direction = 0.9;

        drive.update(&mut state).unwrap();
        assert_eq!(state.target_speed, -0.3);
        assert_eq!(state.direction, 0.9);
    }
}
