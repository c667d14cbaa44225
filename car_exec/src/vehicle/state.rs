//! Vehicle control variables and derived motor speeds

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::rc::{LinePattern, VehicleStatus};
use util::maths::clamp;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of the vehicle, shared with every module during a cycle.
///
/// The control variables are written by modules and remote commands, the speeds are derived from
/// them by the vehicle at the end of each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VehicleState {
    /// Desired speed, -1 (full backwards) to +1 (full forwards)
    pub target_speed: f64,

    /// Steering bias, -1 (full left) to +1 (full right)
    pub direction: f64,

    /// Slow down caused by obstacles. Positive values resist forward travel, negative values
    /// resist backward travel.
    pub obstacle_pushback: f64,

    /// Line seen under each line sensor, left to right, 1 = line
    pub line_pattern: LinePattern,

    speeds: Speeds,
}

/// Motor speeds derived from the control variables.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Speeds {
    pub total: f64,
    pub left: f64,
    pub right: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehicleState {
    pub fn speed_total(&self) -> f64 {
        self.speeds.total
    }

    pub fn speed_left(&self) -> f64 {
        self.speeds.left
    }

    pub fn speed_right(&self) -> f64 {
        self.speeds.right
    }

    /// Recalculate the motor speeds from the current control variables.
    pub(crate) fn update_speeds(&mut self, min_effective_speed: f64) -> Speeds {
        self.speeds = derive_speeds(
            self.target_speed,
            self.direction,
            self.obstacle_pushback,
            min_effective_speed
        );
        self.speeds
    }

    /// Zero the motor speeds, leaving the control variables untouched.
    pub(crate) fn clear_speeds(&mut self) {
        self.speeds = Speeds::default();
    }

    /// Status report of the state.
    pub fn status(&self) -> VehicleStatus {
        VehicleStatus {
            target_speed: self.target_speed,
            direction: self.direction,
            obstacle_pushback: self.obstacle_pushback,
            line_pattern: self.line_pattern,
            speed_total: self.speeds.total,
            speed_left: self.speeds.left,
            speed_right: self.speeds.right,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Derive the motor speeds from the control variables.
///
/// - The target speed is clamped to [-1, 1].
/// - The obstacle pushback is subtracted only when it opposes the direction of travel, which may
///   reverse the vehicle.
/// - Any nonzero total speed is raised to at least `min_effective_speed` in magnitude, as the
///   motors stall below it.
/// - The motor on the inside of the turn is slowed in proportion to the direction.
pub fn derive_speeds(
    target_speed: f64,
    direction: f64,
    obstacle_pushback: f64,
    min_effective_speed: f64
) -> Speeds {
    let mut total = clamp(target_speed, -1.0, 1.0);

    if total > 0.0 && obstacle_pushback > 0.0 {
        total -= clamp(obstacle_pushback, 0.0, 1.0);
    }
    else if total < 0.0 && obstacle_pushback < 0.0 {
        total -= clamp(obstacle_pushback, -1.0, 0.0);
    }

    if total != 0.0 && total.abs() < min_effective_speed {
        total = min_effective_speed.copysign(total);
    }

    let direction = clamp(direction, -1.0, 1.0);
    let mut left = total;
    let mut right = total;

    if direction > 0.0 {
        right *= 1.0 - direction;
    }
    else if direction < 0.0 {
        left *= 1.0 + direction;
    }

    Speeds { total, left, right }
}

#[cfg(test)]
mod test {
    use super::*;

    const MIN_SPEED: f64 = 0.4;

    /// Values from -1 to 1 in steps of 0.1
    fn grid() -> impl Iterator<Item = f64> + Clone {
        (-10..=10).map(|i| i as f64 / 10.0)
    }

    #[test]
    fn test_speeds_bounded() {
        for target in grid() {
            for direction in grid() {
                let s = derive_speeds(target, direction, 0.0, MIN_SPEED);

                assert!(s.left.abs() <= 1.0 && s.right.abs() <= 1.0, "{} {}", target, direction);

                if target != 0.0 {
                    assert!(s.total.abs() >= MIN_SPEED, "{} {}", target, direction);
                }
                else {
                    assert_eq!(s.total, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_straight() {
        for target in grid() {
            let s = derive_speeds(target, 0.0, 0.0, MIN_SPEED);
            assert_eq!(s.left, s.total);
            assert_eq!(s.right, s.total);
        }
    }

    #[test]
    fn test_turning_right_slows_right_motor() {
        for target in grid().filter(|t| *t > 0.0) {
            for direction in grid().filter(|d| *d > 0.0) {
                let s = derive_speeds(target, direction, 0.0, MIN_SPEED);
                assert!(s.right < s.left, "{} {}", target, direction);
                assert_eq!(s.left, s.total);
            }
        }

        let s = derive_speeds(1.0, 0.3, 0.0, MIN_SPEED);
        assert!((s.right - 0.7).abs() < 1e-9);

        let s = derive_speeds(1.0, -0.3, 0.0, MIN_SPEED);
        assert!((s.left - 0.7).abs() < 1e-9);
        assert_eq!(s.right, 1.0);
    }

    #[test]
    fn test_clamped_and_floored() {
        assert_eq!(derive_speeds(3.0, 0.0, 0.0, MIN_SPEED).total, 1.0);
        assert_eq!(derive_speeds(-3.0, 0.0, 0.0, MIN_SPEED).total, -1.0);
        assert_eq!(derive_speeds(0.1, 0.0, 0.0, MIN_SPEED).total, 0.4);
        assert_eq!(derive_speeds(-0.1, 0.0, 0.0, MIN_SPEED).total, -0.4);

        // Direction out of range is clamped too
        let s = derive_speeds(1.0, 2.0, 0.0, MIN_SPEED);
        assert_eq!(s.right, 0.0);
    }

    #[test]
    fn test_pushback_opposes_travel_only() {
        // Forwards towards an obstacle
        let s = derive_speeds(1.0, 0.0, 0.5, MIN_SPEED);
        assert!((s.total - 0.5).abs() < 1e-9);

        // Full pushback with a slow target reverses the vehicle
        let s = derive_speeds(0.5, 0.0, 1.0, MIN_SPEED);
        assert!((s.total - -0.5).abs() < 1e-9);

        // Backwards, away from an obstacle in front
        let s = derive_speeds(-0.8, 0.0, 0.5, MIN_SPEED);
        assert!((s.total - -0.8).abs() < 1e-9);

        // Backwards towards an obstacle behind
        let s = derive_speeds(-0.8, 0.0, -0.3, MIN_SPEED);
        assert!((s.total - -0.5).abs() < 1e-9);

        // Equal pushback stops the vehicle
        assert_eq!(derive_speeds(0.6, 0.0, 0.6, MIN_SPEED).total, 0.0);
    }

    #[test]
    fn test_state_getters() {
        let mut state = VehicleState {
            target_speed: 0.5,
            direction: 0.5,
            ..Default::default()
        };
        assert_eq!(state.speed_total(), 0.0);

        state.update_speeds(MIN_SPEED);
        assert_eq!(state.speed_total(), 0.5);
        assert_eq!(state.speed_left(), 0.5);
        assert_eq!(state.speed_right(), 0.25);
        assert_eq!(state.status().speed_right, 0.25);

        state.clear_speeds();
        assert_eq!(state.speed_left(), 0.0);
        assert_eq!(state.target_speed, 0.5);
    }
}
