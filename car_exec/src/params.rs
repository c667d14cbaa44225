//! # Car Executable Parameters
//!
//! This module provides parameters for the car executable. Every section and every key may be
//! left out of the parameter file, in which case its default value is used.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::RcServerParams;
use serde::{Deserialize, Serialize};

use crate::{
    drive::{BackAndForthParams, DirectionChangeParams, FollowLineParams},
    sensors::{DirectionServoParams, LineParams, ObstacleParams},
    sound::SoundParams,
    vehicle::VehicleParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CarExecParams {
    /// Number of control cycles per second.
    ///
    /// Units: Hz
    pub loop_frequency_hz: f64,

    /// Distance the simulated obstacle sensor reports at startup.
    ///
    /// Units: centimeters
    pub sim_obstacle_distance_cm: f64,

    pub vehicle: VehicleParams,

    pub obstacle: ObstacleParams,

    pub line: LineParams,

    pub direction_servo: DirectionServoParams,

    pub random_drive: DirectionChangeParams,

    pub back_forth_drive: BackAndForthParams,

    pub follow_line_drive: FollowLineParams,

    pub sound: SoundParams,

    pub rc_server: RcServerParams,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CarExecParams {
    fn default() -> Self {
        Self {
            loop_frequency_hz: 10.0,
            sim_obstacle_distance_cm: 200.0,
            vehicle: VehicleParams::default(),
            obstacle: ObstacleParams::default(),
            line: LineParams::default(),
            direction_servo: DirectionServoParams::default(),
            random_drive: DirectionChangeParams::default(),
            back_forth_drive: BackAndForthParams::default(),
            follow_line_drive: FollowLineParams::default(),
            sound: SoundParams::default(),
            rc_server: RcServerParams::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sensors::LineColor;

    #[test]
    fn test_partial_params() {
        let params: CarExecParams = util::params::from_str(r#"
            loop_frequency_hz = 20.0

            [line]
            line_color = "light"

            [back_forth_drive]
            max_speed = 0.8

            [back_forth_drive.direction_change]
            cooldown_s = 2.0

            [rc_server]
            bind_addr = "127.0.0.1:9000"
        "#).unwrap();

        assert_eq!(params.loop_frequency_hz, 20.0);
        assert_eq!(params.line.line_color, LineColor::Light);
        assert_eq!(params.back_forth_drive.max_speed, 0.8);
        assert_eq!(params.back_forth_drive.min_speed, 0.4);
        assert_eq!(params.back_forth_drive.direction_change.cooldown_s, 2.0);
        assert_eq!(params.back_forth_drive.direction_change.min_interval_s, 10.0);
        assert_eq!(params.rc_server.bind_addr, "127.0.0.1:9000");
        assert_eq!(params.rc_server.idle_sleep_ms, 50);

        // Untouched sections
        assert_eq!(params.obstacle.min_cm, 10.0);
        assert_eq!(params.random_drive.obstacle_threshold, 0.75);
        assert_eq!(params.vehicle.min_effective_speed, 0.4);
        assert_eq!(params.sound.player_cmd, "aplay");
    }
}
