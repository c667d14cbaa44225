//! Status payloads returned by the vehicle

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Number of sensors in the line sensor array.
pub const NUM_LINE_SENSORS: usize = 5;

/// Line detected under each line sensor, left to right, 1 = line.
pub type LinePattern = [u8; NUM_LINE_SENSORS];

/// Active flag of each module, by module name.
pub type SensorStatus = BTreeMap<String, bool>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Control variables and motor speeds of the vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatus {
    /// Desired speed, -1 (full backwards) to +1 (full forwards)
    pub target_speed: f64,

    /// Steering bias, -1 (full left) to +1 (full right)
    pub direction: f64,

    /// Slow down caused by obstacles, positive values resist forward travel and negative values
    /// resist backward travel
    pub obstacle_pushback: f64,

    /// Last line pattern seen by the line sensor
    pub line_pattern: LinePattern,

    /// Resulting speed of the whole vehicle
    pub speed_total: f64,

    /// Resulting speed of the left motor
    pub speed_left: f64,

    /// Resulting speed of the right motor
    pub speed_right: f64,
}

/// Sound files known to the vehicle's sound player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundStatus {
    /// All playable sound files
    pub soundfiles: Vec<String>,

    /// Sound files currently playing
    pub playing: Vec<String>,
}
