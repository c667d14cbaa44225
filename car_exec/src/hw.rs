//! # Hardware interfaces
//!
//! The vehicle and its modules never talk to devices directly. Instead each device is described by
//! one of the traits below, allowing the real drivers to be swapped for the simulated ones in
//! [`crate::sim`] or for test doubles.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::rc::NUM_LINE_SENSORS;
use crossbeam_channel::{Receiver, TryRecvError};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A drive motor.
pub trait Motor {
    /// Set the signed speed of the motor, -1 (full backwards) to +1 (full forwards).
    fn set(&mut self, speed: f64) -> Result<(), HwError>;
}

/// A distance sensor pointing in the direction of travel.
pub trait DistanceSensor {
    /// Measure the distance to the nearest obstacle.
    ///
    /// Units: centimeters
    fn read_cm(&mut self) -> Result<f64, HwError>;
}

/// An array of infrared reflection sensors mounted under the vehicle, left to right.
pub trait LineSensorArray {
    /// Read the sensors, `true` means the infrared light was reflected.
    fn read(&mut self) -> Result<[bool; NUM_LINE_SENSORS], HwError>;
}

/// A positional servo.
pub trait Servo {
    /// Set the angle of the servo.
    ///
    /// Units: degrees
    fn set_angle(&mut self, angle_deg: f64) -> Result<(), HwError>;
}

/// Something which can play named sound files.
pub trait SoundPlayer {
    /// Start playing the given sound file.
    fn play(&mut self, name: &str) -> Result<(), HwError>;

    /// Stop all playbacks of the given sound file.
    fn stop(&mut self, name: &str) -> Result<(), HwError>;

    /// Names of all sound files which can be played, sorted.
    ///
    /// Called every cycle, so must not block. Players with a slow source keep a cached list and
    /// update it in `refresh`.
    fn list_available(&self) -> Vec<String>;

    /// Re-read the list of available sound files.
    fn refresh(&mut self) -> Result<(), HwError> {
        Ok(())
    }

    /// Names of the sound files currently playing.
    fn list_playing(&self) -> Vec<String>;

    /// Forget about playbacks which have finished.
    fn poll(&mut self) -> Result<(), HwError>;
}

/// Source of manual driving setpoints, e.g. a joystick.
pub trait ManualInput {
    /// Get the latest setpoint, if a new one is available.
    fn poll(&mut self) -> Result<Option<Setpoint>, HwError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Manual driving demand. Fields left as `None` keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Setpoint {
    pub target_speed: Option<f64>,
    pub direction: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by hardware drivers.
#[derive(Debug, thiserror::Error)]
pub enum HwError {
    #[error("Device is not available: {0}")]
    Unavailable(String),

    #[error("Invalid reading from the device: {0}")]
    InvalidReading(String),

    #[error("Unknown sound file \"{0}\"")]
    UnknownSound(String),

    #[error("Device IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

/// Setpoints can be fed in from another thread through a channel. Only the most recent pending
/// setpoint is returned.
impl ManualInput for Receiver<Setpoint> {
    fn poll(&mut self) -> Result<Option<Setpoint>, HwError> {
        let mut latest = None;

        loop {
            match self.try_recv() {
                Ok(s) => latest = Some(s),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_none() {
                        return Err(HwError::Unavailable(String::from("manual input disconnected")))
                    }
                    break
                }
            }
        }

        Ok(latest)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_channel_manual_input() {
        let (tx, mut rx) = unbounded();

        assert_eq!(rx.poll().unwrap(), None);

        tx.send(Setpoint { target_speed: Some(0.2), direction: None }).unwrap();
        tx.send(Setpoint { target_speed: Some(0.7), direction: Some(0.1) }).unwrap();
        assert_eq!(
            rx.poll().unwrap(),
            Some(Setpoint { target_speed: Some(0.7), direction: Some(0.1) })
        );
        assert_eq!(rx.poll().unwrap(), None);

        drop(tx);
        assert!(rx.poll().is_err());
    }
}
