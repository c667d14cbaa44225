//! # Simulated hardware
//!
//! Stand-ins for the vehicle's devices, used to run the executable on a development machine and in
//! tests. Each device is a cheap handle onto shared state: keep a clone to inspect or change the
//! device while the vehicle owns the other.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::rc::NUM_LINE_SENSORS;
use log::info;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::hw::{DistanceSensor, HwError, LineSensorArray, Motor, Servo, SoundPlayer};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A motor which remembers the last speed it was set to.
#[derive(Debug, Clone, Default)]
pub struct SimMotor {
    inner: Arc<Mutex<SimMotorInner>>,
}

#[derive(Debug, Default)]
struct SimMotorInner {
    value: f64,
    fail: bool,
}

#[derive(Debug, Clone)]
pub struct SimDistanceSensor {
    distance_cm: Arc<Mutex<f64>>,
}

#[derive(Debug, Clone)]
pub struct SimLineSensor {
    reflections: Arc<Mutex<[bool; NUM_LINE_SENSORS]>>,
}

#[derive(Debug, Clone, Default)]
pub struct SimServo {
    angle_deg: Arc<Mutex<f64>>,
}

/// A sound player which only pretends to play. Playbacks last until they are stopped.
#[derive(Debug, Clone, Default)]
pub struct SimSoundPlayer {
    available: Vec<String>,
    playing: Vec<String>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimMotor {
    pub fn value(&self) -> f64 {
        self.inner.lock().value
    }

    /// Make every following `set` fail, or succeed again.
    pub fn fail(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }
}

impl Motor for SimMotor {
    fn set(&mut self, speed: f64) -> Result<(), HwError> {
        let mut inner = self.inner.lock();

        if inner.fail {
            return Err(HwError::Unavailable(String::from("simulated motor failure")))
        }

        inner.value = speed;
        Ok(())
    }
}

impl SimDistanceSensor {
    pub fn new(distance_cm: f64) -> Self {
        Self {
            distance_cm: Arc::new(Mutex::new(distance_cm)),
        }
    }

    pub fn set_distance(&self, distance_cm: f64) {
        *self.distance_cm.lock() = distance_cm;
    }
}

impl DistanceSensor for SimDistanceSensor {
    fn read_cm(&mut self) -> Result<f64, HwError> {
        Ok(*self.distance_cm.lock())
    }
}

impl SimLineSensor {
    pub fn new(reflections: [bool; NUM_LINE_SENSORS]) -> Self {
        Self {
            reflections: Arc::new(Mutex::new(reflections)),
        }
    }

    pub fn set_reflections(&self, reflections: [bool; NUM_LINE_SENSORS]) {
        *self.reflections.lock() = reflections;
    }
}

impl LineSensorArray for SimLineSensor {
    fn read(&mut self) -> Result<[bool; NUM_LINE_SENSORS], HwError> {
        Ok(*self.reflections.lock())
    }
}

impl SimServo {
    pub fn angle_deg(&self) -> f64 {
        *self.angle_deg.lock()
    }
}

impl Servo for SimServo {
    fn set_angle(&mut self, angle_deg: f64) -> Result<(), HwError> {
        *self.angle_deg.lock() = angle_deg;
        Ok(())
    }
}

impl SimSoundPlayer {
    pub fn new(available: &[&str]) -> Self {
        let mut available: Vec<String> = available.iter().map(|s| s.to_string()).collect();
        available.sort();

        Self {
            available,
            playing: Vec::new(),
        }
    }
}

impl SoundPlayer for SimSoundPlayer {
    fn play(&mut self, name: &str) -> Result<(), HwError> {
        if !self.available.iter().any(|n| n == name) {
            return Err(HwError::UnknownSound(name.to_string()))
        }

        info!("Playing {}", name);
        self.playing.push(name.to_string());
        Ok(())
    }

    fn stop(&mut self, name: &str) -> Result<(), HwError> {
        self.playing.retain(|n| n != name);
        Ok(())
    }

    fn list_available(&self) -> Vec<String> {
        self.available.clone()
    }

    fn list_playing(&self) -> Vec<String> {
        self.playing.clone()
    }

    fn poll(&mut self) -> Result<(), HwError> {
        Ok(())
    }
}
