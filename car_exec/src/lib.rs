//! # Car library.
//!
//! This library allows other crates in the workspace to access items defined inside the car
//! crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Drive modules and the direction change strategies they use
pub mod drive;

/// Hardware interfaces - traits for the motors, sensors and actuators of the vehicle
pub mod hw;

/// Module interface - anything the vehicle updates once per cycle
pub mod module;

/// Parameters of the car executable
pub mod params;

/// Sensor modules - obstacle, line and direction servo
pub mod sensors;

/// Simulated hardware, for running without the real vehicle
pub mod sim;

/// Sound module - plays sound files on remote request
pub mod sound;

/// Vehicle - owns the state, modules and motors and runs the control loop
pub mod vehicle;
