//! # Sensor modules
//!
//! Modules which read a sensor into the vehicle state, or drive an actuator from it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod direction;
mod line;
mod obstacle;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use direction::*;
pub use line::*;
pub use obstacle::*;
