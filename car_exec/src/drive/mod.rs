//! # Drive modules
//!
//! Modules which decide the target speed and direction of the vehicle. Only one drive module
//! should be active at a time, the others are disabled.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod back_forth;
pub mod direction_change;
mod follow_line;
mod manual;
mod random;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use back_forth::*;
pub use direction_change::{
    any, fixed_interval, limit, log_changes, on_obstacle, random_interval, DirectionChange,
    DirectionChangeParams,
};
pub use follow_line::*;
pub use manual::*;
pub use random::*;
