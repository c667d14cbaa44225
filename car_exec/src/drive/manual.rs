//! Manual driving from an external input

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use crate::{
    hw::ManualInput,
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Applies setpoints from a manual input, such as a joystick, to the vehicle.
pub struct ManualDrive<I> {
    input: I,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I: ManualInput> ManualDrive<I> {
    pub fn new(input: I) -> Self {
        Self { input }
    }
}

impl<I: ManualInput> Module for ManualDrive<I> {
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
        if let Some(setpoint) = self.input.poll()? {
            trace!("Manual setpoint {:?}", setpoint);

            if let Some(s) = setpoint.target_speed {
                state.target_speed = s;
            }
            if let Some(d) = setpoint.direction {
                state.direction = d;
            }
        }

        Ok(())
    }
}
