//! # Vehicle modules
//!
//! A module is anything the vehicle calls once per cycle to read or adjust its state. Sensors
//! write measurements into the state, drive strategies write the target speed and direction,
//! actuators such as the direction servo only read it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{
    hw::{HwError, SoundPlayer},
    vehicle::VehicleState,
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait Module {
    /// Process one cycle, reading and adjusting the vehicle's state.
    fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError>;

    /// Access the sound player of this module, if it has one.
    fn sound_player(&mut self) -> Option<&mut dyn SoundPlayer> {
        None
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A module registered with the vehicle, under a unique name.
pub struct ModuleSlot {
    name: String,

    active: bool,

    module: Box<dyn Module>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Hardware error: {0}")]
    Hardware(#[from] HwError),

    #[error("Invalid module parameters: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    Failed(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModuleSlot {
    /// Create a new, active slot.
    pub fn new(name: &str, module: Box<dyn Module>) -> Self {
        Self {
            name: name.to_string(),
            active: true,
            module,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enable(&mut self) {
        self.active = true;
    }

    pub fn disable(&mut self) {
        self.active = false;
    }

    pub fn module_mut(&mut self) -> &mut dyn Module {
        self.module.as_mut()
    }
}

impl std::fmt::Debug for ModuleSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleSlot")
            .field("name", &self.name)
            .field("active", &self.active)
            .finish()
    }
}
