//! # Sound module
//!
//! Makes a sound player available to remote `play_sound` and `stop_sound` commands, and forgets
//! about playbacks once they have finished.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod player;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{
    hw::SoundPlayer,
    module::{Module, ModuleError},
    vehicle::VehicleState,
};

pub use player::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct SoundModule<P> {
    player: P,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P: SoundPlayer> SoundModule<P> {
    pub fn new(player: P) -> Self {
        Self { player }
    }
}

impl<P: SoundPlayer> Module for SoundModule<P> {
    fn update(&mut self, _: &mut VehicleState) -> Result<(), ModuleError> {
        self.player.poll()?;
        Ok(())
    }

    fn sound_player(&mut self) -> Option<&mut dyn SoundPlayer> {
        Some(&mut self.player)
    }
}
