//! Latest status received from the vehicle

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::TelemetryHandler,
    rc::{SensorStatus, SoundStatus, VehicleStatus},
};
use parking_lot::Mutex;
use std::{fmt::Write, sync::Arc};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Telemetry {
    pub connected: bool,
    pub vehicle: Option<VehicleStatus>,
    pub sensors: Option<SensorStatus>,
    pub sound: Option<SoundStatus>,
}

/// Telemetry written by the client thread and read by the prompt.
#[derive(Debug, Clone, Default)]
pub struct SharedTelemetry(Arc<Mutex<Telemetry>>);

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SharedTelemetry {
    /// Human readable report of the latest telemetry.
    pub fn report(&self) -> String {
        self.0.lock().report()
    }
}

impl TelemetryHandler for SharedTelemetry {
    fn on_connection_change(&mut self, connected: bool) {
        self.0.lock().connected = connected;
    }

    fn on_vehicle_status(&mut self, status: &VehicleStatus) {
        self.0.lock().vehicle = Some(*status);
    }

    fn on_sensor_status(&mut self, status: &SensorStatus) {
        self.0.lock().sensors = Some(status.clone());
    }

    fn on_sound_status(&mut self, status: &SoundStatus) {
        self.0.lock().sound = Some(status.clone());
    }
}

impl Telemetry {
    pub fn report(&self) -> String {
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = self.write_report(&mut out);

        out
    }

    fn write_report(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Connected: {}", if self.connected { "yes" } else { "no" })?;

        match self.vehicle {
            Some(ref v) => {
                writeln!(out, "Vehicle:")?;
                writeln!(out, "    target_speed      {:+.2}", v.target_speed)?;
                writeln!(out, "    direction         {:+.2}", v.direction)?;
                writeln!(out, "    obstacle_pushback {:+.2}", v.obstacle_pushback)?;
                writeln!(
                    out,
                    "    line_pattern      {}",
                    v.line_pattern.iter().map(|p| p.to_string()).collect::<String>()
                )?;
                writeln!(
                    out,
                    "    speed             {:+.2} (left {:+.2}, right {:+.2})",
                    v.speed_total, v.speed_left, v.speed_right
                )?;
            },
            None => writeln!(out, "Vehicle: no status received")?
        }

        match self.sensors {
            Some(ref s) => {
                writeln!(out, "Modules:")?;
                for (name, active) in s.iter() {
                    writeln!(out, "    {:<20} {}", name, if *active { "on" } else { "off" })?;
                }
            },
            None => writeln!(out, "Modules: no status received")?
        }

        match self.sound {
            Some(ref s) => {
                writeln!(out, "Sounds: {}", s.soundfiles.join(", "))?;
                writeln!(out, "Playing: {}", s.playing.join(", "))?;
            },
            None => writeln!(out, "Sounds: no status received")?
        }

        Ok(())
    }
}
