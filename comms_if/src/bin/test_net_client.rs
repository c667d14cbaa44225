//! Simple network client test
//!
//! Polls the vehicle for status once a second and prints the responses.

use comms_if::{
    net::{RcClient, RcClientParams, TelemetryHandler},
    rc::{SensorStatus, SoundStatus, VehicleStatus},
};

struct Printer;

impl TelemetryHandler for Printer {
    fn on_connection_change(&mut self, connected: bool) {
        println!("Connected: {}", connected);
    }

    fn on_vehicle_status(&mut self, status: &VehicleStatus) {
        println!("Vehicle: {:?}", status);
    }

    fn on_sensor_status(&mut self, status: &SensorStatus) {
        println!("Sensors: {:?}", status);
    }

    fn on_sound_status(&mut self, status: &SoundStatus) {
        println!("Sound: {:?}", status);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let params = RcClientParams::default();
    let mut client = match RcClient::new(&params) {
        Ok(c) => c,
        Err(e) => {
            println!("Could not create the client");
            return Err(e.into())
        }
    };

    println!("Polling vehicle at {}", params.vehicle_addr);

    // Loop over polling the vehicle
    loop {
        match client.cycle(&mut Printer) {
            Ok(0) => println!("no response"),
            Ok(_) => (),
            Err(e) => println!("could not poll the vehicle: {}", e),
        }

        std::thread::sleep(std::time::Duration::from_millis(1000));
    }
}
