//! Simple network server test
//!
//! Stands in for the vehicle: answers status queries with a fixed snapshot and prints every other
//! command it receives.

use comms_if::net::{crossbeam_channel, RcServer, RcServerParams, StatusCache, StatusSnapshot};
use std::sync::{atomic::AtomicBool, Arc};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fill the cache with something recognisable
    let cache = Arc::new(StatusCache::default());
    let mut snapshot = StatusSnapshot::default();
    snapshot.vehicle.target_speed = 0.5;
    snapshot.vehicle.direction = -0.2;
    snapshot.sensors.insert(String::from("drive:random"), true);
    snapshot.sound.soundfiles.push(String::from("horn.wav"));
    cache.try_publish(snapshot);

    let (cmd_sender, cmd_receiver) = crossbeam_channel::unbounded();

    let params = RcServerParams::default();
    let server = RcServer::new(&params, cmd_sender, cache)?;

    println!("Server running on {}", server.local_addr()?);

    let running = Arc::new(AtomicBool::new(true));
    let _handle = server.spawn(running)?;

    // Print commands as they arrive
    for cmd in cmd_receiver.iter() {
        println!("Received {:?}", cmd);
    }

    Ok(())
}
