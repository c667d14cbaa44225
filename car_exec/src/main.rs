//! Main car-side executable entry point.
//!
//! # Architecture
//!
//! The executable runs two threads:
//!
//!     - The control thread owns the vehicle and runs its main loop. Each cycle:
//!         - Remote commands received since the last cycle are applied
//!         - Active modules are updated (sensors, drive strategy, sound)
//!         - Motor speeds are derived and sent to the motors
//!         - A status snapshot is published for the remote control server
//!     - The remote control server thread receives commands over UDP, answers status queries
//!       from the latest snapshot and queues all other commands for the control thread.
//!
//! On Ctrl-C both loops are stopped and the motors are zeroed before exiting.
//!
//! # Usage
//!
//!     car_exec [params_file]
//!
//! `params_file` is relative to the `params` directory of the software root and defaults to
//! `car_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, error, info, warn};
use std::{
    env,
    sync::{atomic::{AtomicBool, Ordering}, Arc},
};

// Internal
use car_lib::{
    drive::{BackAndForthDrive, FollowLineDrive, RandomDrive},
    params::CarExecParams,
    sensors::{DirectionServo, LineDetector, ObstacleDetector},
    sim::{SimDistanceSensor, SimLineSensor, SimMotor, SimServo},
    sound::{CmdSoundPlayer, SoundModule},
    vehicle::Vehicle,
};
use comms_if::net::{crossbeam_channel, RcServer, StatusCache};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Parameter file used when none is given on the command line.
const DEFAULT_PARAMS_FILE: &str = "car_exec.toml";

/// Drive modules which are registered disabled, leaving the vehicle under remote control.
const INITIALLY_DISABLED: [&str; 3] = ["drive:random", "drive:backforth", "drive:line"];

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "car_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Carbot Car Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let params_file = match args.len() {
        1 => DEFAULT_PARAMS_FILE,
        2 => args[1].as_str(),
        n => return Err(eyre!("Expected either zero or one argument, found {}", n - 1))
    };

    let params: CarExecParams = util::params::load(params_file)
        .wrap_err("Could not load the car exec params")?;

    info!("Exec parameters loaded from {}", params_file);

    // ---- INITIALISE VEHICLE ----

    info!("Initialising modules...");

    let mut vehicle = Vehicle::new(
        params.vehicle.clone(),
        Box::new(SimMotor::default()),
        Box::new(SimMotor::default())
    );

    vehicle.register(
        "sensor:line",
        LineDetector::new(SimLineSensor::new([true; 5]), &params.line)
    )?;
    vehicle.register(
        "sensor:obstacle",
        ObstacleDetector::new(
            SimDistanceSensor::new(params.sim_obstacle_distance_cm),
            params.obstacle.clone()
        ).wrap_err("Failed to initialise the obstacle detector")?
    )?;
    vehicle.register(
        "sensor:direction",
        DirectionServo::new(SimServo::default(), params.direction_servo.clone())
    )?;
    vehicle.register(
        "drive:random",
        RandomDrive::new(params.random_drive.build("drive:random"))
    )?;
    vehicle.register(
        "drive:backforth",
        BackAndForthDrive::new(
            params.back_forth_drive.direction_change.build("drive:backforth"),
            &params.back_forth_drive
        ).wrap_err("Failed to initialise the back and forth drive")?
    )?;
    vehicle.register(
        "drive:line",
        FollowLineDrive::new(params.follow_line_drive.clone())
            .wrap_err("Failed to initialise the line following drive")?
    )?;

    let media_dir = host::get_sw_root()
        .wrap_err("Failed to get the software root")?
        .join(&params.sound.media_dir);
    if !media_dir.is_dir() {
        warn!("Sound media directory {:?} does not exist, no sounds can be played", media_dir);
    }
    vehicle.register(
        "sound:player",
        SoundModule::new(CmdSoundPlayer::new(&params.sound.player_cmd, media_dir))
    )?;

    for name in INITIALLY_DISABLED.iter() {
        vehicle.get_mut(name)?.disable();
    }

    info!("Module initialisation complete\n");

    // ---- INITIALISE NETWORK ----

    info!("Initialising network");

    let (cmd_sender, cmd_receiver) = crossbeam_channel::unbounded();
    let status_cache = Arc::new(StatusCache::default());

    let rc_server = RcServer::new(&params.rc_server, cmd_sender, status_cache.clone())
        .wrap_err("Failed to initialise the RcServer")?;
    info!("RcServer listening on {}", rc_server.local_addr()?);

    vehicle.connect_remote(cmd_receiver, status_cache);

    let running = Arc::new(AtomicBool::new(true));

    let rc_server_handle = rc_server.spawn(running.clone())
        .wrap_err("Failed to start the RcServer thread")?;

    {
        let running = running.clone();
        ctrlc::set_handler(move || {
            info!("Interrupt received, stopping");
            running.store(false, Ordering::Relaxed);
        }).wrap_err("Failed to set the interrupt handler")?;
    }

    info!("Network initialisation complete");

    // ---- MAIN LOOP ----

    let loop_result = vehicle.loop_forever(params.loop_frequency_hz, &running);

    // ---- SHUTDOWN ----

    running.store(false, Ordering::Relaxed);

    if let Err(e) = vehicle.stop() {
        error!("Could not stop the motors: {}", e);
    }

    if rc_server_handle.join().is_err() {
        warn!("RcServer thread panicked");
    }

    info!("End of execution");

    loop_result.wrap_err("Error in the main loop")
}
