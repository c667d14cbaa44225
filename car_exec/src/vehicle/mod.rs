//! # Vehicle
//!
//! Owner of the vehicle's state, its modules and its drive motors. Each cycle the vehicle:
//!
//! 1. Applies the remote commands received since the last cycle
//! 2. Updates every active module in registration order
//! 3. Derives the left and right motor speeds from the control variables
//! 4. Drives the motors
//! 5. Publishes a status snapshot for remote status queries

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
mod state;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{StatusCache, StatusSnapshot},
    rc::{RcCmd, SensorStatus, SetAttr, SoundStatus},
};
use crossbeam_channel::Receiver;
use log::{debug, error, info, warn};
use std::{
    sync::{atomic::{AtomicBool, Ordering}, Arc},
    thread,
    time::{Duration, Instant},
};

use crate::{
    hw::{HwError, Motor, SoundPlayer},
    module::{Module, ModuleSlot},
};

pub use params::*;
pub use state::*;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct Vehicle {
    params: VehicleParams,

    state: VehicleState,

    motor_left: Box<dyn Motor>,

    motor_right: Box<dyn Motor>,

    modules: Vec<ModuleSlot>,

    cmd_receiver: Option<Receiver<RcCmd>>,

    status_cache: Option<Arc<StatusCache>>,

    /// Number of cycles executed by `loop_forever`
    pub num_cycles: u64,

    /// Number of cycles in a row which took longer than the cycle period
    pub num_consec_cycle_overruns: u64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum VehicleError {
    #[error("No module named \"{0}\" is registered")]
    ModuleNotFound(String),

    #[error("A module named \"{0}\" is already registered")]
    DuplicateModule(String),

    #[error("Invalid module name \"{0}\", names must be non-empty and contain no whitespace")]
    InvalidModuleName(String),

    #[error("Could not drive the motors: {0}")]
    Motor(HwError),

    #[error("Invalid loop frequency {0} Hz")]
    InvalidFrequency(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Vehicle {
    pub fn new(
        params: VehicleParams,
        motor_left: Box<dyn Motor>,
        motor_right: Box<dyn Motor>
    ) -> Self {
        Self {
            params,
            state: VehicleState::default(),
            motor_left,
            motor_right,
            modules: Vec::new(),
            cmd_receiver: None,
            status_cache: None,
            num_cycles: 0,
            num_consec_cycle_overruns: 0,
        }
    }

    /// Attach the remote control channels.
    ///
    /// Commands received on `cmd_receiver` are applied at the start of each cycle, and a status
    /// snapshot is published into `status_cache` at the end of each cycle.
    pub fn connect_remote(&mut self, cmd_receiver: Receiver<RcCmd>, status_cache: Arc<StatusCache>) {
        self.cmd_receiver = Some(cmd_receiver);
        self.status_cache = Some(status_cache);
    }

    /// Register a new module. Modules are updated in the order they were registered, and start
    /// out active.
    pub fn register<M>(&mut self, name: &str, module: M) -> Result<(), VehicleError>
    where
        M: Module + 'static
    {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(VehicleError::InvalidModuleName(name.to_string()))
        }

        if self.modules.iter().any(|s| s.name() == name) {
            return Err(VehicleError::DuplicateModule(name.to_string()))
        }

        debug!("Registering module {}", name);
        self.modules.push(ModuleSlot::new(name, Box::new(module)));

        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ModuleSlot, VehicleError> {
        self.modules
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| VehicleError::ModuleNotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut ModuleSlot, VehicleError> {
        self.modules
            .iter_mut()
            .find(|s| s.name() == name)
            .ok_or_else(|| VehicleError::ModuleNotFound(name.to_string()))
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut VehicleState {
        &mut self.state
    }

    /// Active flag of every module, by name.
    pub fn sensor_status(&self) -> SensorStatus {
        self.modules
            .iter()
            .map(|s| (s.name().to_string(), s.is_active()))
            .collect()
    }

    /// Execute one cycle.
    ///
    /// Module errors are logged and do not stop the cycle, failing to drive the motors does.
    pub fn tick(&mut self) -> Result<(), VehicleError> {
        self.process_remote_cmds();

        for slot in self.modules.iter_mut().filter(|s| s.is_active()) {
            if let Err(e) = slot.module_mut().update(&mut self.state) {
                warn!("Error updating module {}: {}", slot.name(), e);
            }
        }

        let speeds = self.state.update_speeds(self.params.min_effective_speed);

        self.motor_left.set(speeds.left).map_err(VehicleError::Motor)?;
        self.motor_right.set(speeds.right).map_err(VehicleError::Motor)?;

        self.publish_status();

        Ok(())
    }

    /// Run cycles at the given frequency until `running` is cleared or a cycle fails.
    ///
    /// A cycle which overruns the period is followed immediately by the next one, missed cycles
    /// are not caught up.
    pub fn loop_forever(&mut self, frequency_hz: f64, running: &AtomicBool) -> Result<(), VehicleError> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(VehicleError::InvalidFrequency(frequency_hz))
        }

        let cycle_period = Duration::from_secs_f64(1.0 / frequency_hz);

        info!("Beginning main loop at {} Hz", frequency_hz);

        while running.load(Ordering::Relaxed) {

            // Get cycle start time
            let cycle_start_instant = Instant::now();

            self.tick()?;

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start_instant;

            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => {
                    self.num_consec_cycle_overruns = 0;
                    thread::sleep(d);
                },
                None => {
                    warn!(
                        "Cycle overran by {:.06} s",
                        cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                    );
                    self.num_consec_cycle_overruns += 1;
                }
            }

            self.num_cycles += 1;
        }

        info!("Main loop stopped after {} cycles", self.num_cycles);

        Ok(())
    }

    /// Stop both motors.
    ///
    /// Both motors are stopped even if the first one fails, the first error is returned.
    pub fn stop(&mut self) -> Result<(), VehicleError> {
        self.state.clear_speeds();

        let left = self.motor_left.set(0.0);
        let right = self.motor_right.set(0.0);

        left.and(right).map_err(VehicleError::Motor)
    }

    /// The sound player of the first active module providing one.
    fn sound_player(&mut self) -> Option<&mut dyn SoundPlayer> {
        self.modules
            .iter_mut()
            .filter(|s| s.is_active())
            .find_map(|s| s.module_mut().sound_player())
    }

    fn process_remote_cmds(&mut self) {
        let cmds: Vec<RcCmd> = match self.cmd_receiver {
            Some(ref r) => r.try_iter().collect(),
            None => return
        };

        for cmd in cmds {
            self.apply_cmd(cmd);
        }
    }

    fn apply_cmd(&mut self, cmd: RcCmd) {
        debug!("Applying remote command {:?}", cmd);

        match cmd {
            RcCmd::Set { attr: SetAttr::TargetSpeed, value } => self.state.target_speed = value,
            RcCmd::Set { attr: SetAttr::Direction, value } => self.state.direction = value,
            RcCmd::EnableSensor { name } => match self.get_mut(&name) {
                Ok(s) => s.enable(),
                Err(e) => debug!("Cannot enable module: {}", e)
            },
            RcCmd::DisableSensor { name } => match self.get_mut(&name) {
                Ok(s) => s.disable(),
                Err(e) => debug!("Cannot disable module: {}", e)
            },
            RcCmd::PlaySound { name } => match self.sound_player() {
                Some(p) => if let Err(e) = p.play(&name) {
                    warn!("Could not play sound {}: {}", name, e);
                },
                None => debug!("No active sound player, ignoring play_sound {}", name)
            },
            RcCmd::StopSound { name } => match self.sound_player() {
                Some(p) => if let Err(e) = p.stop(&name) {
                    warn!("Could not stop sound {}: {}", name, e);
                },
                None => debug!("No active sound player, ignoring stop_sound {}", name)
            },
            // Queries are answered by the server
            RcCmd::VehicleStatus | RcCmd::SensorStatus | RcCmd::SoundStatus => ()
        }
    }

    fn publish_status(&mut self) {
        let cache = match self.status_cache {
            Some(ref c) => c.clone(),
            None => return
        };

        let sound = match self.sound_player() {
            Some(p) => SoundStatus {
                soundfiles: p.list_available(),
                playing: p.list_playing(),
            },
            None => SoundStatus::default()
        };

        let snapshot = StatusSnapshot {
            vehicle: self.state.status(),
            sensors: self.sensor_status(),
            sound,
        };

        if !cache.try_publish(snapshot) {
            debug!("Status cache busy, snapshot skipped");
        }
    }
}

impl Drop for Vehicle {
    /// Motors are zeroed however the vehicle goes away, including unwinding from a panicking
    /// module.
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Could not stop the motors: {}", e);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{module::ModuleError, sim::{SimMotor, SimSoundPlayer}, sound::SoundModule};
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;

    /// Module which records its updates into a shared log.
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<(&'static str, f64)>>>,
    }

    impl Module for Recorder {
        fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
            self.log.lock().push((self.name, state.target_speed));
            Ok(())
        }
    }

    struct Failing;

    impl Module for Failing {
        fn update(&mut self, _: &mut VehicleState) -> Result<(), ModuleError> {
            Err(ModuleError::Failed(String::from("always fails")))
        }
    }

    struct SetSpeed(f64);

    impl Module for SetSpeed {
        fn update(&mut self, state: &mut VehicleState) -> Result<(), ModuleError> {
            state.target_speed = self.0;
            Ok(())
        }
    }

    fn vehicle() -> (Vehicle, SimMotor, SimMotor) {
        let left = SimMotor::default();
        let right = SimMotor::default();
        let vehicle = Vehicle::new(
            VehicleParams::default(),
            Box::new(left.clone()),
            Box::new(right.clone())
        );

        (vehicle, left, right)
    }

    #[test]
    fn test_registry() {
        let (mut vehicle, _, _) = vehicle();

        vehicle.register("drive:random", SetSpeed(0.5)).unwrap();

        assert!(matches!(
            vehicle.register("drive:random", SetSpeed(0.1)),
            Err(VehicleError::DuplicateModule(_))
        ));
        assert!(matches!(vehicle.register("", Failing), Err(VehicleError::InvalidModuleName(_))));
        assert!(matches!(
            vehicle.register("drive: random", Failing),
            Err(VehicleError::InvalidModuleName(_))
        ));
        assert!(matches!(vehicle.get("drive:line"), Err(VehicleError::ModuleNotFound(_))));

        let slot = vehicle.get("drive:random").unwrap();
        assert_eq!(slot.name(), "drive:random");
        assert!(slot.is_active());
    }

    #[test]
    fn test_modules_updated_in_order() {
        let (mut vehicle, _, _) = vehicle();
        let log = Arc::new(Mutex::new(Vec::new()));

        vehicle.register("sensor:a", Recorder { name: "a", log: log.clone() }).unwrap();
        vehicle.register("drive:fast", SetSpeed(0.8)).unwrap();
        vehicle.register("failing", Failing).unwrap();
        vehicle.register("sensor:b", Recorder { name: "b", log: log.clone() }).unwrap();
        vehicle.register("sensor:c", Recorder { name: "c", log: log.clone() }).unwrap();

        vehicle.get_mut("sensor:c").unwrap().disable();

        // Errors do not prevent later modules being updated
        vehicle.tick().unwrap();
        assert_eq!(*log.lock(), vec![("a", 0.0), ("b", 0.8)]);
        assert_eq!(vehicle.state().speed_total(), 0.8);
    }

    #[test]
    fn test_motors_driven() {
        let (mut vehicle, left, right) = vehicle();
        vehicle.state_mut().target_speed = 1.0;
        vehicle.state_mut().direction = -0.5;

        vehicle.tick().unwrap();
        assert_eq!(left.value(), 0.5);
        assert_eq!(right.value(), 1.0);

        vehicle.stop().unwrap();
        assert_eq!(left.value(), 0.0);
        assert_eq!(right.value(), 0.0);
        assert_eq!(vehicle.state().speed_total(), 0.0);
        assert_eq!(vehicle.state().target_speed, 1.0);
    }

    #[test]
    fn test_motor_error_returned() {
        let (mut vehicle, left, _) = vehicle();
        left.fail(true);
        vehicle.state_mut().target_speed = 1.0;

        assert!(matches!(vehicle.tick(), Err(VehicleError::Motor(_))));
    }

    #[test]
    fn test_remote_commands() {
        let (mut vehicle, _, _) = vehicle();
        let (tx, rx) = unbounded();
        let cache = Arc::new(StatusCache::default());
        vehicle.connect_remote(rx, cache.clone());

        let log = Arc::new(Mutex::new(Vec::new()));
        vehicle.register("sensor:a", Recorder { name: "a", log: log.clone() }).unwrap();
        vehicle.register("drive:random", SetSpeed(-1.0)).unwrap();

        tx.send(RcCmd::Set { attr: SetAttr::TargetSpeed, value: 0.5 }).unwrap();
        tx.send(RcCmd::Set { attr: SetAttr::Direction, value: -0.2 }).unwrap();
        tx.send(RcCmd::DisableSensor { name: "drive:random".into() }).unwrap();
        tx.send(RcCmd::DisableSensor { name: "drive:random".into() }).unwrap();
        tx.send(RcCmd::EnableSensor { name: "drive:unknown".into() }).unwrap();
        tx.send(RcCmd::PlaySound { name: "horn.wav".into() }).unwrap();
        vehicle.tick().unwrap();

        // Commands are applied before the modules are updated
        assert_eq!(*log.lock(), vec![("a", 0.5)]);

        let status = cache.vehicle();
        assert_eq!(status.target_speed, 0.5);
        assert_eq!(status.direction, -0.2);

        let sensors = cache.sensors();
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors.get("drive:random"), Some(&false));
        assert_eq!(sensors.get("sensor:a"), Some(&true));
        assert_eq!(cache.sound(), SoundStatus::default());

        tx.send(RcCmd::EnableSensor { name: "drive:random".into() }).unwrap();
        vehicle.tick().unwrap();
        assert_eq!(cache.vehicle().target_speed, -1.0);
    }

    #[test]
    fn test_sound_commands() {
        let (mut vehicle, _, _) = vehicle();
        let (tx, rx) = unbounded();
        let cache = Arc::new(StatusCache::default());
        vehicle.connect_remote(rx, cache.clone());

        let player = SimSoundPlayer::new(&["horn.wav", "siren.wav"]);
        vehicle.register("sound:player", SoundModule::new(player)).unwrap();

        tx.send(RcCmd::PlaySound { name: "siren.wav".into() }).unwrap();
        tx.send(RcCmd::PlaySound { name: "missing.wav".into() }).unwrap();
        vehicle.tick().unwrap();

        let sound = cache.sound();
        assert_eq!(sound.soundfiles, vec!["horn.wav", "siren.wav"]);
        assert_eq!(sound.playing, vec!["siren.wav"]);

        tx.send(RcCmd::StopSound { name: "siren.wav".into() }).unwrap();
        vehicle.tick().unwrap();
        assert!(cache.sound().playing.is_empty());

        // Disabling the player hides it from the status and from commands
        tx.send(RcCmd::DisableSensor { name: "sound:player".into() }).unwrap();
        tx.send(RcCmd::PlaySound { name: "horn.wav".into() }).unwrap();
        vehicle.tick().unwrap();
        assert_eq!(cache.sound(), SoundStatus::default());

        tx.send(RcCmd::EnableSensor { name: "sound:player".into() }).unwrap();
        vehicle.tick().unwrap();
        assert!(cache.sound().playing.is_empty());
    }

    #[test]
    fn test_motors_stopped_on_panic() {
        struct PanicOnSecond(u32);

        impl Module for PanicOnSecond {
            fn update(&mut self, _: &mut VehicleState) -> Result<(), ModuleError> {
                self.0 += 1;
                let readings: Vec<f64> = Vec::new();
                if self.0 == 2 {
                    let _first: f64 = readings[0];
                }
                Ok(())
            }
        }

        let (mut vehicle, left, right) = vehicle();
        vehicle.register("sensor:faulty", PanicOnSecond(0)).unwrap();
        vehicle.state_mut().target_speed = 1.0;

        // The vehicle is moved in so that the panic unwinds through its drop
        let driven = left.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            vehicle.tick().unwrap();
            assert_eq!(driven.value(), 1.0);
            vehicle.tick()
        }));

        assert!(result.is_err());
        assert_eq!(left.value(), 0.0);
        assert_eq!(right.value(), 0.0);
    }

    #[test]
    fn test_loop_stops_when_cleared() {
        struct StopAfter(u32, Arc<AtomicBool>);

        impl Module for StopAfter {
            fn update(&mut self, _: &mut VehicleState) -> Result<(), ModuleError> {
                self.0 -= 1;
                if self.0 == 0 {
                    self.1.store(false, Ordering::Relaxed);
                }
                Ok(())
            }
        }

        let (mut vehicle, _, _) = vehicle();
        let running = Arc::new(AtomicBool::new(true));
        vehicle.register("stop", StopAfter(3, running.clone())).unwrap();

        vehicle.loop_forever(1000.0, &running).unwrap();
        assert_eq!(vehicle.num_cycles, 3);

        assert!(matches!(
            vehicle.loop_forever(0.0, &running),
            Err(VehicleError::InvalidFrequency(_))
        ));
    }
}
