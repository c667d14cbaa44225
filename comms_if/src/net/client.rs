//! # Remote control client
//!
//! Remote controller side of the remote control protocol. Commands can be queued from any thread
//! through a [`CommandSender`], they are flushed to the vehicle on the next [`RcClient::cycle`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info, warn};
use std::{
    io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::{Duration, Instant},
};

use super::{
    bind_nonblocking, cycle_period, send_json, NetError, RcClientParams, MAX_DATAGRAM_SIZE,
    RECV_BUF_SIZE,
};
use crate::rc::{RcCmd, RcResponse, SensorStatus, SetAttr, SoundStatus, VehicleStatus};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The vehicle is considered disconnected if it has not answered for this long.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(1);

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Receiver of the status information reported by the vehicle.
pub trait TelemetryHandler {
    fn on_connection_change(&mut self, _connected: bool) {}

    fn on_vehicle_status(&mut self, _status: &VehicleStatus) {}

    fn on_sensor_status(&mut self, _status: &SensorStatus) {}

    fn on_sound_status(&mut self, _status: &SoundStatus) {}
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle used to queue commands for the vehicle.
#[derive(Debug, Clone)]
pub struct CommandSender(Sender<RcCmd>);

/// Remote control client.
pub struct RcClient {
    socket: UdpSocket,

    vehicle_addr: SocketAddr,

    cmd_sender: Sender<RcCmd>,

    cmd_receiver: Receiver<RcCmd>,

    connected: bool,

    last_response: Option<Instant>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CommandSender {
    /// Queue a command.
    ///
    /// Returns `false` if the client has been dropped.
    pub fn send(&self, cmd: RcCmd) -> bool {
        self.0.send(cmd).is_ok()
    }

    pub fn set_attribute(&self, attr: SetAttr, value: f64) -> bool {
        self.send(RcCmd::Set { attr, value })
    }

    /// Queue an `enable_sensor` or `disable_sensor` command.
    pub fn enable_sensor(&self, name: &str, enabled: bool) -> bool {
        let name = name.to_string();

        match enabled {
            true => self.send(RcCmd::EnableSensor { name }),
            false => self.send(RcCmd::DisableSensor { name })
        }
    }

    /// Queue a `play_sound` or `stop_sound` command.
    pub fn play_sound(&self, name: &str, play: bool) -> bool {
        let name = name.to_string();

        match play {
            true => self.send(RcCmd::PlaySound { name }),
            false => self.send(RcCmd::StopSound { name })
        }
    }
}

impl RcClient {
    /// Create a new client, binding its socket and resolving the vehicle's address.
    pub fn new(params: &RcClientParams) -> Result<Self, NetError> {
        cycle_period(params.update_frequency_hz)?;

        let vehicle_addr = params.vehicle_addr
            .to_socket_addrs()
            .ok()
            .and_then(|mut a| a.next())
            .ok_or_else(|| NetError::InvalidAddress(params.vehicle_addr.clone()))?;

        let socket = bind_nonblocking(&params.bind_addr)?;

        let (cmd_sender, cmd_receiver) = unbounded();

        Ok(Self {
            socket,
            vehicle_addr,
            cmd_sender,
            cmd_receiver,
            connected: false,
            last_response: None,
        })
    }

    /// Get a handle which can queue commands from another thread.
    pub fn command_sender(&self) -> CommandSender {
        CommandSender(self.cmd_sender.clone())
    }

    /// Address the client socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        self.socket.local_addr().map_err(NetError::Io)
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Perform one exchange with the vehicle.
    ///
    /// Sends the three status queries, flushes all queued commands, then dispatches every response
    /// already received to the handler. Responses to this cycle's queries will usually be picked
    /// up by the next cycle.
    ///
    /// Returns the number of responses dispatched.
    pub fn cycle(&mut self, handler: &mut dyn TelemetryHandler) -> Result<usize, NetError> {
        let mut outgoing = vec![RcCmd::VehicleStatus, RcCmd::SensorStatus, RcCmd::SoundStatus];
        outgoing.extend(self.cmd_receiver.try_iter());

        for cmd in outgoing.iter() {
            match send_json(&self.socket, cmd, self.vehicle_addr) {
                Ok(()) => (),
                // An ICMP unreachable from an earlier datagram, the vehicle is not up yet
                Err(NetError::Io(ref e)) if is_transient(e) => (),
                Err(e) => return Err(e)
            }
        }

        let mut num_responses = 0;
        let mut buf = [0u8; RECV_BUF_SIZE];

        loop {
            let (len, addr) = match self.socket.recv_from(&mut buf) {
                Ok(r) => r,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if is_transient(e) => continue,
                Err(e) => return Err(NetError::Io(e)),
            };

            if addr != self.vehicle_addr {
                debug!("Ignoring datagram from unknown peer {}", addr);
                continue;
            }

            if len > MAX_DATAGRAM_SIZE {
                debug!("Dropping oversize datagram from {}", addr);
                continue;
            }

            match RcResponse::from_bytes(&buf[..len]) {
                Ok(RcResponse::VehicleStatusResponse(s)) => handler.on_vehicle_status(&s),
                Ok(RcResponse::SensorStatusResponse(s)) => handler.on_sensor_status(&s),
                Ok(RcResponse::SoundStatusResponse(s)) => handler.on_sound_status(&s),
                Err(e) => {
                    debug!("Dropping response from {}: {}", addr, e);
                    continue;
                }
            }

            num_responses += 1;
        }

        let now = Instant::now();
        if num_responses > 0 {
            self.last_response = Some(now);
        }

        let connected = match self.last_response {
            Some(t) => now.duration_since(t) < CONNECTION_TIMEOUT,
            None => false
        };

        if connected != self.connected {
            match connected {
                true => info!("Connected to vehicle at {}", self.vehicle_addr),
                false => warn!("Lost connection to vehicle at {}", self.vehicle_addr)
            }
            self.connected = connected;
            handler.on_connection_change(connected);
        }

        Ok(num_responses)
    }

    /// Call [`RcClient::cycle`] at the given frequency until `running` is cleared.
    pub fn run(
        &mut self,
        frequency_hz: f64,
        running: &AtomicBool,
        handler: &mut dyn TelemetryHandler
    ) -> Result<(), NetError> {
        let period = cycle_period(frequency_hz)?;

        while running.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            self.cycle(handler)?;

            if let Some(d) = period.checked_sub(cycle_start.elapsed()) {
                thread::sleep(d);
            }
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_invalid_vehicle_addr() {
        let params = RcClientParams {
            bind_addr: String::from("127.0.0.1:0"),
            vehicle_addr: String::from("not an address"),
            ..Default::default()
        };

        assert!(matches!(RcClient::new(&params), Err(NetError::InvalidAddress(_))));
    }

    #[test]
    fn test_invalid_frequency() {
        let mut params = RcClientParams {
            bind_addr: String::from("127.0.0.1:0"),
            update_frequency_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(RcClient::new(&params), Err(NetError::InvalidFrequency(_))));

        params.update_frequency_hz = 10.0;
        let mut client = RcClient::new(&params).unwrap();

        struct Nothing;
        impl TelemetryHandler for Nothing {}

        let running = AtomicBool::new(true);
        for f in [0.0, -5.0, f64::NAN, f64::INFINITY].iter() {
            assert!(matches!(
                client.run(*f, &running, &mut Nothing),
                Err(NetError::InvalidFrequency(_))
            ));
        }
    }

    #[test]
    fn test_commands_flushed_in_order() {
        let vehicle = UdpSocket::bind("127.0.0.1:0").unwrap();
        vehicle.set_read_timeout(Some(Duration::from_secs(1))).unwrap();

        let params = RcClientParams {
            bind_addr: String::from("127.0.0.1:0"),
            vehicle_addr: vehicle.local_addr().unwrap().to_string(),
            ..Default::default()
        };
        let mut client = RcClient::new(&params).unwrap();

        let sender = client.command_sender();
        assert!(sender.set_attribute(SetAttr::Direction, -0.2));
        assert!(sender.enable_sensor("drive:random", false));

        struct Nothing;
        impl TelemetryHandler for Nothing {}

        assert_eq!(client.cycle(&mut Nothing).unwrap(), 0);
        assert!(!client.is_connected());

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let received: Vec<RcCmd> = (0..5)
            .map(|_| {
                let len = vehicle.recv(&mut buf).unwrap();
                RcCmd::from_bytes(&buf[..len]).unwrap()
            })
            .collect();

        assert_eq!(received, vec![
            RcCmd::VehicleStatus,
            RcCmd::SensorStatus,
            RcCmd::SoundStatus,
            RcCmd::Set { attr: SetAttr::Direction, value: -0.2 },
            RcCmd::DisableSensor { name: "drive:random".into() },
        ]);
    }
}
