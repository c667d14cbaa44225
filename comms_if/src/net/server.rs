//! # Remote control server
//!
//! Vehicle side of the remote control protocol.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::{
    io,
    net::{SocketAddr, UdpSocket},
    sync::{atomic::{AtomicBool, Ordering}, Arc},
    thread,
    time::Duration,
};

use super::{
    bind_nonblocking, send_json, NetError, RcServerParams, StatusCache, MAX_DATAGRAM_SIZE,
    RECV_BUF_SIZE,
};
use crate::rc::{RcCmd, RcResponse};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Remote control server.
///
/// Status queries are answered straight from the [`StatusCache`], every other command is pushed
/// onto the command channel for the control loop.
pub struct RcServer {
    socket: UdpSocket,

    cmd_sender: Sender<RcCmd>,

    cache: Arc<StatusCache>,

    idle_sleep: Duration,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RcServer {
    /// Create a new server, binding its socket.
    ///
    /// A bind failure is returned here since the vehicle cannot be controlled remotely without
    /// the socket.
    pub fn new(
        params: &RcServerParams,
        cmd_sender: Sender<RcCmd>,
        cache: Arc<StatusCache>
    ) -> Result<Self, NetError> {
        let socket = bind_nonblocking(&params.bind_addr)?;

        Ok(Self {
            socket,
            cmd_sender,
            cache,
            idle_sleep: Duration::from_millis(params.idle_sleep_ms),
        })
    }

    /// Address the server socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, NetError> {
        self.socket.local_addr().map_err(NetError::Io)
    }

    /// Handle at most one pending datagram.
    ///
    /// Returns `Ok(true)` if a datagram was read (even if it was dropped as malformed) and
    /// `Ok(false)` if none was pending.
    pub fn poll(&self) -> Result<bool, NetError> {
        let mut buf = [0u8; RECV_BUF_SIZE];

        let (len, addr) = match self.socket.recv_from(&mut buf) {
            Ok(r) => r,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) => return Err(NetError::Io(e)),
        };

        if len > MAX_DATAGRAM_SIZE {
            debug!("Dropping oversize datagram from {}", addr);
            return Ok(true)
        }

        let cmd = match RcCmd::from_bytes(&buf[..len]) {
            Ok(c) => c,
            Err(e) => {
                debug!("Dropping datagram from {}: {}", addr, e);
                return Ok(true)
            }
        };

        let response = match cmd {
            RcCmd::VehicleStatus => RcResponse::VehicleStatusResponse(self.cache.vehicle()),
            RcCmd::SensorStatus => RcResponse::SensorStatusResponse(self.cache.sensors()),
            RcCmd::SoundStatus => RcResponse::SoundStatusResponse(self.cache.sound()),
            cmd => {
                debug!("Queueing {:?} from {}", cmd, addr);

                if self.cmd_sender.send(cmd).is_err() {
                    warn!("Command queue closed, dropping command from {}", addr);
                }

                return Ok(true)
            }
        };

        if let Err(e) = send_json(&self.socket, &response, addr) {
            warn!("Could not answer status query from {}: {}", addr, e);
        }

        Ok(true)
    }

    /// Run the server until `running` is cleared.
    ///
    /// Sleeps for the idle period whenever no datagram is pending.
    pub fn run(&self, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            match self.poll() {
                Ok(true) => (),
                Ok(false) => thread::sleep(self.idle_sleep),
                Err(e) => {
                    warn!("RcServer socket error: {}", e);
                    thread::sleep(self.idle_sleep);
                }
            }
        }

        info!("RcServer stopped");
    }

    /// Move the server onto its own thread.
    pub fn spawn(self, running: Arc<AtomicBool>) -> Result<thread::JoinHandle<()>, NetError> {
        thread::Builder::new()
            .name(String::from("rc_server"))
            .spawn(move || self.run(&running))
            .map_err(NetError::Io)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{net::StatusSnapshot, rc::SetAttr};
    use crossbeam_channel::unbounded;
    use std::time::Instant;

    fn server() -> (RcServer, crossbeam_channel::Receiver<RcCmd>, Arc<StatusCache>) {
        let params = RcServerParams {
            bind_addr: String::from("127.0.0.1:0"),
            ..Default::default()
        };
        let (tx, rx) = unbounded();
        let cache = Arc::new(StatusCache::default());

        (RcServer::new(&params, tx, cache.clone()).unwrap(), rx, cache)
    }

    /// Poll the server until a datagram has been handled or a second has passed.
    fn poll_until_handled(server: &RcServer) {
        let start = Instant::now();
        while !server.poll().unwrap() {
            assert!(start.elapsed() < Duration::from_secs(1), "No datagram arrived");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_commands_are_queued() {
        let (server, rx, _) = server();
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        peer.send_to(br#"{"cmd": "set", "attr": "target_speed", "value": 0.5}"#, addr).unwrap();
        poll_until_handled(&server);
        peer.send_to(br#"{"cmd": "nonsense"}"#, addr).unwrap();
        poll_until_handled(&server);
        peer.send_to(br#"{"cmd": "enable_sensor", "name": "drive:line"}"#, addr).unwrap();
        poll_until_handled(&server);

        let queued: Vec<RcCmd> = rx.try_iter().collect();
        assert_eq!(queued, vec![
            RcCmd::Set { attr: SetAttr::TargetSpeed, value: 0.5 },
            RcCmd::EnableSensor { name: "drive:line".into() },
        ]);
    }

    #[test]
    fn test_query_answered_from_cache() {
        let (server, rx, cache) = server();
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_secs(1))).unwrap();

        let mut snapshot = StatusSnapshot::default();
        snapshot.sensors.insert("drive:random".into(), false);
        assert!(cache.try_publish(snapshot));

        peer.send_to(br#"{"cmd": "sensor_status"}"#, server.local_addr().unwrap()).unwrap();
        poll_until_handled(&server);

        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let len = peer.recv(&mut buf).unwrap();

        match RcResponse::from_bytes(&buf[..len]).unwrap() {
            RcResponse::SensorStatusResponse(s) => assert_eq!(s.get("drive:random"), Some(&false)),
            r => panic!("Unexpected response {:?}", r)
        }

        // Queries never reach the control loop
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_oversize_datagram_dropped() {
        let (server, _, _) = server();
        let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
        peer.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
        let addr = server.local_addr().unwrap();

        let padded = |size: usize| {
            let mut msg = br#"{"cmd": "vehicle_status"}"#.to_vec();
            msg.resize(size, b' ');
            msg
        };
        let mut buf = [0u8; RECV_BUF_SIZE];

        // Valid JSON up to the limit, but too long overall
        peer.send_to(&padded(MAX_DATAGRAM_SIZE + 100), addr).unwrap();
        poll_until_handled(&server);
        assert!(peer.recv(&mut buf).is_err());

        // Exactly at the limit is still answered
        peer.send_to(&padded(MAX_DATAGRAM_SIZE), addr).unwrap();
        poll_until_handled(&server);
        let len = peer.recv(&mut buf).unwrap();
        assert!(matches!(
            RcResponse::from_bytes(&buf[..len]).unwrap(),
            RcResponse::VehicleStatusResponse(_)
        ));
    }
}
