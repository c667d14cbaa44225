//! # Network Module
//!
//! UDP endpoints for the remote control protocol. The vehicle runs an [`RcServer`] on its own
//! thread, the remote controller an [`RcClient`].
//!
//! The server never touches the live vehicle. Status queries are answered from a [`StatusCache`]
//! which the control loop refreshes once per cycle, and all other commands are pushed into a
//! channel which the control loop drains at the start of its next cycle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod cache;
mod client;
mod server;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;
use serde::{Deserialize, Serialize};
use std::{
    net::{SocketAddr, UdpSocket},
    time::Duration,
};

pub use cache::*;
pub use client::*;
pub use server::*;

// Export the channel so users don't need to depend on crossbeam directly
pub use crossbeam_channel;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum size of a datagram in either direction.
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// Size of receive buffers. One byte over the maximum so that oversize datagrams, which the
/// socket truncates, can be told apart and dropped.
const RECV_BUF_SIZE: usize = MAX_DATAGRAM_SIZE + 1;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters of the vehicle side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RcServerParams {
    /// Address the server socket is bound to. Use `0.0.0.0` to listen on all interfaces.
    pub bind_addr: String,

    /// Time to sleep when no datagram is pending.
    ///
    /// Units: milliseconds
    pub idle_sleep_ms: u64,
}

/// Network parameters of the remote controller side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RcClientParams {
    /// Address the client socket is bound to.
    pub bind_addr: String,

    /// Address of the vehicle's server socket.
    pub vehicle_addr: String,

    /// Number of status requests per second.
    ///
    /// Units: Hz
    pub update_frequency_hz: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Could not bind the socket to {0}: {1}")]
    Bind(String, std::io::Error),

    #[error("Invalid network address \"{0}\"")]
    InvalidAddress(String),

    #[error("Socket error: {0}")]
    Io(std::io::Error),

    #[error("Could not serialize the message: {0}")]
    Serialize(serde_json::Error),

    #[error("Message of {0} bytes is larger than the maximum datagram size")]
    Oversize(usize),

    #[error("Invalid update frequency {0} Hz")]
    InvalidFrequency(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RcServerParams {
    fn default() -> Self {
        Self {
            bind_addr: String::from("0.0.0.0:9876"),
            idle_sleep_ms: 50,
        }
    }
}

impl Default for RcClientParams {
    fn default() -> Self {
        Self {
            bind_addr: String::from("0.0.0.0:6789"),
            vehicle_addr: String::from("127.0.0.1:9876"),
            update_frequency_hz: 10.0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Period of a loop running at the given frequency.
fn cycle_period(frequency_hz: f64) -> Result<Duration, NetError> {
    if frequency_hz.is_finite() && frequency_hz > 0.0 {
        Ok(Duration::from_secs_f64(1.0 / frequency_hz))
    }
    else {
        Err(NetError::InvalidFrequency(frequency_hz))
    }
}

/// Bind a non-blocking UDP socket.
fn bind_nonblocking(addr: &str) -> Result<UdpSocket, NetError> {
    let socket = UdpSocket::bind(addr)
        .map_err(|e| NetError::Bind(addr.to_string(), e))?;

    socket.set_nonblocking(true)
        .map_err(NetError::Io)?;

    Ok(socket)
}

/// Serialize a message and send it as a single datagram.
fn send_json<T: Serialize>(socket: &UdpSocket, msg: &T, addr: SocketAddr) -> Result<(), NetError> {
    let bytes = serde_json::to_vec(msg)
        .map_err(NetError::Serialize)?;

    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(NetError::Oversize(bytes.len()))
    }

    trace!("Sending {} bytes to {}", bytes.len(), addr);

    socket.send_to(&bytes, addr)
        .map(|_| ())
        .map_err(NetError::Io)
}
