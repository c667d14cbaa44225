//! # Communications interface crate.
//!
//! Provides the remote control protocol shared by the vehicle and the remote
//! controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Remote control commands, responses and status payloads
pub mod rc;

/// Network module
pub mod net;
