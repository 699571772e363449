#![cfg_attr(all(not(test), not(feature = "std")), no_std)]

//! # knx-link
//!
//! KNX link-layer frame codecs and KNXnet/IP tunneling/routing connections.
//!
//! This crate provides a `no_std` protocol stack for the KNX field bus:
//! the raw link-layer frames exchanged on the supported communication media
//! (TP1 twisted-pair, PL110 and PL132 power-line) together with their
//! acknowledgment frames, and the KNXnet/IP service structures and connection
//! state machines used to carry those frames over an IP network.
//!
//! ## Features
//!
//! - Link-layer L-Data frames (standard and extended format) per medium
//! - Per-medium acknowledgment frames, including checksum-classified acks
//! - KNXnet/IP service bodies (connect, connection state, disconnect,
//!   tunneling, routing)
//! - Tunneling and routing connection state machines with heartbeat
//!   supervision and lost-message accounting
//! - Listener notification for received frames, connection close and
//!   message loss
//!
//! The state machines are sans-I/O: they consume received byte buffers and
//! explicit time, and produce byte buffers to transmit. An async driver for
//! the Embassy runtime is available behind the `embassy` feature; any other
//! runtime can drive the machines through the [`net::transport::AsyncTransport`]
//! boundary.

pub mod addressing;
pub mod connection;
pub mod error;
pub mod medium;
pub mod net;
pub mod protocol;

// Macro modules (must be declared before use)
#[macro_use]
pub mod logging;

// Re-export commonly used types
#[doc(inline)]
pub use addressing::{GroupAddress, IndividualAddress};
#[doc(inline)]
pub use connection::{BlockingMode, ConnState, LinkListener, RouterMachine, TunnelMachine};
#[doc(inline)]
pub use error::{KnxError, Result};
#[doc(inline)]
pub use medium::{AckType, KnxMedium, LData, RawAck, RawFrame};
#[doc(inline)]
pub use net::Ipv4Addr;
