//! KNXnet/IP protocol layer.
//!
//! Service type identifiers, protocol constants, the frame header codec and
//! the per-service body structures. Every body offers a symmetric
//! `build`/`parse` pair working on caller-provided byte slices.

pub mod constants;
pub mod frame;
pub mod services;

pub use constants::{Priority, ServiceType};
pub use frame::{FrameBuilder, KnxnetIpFrame, KnxnetIpHeader};
pub use services::{
    connection_status_description, ConnectRequest, ConnectResponse, ConnectionHeader,
    ConnectionStateRequest, ConnectionStateResponse, ConnectionStatus, Cri, DisconnectRequest,
    DisconnectResponse, Hpai, RoutingIndication, RoutingLostMessage, TunnelingAck,
    TunnelingRequest,
};
