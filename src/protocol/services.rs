//! KNXnet/IP service body structures.
//!
//! Each service body carries a symmetric `build`/`parse` pair: `build`
//! writes the structure into a caller buffer and returns the number of
//! bytes written, `parse` reads it back, rejecting short buffers with a
//! format error. The surrounding 6-byte KNXnet/IP header is handled by
//! [`crate::protocol::frame`].

use crate::error::{KnxError, Result};
use crate::protocol::constants::{
    E_CONNECTION_ID, E_DATA_CONNECTION, E_KNX_CONNECTION, E_NO_ERROR, IPV4_UDP,
    TUNNEL_CONNECTION, TUNNEL_LINK_LAYER,
};

// =============================================================================
// HPAI - Host Protocol Address Information
// =============================================================================

/// Host Protocol Address Information (HPAI)
///
/// Endpoint description (host protocol, IP address, port) carried by the
/// core services.
///
/// ```text
/// ┌──────────────┬──────────────┬─────────────────────┐
/// │ Structure Len│ Host Protocol│   IP Address        │
/// │   (1 byte)   │   (1 byte)   │   (4 bytes IPv4)    │
/// ├──────────────┴──────────────┴─────────────────────┤
/// │                Port (2 bytes)                      │
/// └────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hpai {
    /// Host protocol code
    pub host_protocol: u8,
    /// IPv4 address (4 bytes)
    pub ip_address: [u8; 4],
    /// UDP port
    pub port: u16,
}

impl Hpai {
    /// Size of the HPAI structure for IPv4
    pub const SIZE: usize = 8;

    /// Create a new HPAI for IPv4 UDP
    pub const fn new(ip_address: [u8; 4], port: u16) -> Self {
        Self {
            host_protocol: IPV4_UDP,
            ip_address,
            port,
        }
    }

    /// Parse an HPAI from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        if data[0] != Self::SIZE as u8 {
            return Err(KnxError::invalid_frame());
        }
        Ok(Self {
            host_protocol: data[1],
            ip_address: [data[2], data[3], data[4], data[5]],
            port: u16::from_be_bytes([data[6], data[7]]),
        })
    }

    /// Encode the HPAI into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = Self::SIZE as u8;
        buf[1] = self.host_protocol;
        buf[2..6].copy_from_slice(&self.ip_address);
        buf[6..8].copy_from_slice(&self.port.to_be_bytes());
        Ok(Self::SIZE)
    }
}

// =============================================================================
// CRI - Connection Request Information
// =============================================================================

/// Connection Request Information for a tunneling connection.
///
/// `[len = 4][connection type][KNX layer][reserved]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cri {
    /// Connection type code
    pub connection_type: u8,
    /// Requested KNX layer
    pub knx_layer: u8,
}

impl Cri {
    /// Size of the CRI structure
    pub const SIZE: usize = 4;

    /// CRI for a link-layer tunnel
    pub const fn tunnel_link_layer() -> Self {
        Self {
            connection_type: TUNNEL_CONNECTION,
            knx_layer: TUNNEL_LINK_LAYER,
        }
    }

    /// Parse a CRI from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        if data[0] != Self::SIZE as u8 {
            return Err(KnxError::invalid_frame());
        }
        Ok(Self {
            connection_type: data[1],
            knx_layer: data[2],
        })
    }

    /// Encode the CRI into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = Self::SIZE as u8;
        buf[1] = self.connection_type;
        buf[2] = self.knx_layer;
        buf[3] = 0;
        Ok(Self::SIZE)
    }
}

// =============================================================================
// Connection Status
// =============================================================================

/// Status byte of connect and connection-state responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionStatus {
    /// No error (0x00)
    Ok,
    /// Unknown or inactive communication channel (0x21)
    UnknownChannel,
    /// Error concerning the data connection (0x26)
    DataConnectionError,
    /// Error concerning the KNX connection (0x27)
    KnxConnectionError,
    /// Any other status byte
    Unknown(u8),
}

impl ConnectionStatus {
    /// Classify a raw status byte
    pub const fn from_u8(value: u8) -> Self {
        match value {
            E_NO_ERROR => Self::Ok,
            E_CONNECTION_ID => Self::UnknownChannel,
            E_DATA_CONNECTION => Self::DataConnectionError,
            E_KNX_CONNECTION => Self::KnxConnectionError,
            other => Self::Unknown(other),
        }
    }

    /// Raw status byte
    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Ok => E_NO_ERROR,
            Self::UnknownChannel => E_CONNECTION_ID,
            Self::DataConnectionError => E_DATA_CONNECTION,
            Self::KnxConnectionError => E_KNX_CONNECTION,
            Self::Unknown(other) => other,
        }
    }
}

/// Textual description of a connection-state status byte.
///
/// Only the states a client can act on carry specific wording; every
/// other status byte maps to the generic text.
pub const fn connection_status_description(status: u8) -> &'static str {
    match status {
        E_NO_ERROR => "the connection state is normal",
        E_DATA_CONNECTION => "server detected error concerning the data connection",
        E_KNX_CONNECTION => "server detected error concerning the KNX bus/subsystem connection",
        _ => "unknown status",
    }
}

// =============================================================================
// Core Services
// =============================================================================

/// CONNECT_REQUEST body: control HPAI, data HPAI and CRI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectRequest {
    /// Control endpoint of the client
    pub control_endpoint: Hpai,
    /// Data endpoint of the client
    pub data_endpoint: Hpai,
    /// Requested connection
    pub cri: Cri,
}

impl ConnectRequest {
    /// Body size in bytes
    pub const SIZE: usize = 2 * Hpai::SIZE + Cri::SIZE;

    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        Ok(Self {
            control_endpoint: Hpai::parse(&data[0..])?,
            data_endpoint: Hpai::parse(&data[Hpai::SIZE..])?,
            cri: Cri::parse(&data[2 * Hpai::SIZE..])?,
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        let mut pos = self.control_endpoint.build(buf)?;
        pos += self.data_endpoint.build(&mut buf[pos..])?;
        pos += self.cri.build(&mut buf[pos..])?;
        Ok(pos)
    }
}

/// CONNECT_RESPONSE body.
///
/// On error status the server sends only channel and status; the data
/// endpoint and connection response data block are present on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectResponse {
    /// Communication channel assigned by the server
    pub channel_id: u8,
    /// Connection status
    pub status: u8,
    /// Data endpoint of the server (success only)
    pub data_endpoint: Option<Hpai>,
    /// Individual address assigned to the tunnel (success only)
    pub knx_address: Option<u16>,
}

impl ConnectResponse {
    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(KnxError::buffer_too_short());
        }
        let channel_id = data[0];
        let status = data[1];
        if status != E_NO_ERROR {
            return Ok(Self {
                channel_id,
                status,
                data_endpoint: None,
                knx_address: None,
            });
        }
        let data_endpoint = Hpai::parse(&data[2..])?;
        // CRD: [len = 4][connection type][KNX individual address:2]
        let crd = &data[2 + Hpai::SIZE..];
        if crd.len() < 4 {
            return Err(KnxError::buffer_too_short());
        }
        if crd[0] != 4 {
            return Err(KnxError::invalid_frame());
        }
        Ok(Self {
            channel_id,
            status,
            data_endpoint: Some(data_endpoint),
            knx_address: Some(u16::from_be_bytes([crd[2], crd[3]])),
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = self.channel_id;
        buf[1] = self.status;
        let (Some(endpoint), Some(addr)) = (self.data_endpoint, self.knx_address) else {
            return Ok(2);
        };
        let mut pos = 2 + endpoint.build(&mut buf[2..])?;
        if buf.len() < pos + 4 {
            return Err(KnxError::buffer_too_small());
        }
        buf[pos] = 4;
        buf[pos + 1] = TUNNEL_CONNECTION;
        buf[pos + 2..pos + 4].copy_from_slice(&addr.to_be_bytes());
        pos += 4;
        Ok(pos)
    }

    /// Connection status classified from the raw byte
    pub const fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status)
    }
}

/// CONNECTIONSTATE_REQUEST body: channel, reserved byte and control HPAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionStateRequest {
    /// Communication channel to probe
    pub channel_id: u8,
    /// Control endpoint of the client
    pub control_endpoint: Hpai,
}

impl ConnectionStateRequest {
    /// Body size in bytes
    pub const SIZE: usize = 2 + Hpai::SIZE;

    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        Ok(Self {
            channel_id: data[0],
            control_endpoint: Hpai::parse(&data[2..])?,
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = self.channel_id;
        buf[1] = 0;
        self.control_endpoint.build(&mut buf[2..])?;
        Ok(Self::SIZE)
    }
}

/// CONNECTIONSTATE_RESPONSE body: channel and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionStateResponse {
    /// Communication channel the response refers to
    pub channel_id: u8,
    /// Connection status byte
    pub status: u8,
}

impl ConnectionStateResponse {
    /// Body size in bytes
    pub const SIZE: usize = 2;

    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        Ok(Self {
            channel_id: data[0],
            status: data[1],
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = self.channel_id;
        buf[1] = self.status;
        Ok(Self::SIZE)
    }

    /// Connection status classified from the raw byte
    pub const fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus::from_u8(self.status)
    }

    /// Textual description of the status byte
    pub const fn status_description(&self) -> &'static str {
        connection_status_description(self.status)
    }
}

/// DISCONNECT_REQUEST body: channel, reserved byte and control HPAI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisconnectRequest {
    /// Communication channel to tear down
    pub channel_id: u8,
    /// Control endpoint of the client
    pub control_endpoint: Hpai,
}

impl DisconnectRequest {
    /// Body size in bytes
    pub const SIZE: usize = 2 + Hpai::SIZE;

    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        Ok(Self {
            channel_id: data[0],
            control_endpoint: Hpai::parse(&data[2..])?,
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = self.channel_id;
        buf[1] = 0;
        self.control_endpoint.build(&mut buf[2..])?;
        Ok(Self::SIZE)
    }
}

/// DISCONNECT_RESPONSE body: channel and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisconnectResponse {
    /// Communication channel that was torn down
    pub channel_id: u8,
    /// Status byte
    pub status: u8,
}

impl DisconnectResponse {
    /// Body size in bytes
    pub const SIZE: usize = 2;

    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        Ok(Self {
            channel_id: data[0],
            status: data[1],
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = self.channel_id;
        buf[1] = self.status;
        Ok(Self::SIZE)
    }
}

// =============================================================================
// Tunneling Services
// =============================================================================

/// Connection header prefixed to tunneling bodies.
///
/// `[len = 4][channel][sequence][status/reserved]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHeader {
    /// Communication channel
    pub channel_id: u8,
    /// Sequence counter
    pub sequence: u8,
    /// Status byte (reserved in requests)
    pub status: u8,
}

impl ConnectionHeader {
    /// Size of the connection header
    pub const SIZE: usize = 4;

    /// Parse the header from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        if data[0] != Self::SIZE as u8 {
            return Err(KnxError::invalid_frame());
        }
        Ok(Self {
            channel_id: data[1],
            sequence: data[2],
            status: data[3],
        })
    }

    /// Encode the header into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = Self::SIZE as u8;
        buf[1] = self.channel_id;
        buf[2] = self.sequence;
        buf[3] = self.status;
        Ok(Self::SIZE)
    }
}

/// TUNNELING_REQUEST body: connection header followed by a cEMI frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TunnelingRequest<'a> {
    /// Communication channel
    pub channel_id: u8,
    /// Send or receive sequence counter
    pub sequence: u8,
    /// cEMI frame bytes
    pub payload: &'a [u8],
}

impl<'a> TunnelingRequest<'a> {
    /// Parse the body from bytes
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = ConnectionHeader::parse(data)?;
        Ok(Self {
            channel_id: header.channel_id,
            sequence: header.sequence,
            payload: &data[ConnectionHeader::SIZE..],
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total = ConnectionHeader::SIZE + self.payload.len();
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }
        ConnectionHeader {
            channel_id: self.channel_id,
            sequence: self.sequence,
            status: 0,
        }
        .build(buf)?;
        buf[ConnectionHeader::SIZE..total].copy_from_slice(self.payload);
        Ok(total)
    }
}

/// TUNNELING_ACK body: a connection header whose last byte is the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TunnelingAck {
    /// Communication channel
    pub channel_id: u8,
    /// Acknowledged sequence counter
    pub sequence: u8,
    /// Status byte
    pub status: u8,
}

impl TunnelingAck {
    /// Body size in bytes
    pub const SIZE: usize = ConnectionHeader::SIZE;

    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = ConnectionHeader::parse(data)?;
        Ok(Self {
            channel_id: header.channel_id,
            sequence: header.sequence,
            status: header.status,
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        ConnectionHeader {
            channel_id: self.channel_id,
            sequence: self.sequence,
            status: self.status,
        }
        .build(buf)
    }
}

// =============================================================================
// Routing Services
// =============================================================================

/// ROUTING_INDICATION body: a bare cEMI frame, multicast to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoutingIndication<'a> {
    /// cEMI frame bytes
    pub payload: &'a [u8],
}

impl<'a> RoutingIndication<'a> {
    /// Parse the body from bytes
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(KnxError::buffer_too_short());
        }
        Ok(Self { payload: data })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < self.payload.len() {
            return Err(KnxError::buffer_too_small());
        }
        buf[..self.payload.len()].copy_from_slice(self.payload);
        Ok(self.payload.len())
    }
}

/// ROUTING_LOST_MESSAGE body.
///
/// `[len = 4][device state][lost messages:2]`; the lost-message field is
/// the running total of frames the router dropped since startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RoutingLostMessage {
    /// Router device state
    pub device_state: u8,
    /// Total number of lost messages
    pub lost_messages: u16,
}

impl RoutingLostMessage {
    /// Body size in bytes
    pub const SIZE: usize = 4;

    /// Parse the body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        if data[0] != Self::SIZE as u8 {
            return Err(KnxError::invalid_frame());
        }
        Ok(Self {
            device_state: data[1],
            lost_messages: u16::from_be_bytes([data[2], data[3]]),
        })
    }

    /// Encode the body into bytes
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = Self::SIZE as u8;
        buf[1] = self.device_state;
        buf[2..4].copy_from_slice(&self.lost_messages.to_be_bytes());
        Ok(Self::SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hpai_round_trip() {
        let hpai = Hpai::new([192, 168, 1, 100], 3671);
        let mut buf = [0u8; 8];
        assert_eq!(hpai.build(&mut buf).unwrap(), 8);
        assert_eq!(buf, [0x08, 0x01, 192, 168, 1, 100, 0x0E, 0x57]);
        assert_eq!(Hpai::parse(&buf).unwrap(), hpai);
    }

    #[test]
    fn test_hpai_bad_length_field() {
        let buf = [0x07, 0x01, 192, 168, 1, 100, 0x0E, 0x57];
        assert!(Hpai::parse(&buf).is_err());
    }

    #[test]
    fn test_connect_request_round_trip() {
        let req = ConnectRequest {
            control_endpoint: Hpai::new([10, 0, 0, 1], 3671),
            data_endpoint: Hpai::new([10, 0, 0, 1], 3672),
            cri: Cri::tunnel_link_layer(),
        };
        let mut buf = [0u8; ConnectRequest::SIZE];
        assert_eq!(req.build(&mut buf).unwrap(), ConnectRequest::SIZE);
        assert_eq!(ConnectRequest::parse(&buf).unwrap(), req);
    }

    #[test]
    fn test_connect_response_success_round_trip() {
        let rsp = ConnectResponse {
            channel_id: 21,
            status: E_NO_ERROR,
            data_endpoint: Some(Hpai::new([10, 0, 0, 2], 3671)),
            knx_address: Some(0x110A),
        };
        let mut buf = [0u8; 32];
        let n = rsp.build(&mut buf).unwrap();
        assert_eq!(n, 2 + Hpai::SIZE + 4);
        assert_eq!(ConnectResponse::parse(&buf[..n]).unwrap(), rsp);
    }

    #[test]
    fn test_connect_response_error_is_short() {
        let rsp = ConnectResponse {
            channel_id: 0,
            status: 0x24,
            data_endpoint: None,
            knx_address: None,
        };
        let mut buf = [0u8; 32];
        let n = rsp.build(&mut buf).unwrap();
        assert_eq!(n, 2);
        let parsed = ConnectResponse::parse(&buf[..n]).unwrap();
        assert_eq!(parsed.status, 0x24);
        assert_eq!(parsed.data_endpoint, None);
    }

    #[test]
    fn test_connection_state_round_trip() {
        let req = ConnectionStateRequest {
            channel_id: 7,
            control_endpoint: Hpai::new([10, 0, 0, 1], 3671),
        };
        let mut buf = [0u8; ConnectionStateRequest::SIZE];
        req.build(&mut buf).unwrap();
        assert_eq!(ConnectionStateRequest::parse(&buf).unwrap(), req);

        let rsp = ConnectionStateResponse {
            channel_id: 7,
            status: E_NO_ERROR,
        };
        let mut buf = [0u8; 2];
        rsp.build(&mut buf).unwrap();
        assert_eq!(ConnectionStateResponse::parse(&buf).unwrap(), rsp);
    }

    #[test]
    fn test_status_descriptions() {
        assert_eq!(
            connection_status_description(0x00),
            "the connection state is normal"
        );
        assert_eq!(
            connection_status_description(0x26),
            "server detected error concerning the data connection"
        );
        assert_eq!(
            connection_status_description(0x27),
            "server detected error concerning the KNX bus/subsystem connection"
        );
        // Every other status byte gets the generic text.
        assert_eq!(connection_status_description(0x21), "unknown status");
        assert_eq!(connection_status_description(0xFF), "unknown status");
    }

    #[test]
    fn test_connection_status_classification() {
        assert_eq!(ConnectionStatus::from_u8(0x00), ConnectionStatus::Ok);
        assert_eq!(
            ConnectionStatus::from_u8(0x21),
            ConnectionStatus::UnknownChannel
        );
        assert_eq!(
            ConnectionStatus::from_u8(0x26),
            ConnectionStatus::DataConnectionError
        );
        assert_eq!(
            ConnectionStatus::from_u8(0x27),
            ConnectionStatus::KnxConnectionError
        );
        assert_eq!(ConnectionStatus::from_u8(0x42), ConnectionStatus::Unknown(0x42));
        assert_eq!(ConnectionStatus::Unknown(0x42).to_u8(), 0x42);
    }

    #[test]
    fn test_tunneling_request_round_trip() {
        let payload = [0x29, 0x00, 0xBC, 0xE0];
        let req = TunnelingRequest {
            channel_id: 21,
            sequence: 3,
            payload: &payload,
        };
        let mut buf = [0u8; 16];
        let n = req.build(&mut buf).unwrap();
        assert_eq!(n, ConnectionHeader::SIZE + payload.len());
        let parsed = TunnelingRequest::parse(&buf[..n]).unwrap();
        assert_eq!(parsed.channel_id, 21);
        assert_eq!(parsed.sequence, 3);
        assert_eq!(parsed.payload, &payload);
    }

    #[test]
    fn test_tunneling_ack_round_trip() {
        let ack = TunnelingAck {
            channel_id: 21,
            sequence: 3,
            status: E_NO_ERROR,
        };
        let mut buf = [0u8; 4];
        ack.build(&mut buf).unwrap();
        assert_eq!(TunnelingAck::parse(&buf).unwrap(), ack);
    }

    #[test]
    fn test_routing_lost_message_round_trip() {
        let lost = RoutingLostMessage {
            device_state: 0x01,
            lost_messages: 9,
        };
        let mut buf = [0u8; 4];
        lost.build(&mut buf).unwrap();
        assert_eq!(buf, [0x04, 0x01, 0x00, 0x09]);
        assert_eq!(RoutingLostMessage::parse(&buf).unwrap(), lost);
    }

    #[test]
    fn test_short_buffers_rejected() {
        assert!(Hpai::parse(&[0x08, 0x01]).is_err());
        assert!(ConnectionStateResponse::parse(&[0x07]).is_err());
        assert!(RoutingLostMessage::parse(&[0x04, 0x00]).is_err());
        assert!(TunnelingAck::parse(&[0x04, 0x15, 0x03]).is_err());
    }
}
