//! KNXnet/IP protocol constants and service type identifiers.

/// KNXnet/IP protocol version 1.0
pub const KNXNETIP_VERSION_10: u8 = 0x10;

/// Standard KNXnet/IP header length (6 bytes)
pub const HEADER_SIZE_10: u8 = 0x06;

/// Standard UDP port for KNXnet/IP communication
pub const KNXNETIP_DEFAULT_PORT: u16 = 3671;

/// Maximum size of a KNXnet/IP frame
pub const MAX_FRAME_SIZE: usize = 512;

/// Default KNXnet/IP routing multicast group, and the lowest multicast
/// address a routing endpoint may be configured with.
pub const ROUTING_MULTICAST_ADDR: [u8; 4] = [224, 0, 23, 12];

// =============================================================================
// Timing
// =============================================================================

/// Interval between connection-state requests (heartbeat), 60 s
pub const HEARTBEAT_INTERVAL_MS: u64 = 60_000;

/// Deadline for a connection-state response after a heartbeat, 10 s
pub const CONNECTIONSTATE_RESPONSE_TIMEOUT_MS: u64 = 10_000;

/// Deadline for a connect response, 10 s
pub const CONNECT_RESPONSE_TIMEOUT_MS: u64 = 10_000;

/// Deadline for a tunneling acknowledgment, 1 s
pub const TUNNELING_ACK_TIMEOUT_MS: u64 = 1_000;

/// Deadline for the confirmation of a tunneled request, 3 s
pub const CONFIRMATION_TIMEOUT_MS: u64 = 3_000;

// =============================================================================
// Service Type Identifiers
// =============================================================================

/// KNXnet/IP service type identifiers handled by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum ServiceType {
    // Core services (0x02xx)
    /// `CONNECT_REQUEST` - Connection request
    ConnectRequest = 0x0205,
    /// `CONNECT_RESPONSE` - Connection response
    ConnectResponse = 0x0206,
    /// `CONNECTIONSTATE_REQUEST` - Connection state request (heartbeat)
    ConnectionstateRequest = 0x0207,
    /// `CONNECTIONSTATE_RESPONSE` - Connection state response
    ConnectionstateResponse = 0x0208,
    /// `DISCONNECT_REQUEST` - Disconnect request
    DisconnectRequest = 0x0209,
    /// `DISCONNECT_RESPONSE` - Disconnect response
    DisconnectResponse = 0x020A,

    // Tunneling (0x04xx)
    /// `TUNNELLING_REQUEST` - Tunneling data request
    TunnelingRequest = 0x0420,
    /// `TUNNELLING_ACK` - Tunneling acknowledgment
    TunnelingAck = 0x0421,

    // Routing (0x05xx)
    /// `ROUTING_INDICATION` - Routing indication (multicast)
    RoutingIndication = 0x0530,
    /// `ROUTING_LOST_MESSAGE` - Routing lost message indication
    RoutingLostMessage = 0x0531,
    /// `ROUTING_BUSY` - Routing busy indication
    RoutingBusy = 0x0532,
}

impl ServiceType {
    /// Convert a u16 to `ServiceType`
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0205 => Some(Self::ConnectRequest),
            0x0206 => Some(Self::ConnectResponse),
            0x0207 => Some(Self::ConnectionstateRequest),
            0x0208 => Some(Self::ConnectionstateResponse),
            0x0209 => Some(Self::DisconnectRequest),
            0x020A => Some(Self::DisconnectResponse),
            0x0420 => Some(Self::TunnelingRequest),
            0x0421 => Some(Self::TunnelingAck),
            0x0530 => Some(Self::RoutingIndication),
            0x0531 => Some(Self::RoutingLostMessage),
            0x0532 => Some(Self::RoutingBusy),
            _ => None,
        }
    }

    /// Convert `ServiceType` to u16
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Connection Type Codes
// =============================================================================

/// Connection type for `TUNNEL_CONNECTION`
pub const TUNNEL_CONNECTION: u8 = 0x04;

/// Tunneling on link layer
pub const TUNNEL_LINK_LAYER: u8 = 0x02;

// =============================================================================
// Host Protocol Codes
// =============================================================================

/// IPv4 UDP protocol
pub const IPV4_UDP: u8 = 0x01;

// =============================================================================
// Error Codes
// =============================================================================

/// Error code for successful operation
pub const E_NO_ERROR: u8 = 0x00;

/// Error code for unknown or inactive communication channel
pub const E_CONNECTION_ID: u8 = 0x21;

/// Error code for connection type not supported
pub const E_CONNECTION_TYPE: u8 = 0x22;

/// Error code for connection option not supported
pub const E_CONNECTION_OPTION: u8 = 0x23;

/// Error code for no more connections available
pub const E_NO_MORE_CONNECTIONS: u8 = 0x24;

/// Error code for data connection error
pub const E_DATA_CONNECTION: u8 = 0x26;

/// Error code for KNX connection error
pub const E_KNX_CONNECTION: u8 = 0x27;

/// Error code for tunneling layer not supported
pub const E_TUNNELLING_LAYER: u8 = 0x29;

// =============================================================================
// KNX Priority
// =============================================================================

/// KNX message priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Priority {
    /// System priority
    System = 0b00,
    /// Normal priority (default)
    Normal = 0b01,
    /// Urgent priority
    Urgent = 0b10,
    /// Low priority
    Low = 0b11,
}

impl Priority {
    /// Priority from the two control-field bits
    pub const fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::System,
            0b01 => Self::Normal,
            0b10 => Self::Urgent,
            _ => Self::Low,
        }
    }

    /// The two control-field bits of this priority
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_round_trip() {
        for raw in [0x0205u16, 0x0208, 0x0420, 0x0530, 0x0531] {
            let st = ServiceType::from_u16(raw).unwrap();
            assert_eq!(st.to_u16(), raw);
        }
        assert_eq!(ServiceType::from_u16(0x0201), None);
        assert_eq!(ServiceType::from_u16(0xFFFF), None);
    }

    #[test]
    fn test_priority_bits() {
        assert_eq!(Priority::from_bits(0b00), Priority::System);
        assert_eq!(Priority::from_bits(0b11), Priority::Low);
        // Upper bits are masked off.
        assert_eq!(Priority::from_bits(0b110), Priority::Urgent);
        assert_eq!(Priority::Low.bits(), 0b11);
    }
}
