//! KNXnet/IP frame parsing and encoding.
//!
//! Zero-copy parsing and building of the common KNXnet/IP frame structure.
//! All frames share a 6-byte header followed by a service-specific body:
//!
//! ```text
//! ┌─────────────────────────────┐
//! │  Header (6 bytes)           │
//! │  - Header Length: 0x06      │
//! │  - Protocol Version: 0x10   │
//! │  - Service Type: 2 bytes    │
//! │  - Total Length: 2 bytes    │
//! ├─────────────────────────────┤
//! │  Body (variable)            │
//! │  - Service-specific data    │
//! └─────────────────────────────┘
//! ```

use crate::error::{KnxError, Result};
use crate::protocol::constants::{
    ServiceType, HEADER_SIZE_10, KNXNETIP_VERSION_10, MAX_FRAME_SIZE,
};

/// KNXnet/IP frame header (6 bytes)
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KnxnetIpHeader {
    /// Header length (always 0x06)
    pub header_length: u8,
    /// Protocol version (always 0x10 for v1.0)
    pub protocol_version: u8,
    /// Service type identifier
    pub service_type: ServiceType,
    /// Total length of frame (header + body)
    pub total_length: u16,
}

impl KnxnetIpHeader {
    /// Size of the header in bytes
    pub const SIZE: usize = 6;

    /// Create a new header
    pub const fn new(service_type: ServiceType, body_length: u16) -> Self {
        Self {
            header_length: HEADER_SIZE_10,
            protocol_version: KNXNETIP_VERSION_10,
            service_type,
            total_length: Self::SIZE as u16 + body_length,
        }
    }

    /// Parse a header from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too small, the header length or
    /// protocol version is wrong, or the service type is unknown.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(KnxError::buffer_too_short());
        }
        let header_length = data[0];
        let protocol_version = data[1];
        let service_type_raw = u16::from_be_bytes([data[2], data[3]]);
        let total_length = u16::from_be_bytes([data[4], data[5]]);

        if header_length != HEADER_SIZE_10 {
            return Err(KnxError::invalid_frame());
        }
        if protocol_version != KNXNETIP_VERSION_10 {
            return Err(KnxError::unsupported_version());
        }
        let service_type =
            ServiceType::from_u16(service_type_raw).ok_or_else(KnxError::unsupported_service_type)?;

        Ok(Self {
            header_length,
            protocol_version,
            service_type,
            total_length,
        })
    }

    /// Encode the header into a byte buffer
    ///
    /// # Errors
    ///
    /// Returns a transport error if the buffer is too small.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::SIZE {
            return Err(KnxError::buffer_too_small());
        }
        buf[0] = self.header_length;
        buf[1] = self.protocol_version;
        buf[2..4].copy_from_slice(&self.service_type.to_u16().to_be_bytes());
        buf[4..6].copy_from_slice(&self.total_length.to_be_bytes());
        Ok(Self::SIZE)
    }

    /// Get the expected body length from the header
    pub const fn body_length(&self) -> u16 {
        self.total_length.saturating_sub(Self::SIZE as u16)
    }
}

/// Zero-copy view of a KNXnet/IP frame
///
/// References the underlying receive buffer directly; no bytes are copied.
#[derive(Debug)]
pub struct KnxnetIpFrame<'a> {
    data: &'a [u8],
    header: KnxnetIpHeader,
}

impl<'a> KnxnetIpFrame<'a> {
    /// Parse a KNXnet/IP frame from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid or the buffer ends before
    /// the declared total length.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = KnxnetIpHeader::parse(data)?;
        if data.len() < header.total_length as usize
            || (header.total_length as usize) < KnxnetIpHeader::SIZE
        {
            return Err(KnxError::invalid_frame());
        }
        Ok(Self { data, header })
    }

    /// Get the frame header
    pub const fn header(&self) -> &KnxnetIpHeader {
        &self.header
    }

    /// Get the service type
    pub const fn service_type(&self) -> ServiceType {
        self.header.service_type
    }

    /// Get the frame body (payload after the header)
    pub fn body(&self) -> &'a [u8] {
        // Range validated in parse().
        &self.data[KnxnetIpHeader::SIZE..self.header.total_length as usize]
    }

    /// Get the complete frame bytes including the header
    pub fn data(&self) -> &'a [u8] {
        &self.data[..self.header.total_length as usize]
    }
}

/// Builder for creating KNXnet/IP frames around a prepared body.
#[derive(Debug)]
pub struct FrameBuilder<'a> {
    service_type: ServiceType,
    body: &'a [u8],
}

impl<'a> FrameBuilder<'a> {
    /// Create a new frame builder
    pub const fn new(service_type: ServiceType, body: &'a [u8]) -> Self {
        Self { service_type, body }
    }

    /// Build the frame into a buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the body exceeds the maximum frame size or the
    /// buffer is too small.
    pub fn build(&self, buf: &mut [u8]) -> Result<usize> {
        let total_size = KnxnetIpHeader::SIZE + self.body.len();
        if total_size > MAX_FRAME_SIZE {
            return Err(KnxError::payload_too_large());
        }
        if buf.len() < total_size {
            return Err(KnxError::buffer_too_small());
        }
        let header = KnxnetIpHeader::new(self.service_type, self.body.len() as u16);
        header.encode(buf)?;
        buf[KnxnetIpHeader::SIZE..total_size].copy_from_slice(self.body);
        Ok(total_size)
    }

    /// Total frame size the builder will produce
    pub const fn size(&self) -> usize {
        KnxnetIpHeader::SIZE + self.body.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parse() {
        let data = [0x06, 0x10, 0x04, 0x20, 0x00, 0x0E];
        let header = KnxnetIpHeader::parse(&data).unwrap();
        assert_eq!(header.service_type, ServiceType::TunnelingRequest);
        assert_eq!(header.total_length, 14);
        assert_eq!(header.body_length(), 8);
    }

    #[test]
    fn test_header_parse_errors() {
        assert!(KnxnetIpHeader::parse(&[0x06, 0x10, 0x04]).is_err());
        // Wrong header length
        assert!(KnxnetIpHeader::parse(&[0x05, 0x10, 0x04, 0x20, 0x00, 0x0E]).is_err());
        // Wrong protocol version
        assert!(KnxnetIpHeader::parse(&[0x06, 0x20, 0x04, 0x20, 0x00, 0x0E]).is_err());
        // Unknown service type
        assert!(KnxnetIpHeader::parse(&[0x06, 0x10, 0xFF, 0xFF, 0x00, 0x0E]).is_err());
    }

    #[test]
    fn test_frame_parse_and_body() {
        let data = [
            0x06, 0x10, 0x05, 0x30, 0x00, 0x0A, // ROUTING_INDICATION, length 10
            0x01, 0x02, 0x03, 0x04,
        ];
        let frame = KnxnetIpFrame::parse(&data).unwrap();
        assert_eq!(frame.service_type(), ServiceType::RoutingIndication);
        assert_eq!(frame.body(), &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(frame.data(), &data);
    }

    #[test]
    fn test_frame_parse_truncated() {
        // Header declares 10 bytes total, only 8 present.
        let data = [0x06, 0x10, 0x05, 0x30, 0x00, 0x0A, 0x01, 0x02];
        assert!(KnxnetIpFrame::parse(&data).is_err());
    }

    #[test]
    fn test_frame_builder_round_trip() {
        let body = [0xAA, 0xBB, 0xCC];
        let builder = FrameBuilder::new(ServiceType::RoutingIndication, &body);
        let mut buf = [0u8; 32];
        let n = builder.build(&mut buf).unwrap();
        assert_eq!(n, builder.size());
        let frame = KnxnetIpFrame::parse(&buf[..n]).unwrap();
        assert_eq!(frame.service_type(), ServiceType::RoutingIndication);
        assert_eq!(frame.body(), &body);
    }
}
