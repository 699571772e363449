//! KNX Individual Address implementation.
//!
//! Individual addresses identify a single device on the bus, written as
//! Area.Line.Device (e.g. `1.1.10`). Internally stored as 16 bits:
//! - Area: 4 bits (0-15)
//! - Line: 4 bits (0-15)
//! - Device: 8 bits (0-255)

use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Individual (physical) Address.
///
/// # Examples
///
/// ```
/// use knx_link::IndividualAddress;
///
/// let addr = IndividualAddress::new(1, 1, 10).unwrap();
/// assert_eq!(addr.to_string(), "1.1.10");
///
/// let addr: IndividualAddress = "15.15.255".parse().unwrap();
/// assert_eq!(u16::from(addr), 0xFFFF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndividualAddress {
    raw: u16,
}

impl IndividualAddress {
    /// Maximum area value (4 bits)
    pub const MAX_AREA: u8 = 15;
    /// Maximum line value (4 bits)
    pub const MAX_LINE: u8 = 15;

    /// Create a new Individual Address from its components.
    ///
    /// # Errors
    ///
    /// Returns an addressing error if `area` or `line` exceed 4 bits.
    /// `device` is a `u8`, so it is always in range.
    pub fn new(area: u8, line: u8, device: u8) -> Result<Self> {
        if area > Self::MAX_AREA || line > Self::MAX_LINE {
            return Err(KnxError::address_out_of_range());
        }
        let raw = (u16::from(area) << 12) | (u16::from(line) << 8) | u16::from(device);
        Ok(Self { raw })
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Get the area component (0-15).
    #[inline(always)]
    pub const fn area(self) -> u8 {
        ((self.raw >> 12) & 0x0F) as u8
    }

    /// Get the line component (0-15).
    #[inline(always)]
    pub const fn line(self) -> u8 {
        ((self.raw >> 8) & 0x0F) as u8
    }

    /// Get the device component (0-255).
    #[inline(always)]
    pub const fn device(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Encode the address into a byte buffer (big-endian, 2 bytes).
    ///
    /// # Errors
    ///
    /// Returns a transport error if the buffer is smaller than 2 bytes.
    #[inline]
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_small());
        }
        buf[0..2].copy_from_slice(&self.raw.to_be_bytes());
        Ok(2)
    }

    /// Decode an address from a byte buffer (big-endian, 2 bytes).
    ///
    /// # Errors
    ///
    /// Returns a format error if the buffer is smaller than 2 bytes.
    #[inline]
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 2 {
            return Err(KnxError::buffer_too_short());
        }
        let raw = u16::from_be_bytes([buf[0], buf[1]]);
        Ok(Self { raw })
    }
}

impl From<u16> for IndividualAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<IndividualAddress> for u16 {
    #[inline(always)]
    fn from(addr: IndividualAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for IndividualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.area(), self.line(), self.device())
    }
}

impl core::str::FromStr for IndividualAddress {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('.');

        let area = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(KnxError::invalid_individual_address)?;
        let line = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(KnxError::invalid_individual_address)?;
        let device = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(KnxError::invalid_individual_address)?;

        if parts.next().is_some() {
            return Err(KnxError::invalid_individual_address());
        }

        Self::new(area, line, device).map_err(|_| KnxError::invalid_individual_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let addr = IndividualAddress::new(1, 1, 10).unwrap();
        assert_eq!(addr.area(), 1);
        assert_eq!(addr.line(), 1);
        assert_eq!(addr.device(), 10);
        assert_eq!(addr.raw(), 0x110A);
    }

    #[test]
    fn test_new_out_of_range() {
        assert!(IndividualAddress::new(16, 0, 0).is_err());
        assert!(IndividualAddress::new(0, 16, 0).is_err());
    }

    #[test]
    fn test_encode_decode() {
        let addr = IndividualAddress::new(15, 15, 255).unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(addr.encode(&mut buf).unwrap(), 2);
        assert_eq!(buf, [0xFF, 0xFF]);
        assert_eq!(IndividualAddress::decode(&buf).unwrap(), addr);
    }

    #[test]
    fn test_decode_too_short() {
        let err = IndividualAddress::decode(&[0x11]).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_display_and_parse() {
        let addr = IndividualAddress::new(2, 3, 4).unwrap();
        assert_eq!(format!("{}", addr), "2.3.4");
        assert_eq!("2.3.4".parse::<IndividualAddress>().unwrap(), addr);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("1.1".parse::<IndividualAddress>().is_err());
        assert!("1.1.1.1".parse::<IndividualAddress>().is_err());
        assert!("16.0.0".parse::<IndividualAddress>().is_err());
        assert!("a.b.c".parse::<IndividualAddress>().is_err());
    }

    #[test]
    fn test_ordering_by_raw_value() {
        let low = IndividualAddress::new(1, 0, 0).unwrap();
        let high = IndividualAddress::new(1, 0, 1).unwrap();
        assert!(low < high);
    }
}
