//! Network types for KNXnet/IP communication.
//!
//! Lightweight IP value types for a `no_std` environment, plus the
//! [`transport::AsyncTransport`] boundary the async connection driver
//! talks through.

pub mod mock_transport;
pub mod transport;

use core::fmt;

use crate::error::KnxError;

/// IPv4 address representation.
///
/// A lightweight wrapper around a 4-byte array with ergonomic
/// conversions from arrays, tuples and `u32`.
///
/// # Examples
///
/// ```
/// use knx_link::net::Ipv4Addr;
///
/// let addr = Ipv4Addr::new(192, 168, 1, 10);
/// assert_eq!(addr.octets(), [192, 168, 1, 10]);
/// assert_eq!(Ipv4Addr::from((192, 168, 1, 10)), addr);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ipv4Addr {
    octets: [u8; 4],
}

impl Ipv4Addr {
    /// Unspecified address (0.0.0.0), used for NAT mode endpoints.
    pub const UNSPECIFIED: Self = Self::new(0, 0, 0, 0);

    /// Localhost (127.0.0.1).
    pub const LOCALHOST: Self = Self::new(127, 0, 0, 1);

    /// Create a new IPv4 address from individual octets.
    #[inline]
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self {
            octets: [a, b, c, d],
        }
    }

    /// Returns the four octets that make up this address.
    #[inline]
    pub const fn octets(&self) -> [u8; 4] {
        self.octets
    }

    /// True for multicast addresses (224.0.0.0/4).
    #[inline]
    pub const fn is_multicast(&self) -> bool {
        self.octets[0] >= 224 && self.octets[0] <= 239
    }
}

impl From<[u8; 4]> for Ipv4Addr {
    #[inline]
    fn from(octets: [u8; 4]) -> Self {
        Self { octets }
    }
}

impl From<(u8, u8, u8, u8)> for Ipv4Addr {
    #[inline]
    fn from((a, b, c, d): (u8, u8, u8, u8)) -> Self {
        Self::new(a, b, c, d)
    }
}

impl From<Ipv4Addr> for [u8; 4] {
    #[inline]
    fn from(addr: Ipv4Addr) -> [u8; 4] {
        addr.octets
    }
}

impl From<u32> for Ipv4Addr {
    #[inline]
    fn from(ip: u32) -> Self {
        Self {
            octets: ip.to_be_bytes(),
        }
    }
}

impl From<Ipv4Addr> for u32 {
    #[inline]
    fn from(addr: Ipv4Addr) -> u32 {
        u32::from_be_bytes(addr.octets)
    }
}

impl fmt::Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.octets[0], self.octets[1], self.octets[2], self.octets[3]
        )
    }
}

impl core::str::FromStr for Ipv4Addr {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let mut octets = [0u8; 4];

        for octet in &mut octets {
            let part = parts.next().ok_or_else(KnxError::value_out_of_range)?;
            *octet = part.parse().map_err(|_| KnxError::value_out_of_range())?;
        }
        if parts.next().is_some() {
            return Err(KnxError::value_out_of_range());
        }
        Ok(Self { octets })
    }
}

/// An IPv4 endpoint: address and UDP port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IpEndpoint {
    /// IPv4 address
    pub addr: Ipv4Addr,
    /// UDP port
    pub port: u16,
}

impl IpEndpoint {
    /// Create a new endpoint.
    #[inline]
    pub const fn new(addr: Ipv4Addr, port: u16) -> Self {
        Self { addr, port }
    }
}

impl fmt::Display for IpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octets_and_conversions() {
        let addr = Ipv4Addr::new(192, 168, 1, 10);
        assert_eq!(addr.octets(), [192, 168, 1, 10]);
        assert_eq!(Ipv4Addr::from([192, 168, 1, 10]), addr);
        assert_eq!(Ipv4Addr::from(0xC0A8_010A), addr);
        assert_eq!(u32::from(addr), 0xC0A8_010A);
    }

    #[test]
    fn test_display() {
        let ep = IpEndpoint::new(Ipv4Addr::new(192, 168, 1, 10), 3671);
        assert_eq!(format!("{}", ep), "192.168.1.10:3671");
    }

    #[test]
    fn test_from_str() {
        let addr: Ipv4Addr = "224.0.23.12".parse().unwrap();
        assert_eq!(addr.octets(), [224, 0, 23, 12]);
        assert!("192.168.1".parse::<Ipv4Addr>().is_err());
        assert!("192.168.1.256".parse::<Ipv4Addr>().is_err());
        assert!("192.168.1.10.5".parse::<Ipv4Addr>().is_err());
    }

    #[test]
    fn test_is_multicast() {
        assert!(Ipv4Addr::new(224, 0, 23, 12).is_multicast());
        assert!(Ipv4Addr::new(239, 255, 255, 255).is_multicast());
        assert!(!Ipv4Addr::new(192, 168, 1, 10).is_multicast());
    }

    #[test]
    fn test_constants() {
        assert_eq!(Ipv4Addr::UNSPECIFIED.octets(), [0, 0, 0, 0]);
        assert_eq!(Ipv4Addr::LOCALHOST.octets(), [127, 0, 0, 1]);
    }
}
