//! Link-layer frame formats per KNX communication medium.
//!
//! KNX runs over several physical media; this module covers the raw
//! link-layer frames of the media carried by KNXnet/IP busmonitor and
//! routing services:
//!
//! - TP1 twisted-pair (standard and extended L-Data frames)
//! - PL110 power-line (110 kHz)
//! - PL132 power-line (132 kHz, 16-bit frame checksum)
//!
//! [`LData`] is the L-Data frame itself, [`RawFrame`] the discriminated
//! frame union produced by decoding, and [`RawAck`] the per-medium
//! acknowledgment frame. All codecs work on caller-provided byte slices.

mod ack;
mod ldata;

pub use ack::{AckType, RawAck};
pub use ldata::LData;

use crate::error::Result;

/// KNX communication medium a raw frame was observed on.
///
/// The medium selects the frame layout and checksum width; it is not
/// encoded in the frame bytes themselves and must be supplied by the
/// caller (it is known from the interface the bytes came from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KnxMedium {
    /// Twisted-pair 9600 baud, 8-bit frame checksum.
    Tp1,
    /// Power-line 110 kHz, 8-bit frame checksum, 2-byte domain address.
    Pl110,
    /// Power-line 132 kHz, 16-bit frame checksum, 2-byte domain address.
    Pl132,
}

impl KnxMedium {
    /// True for the power-line media, which carry a domain address.
    pub const fn is_power_line(self) -> bool {
        matches!(self, KnxMedium::Pl110 | KnxMedium::Pl132)
    }
}

/// A decoded raw link-layer frame.
///
/// Currently only L-Data frames are represented; the enum leaves room for
/// busmonitor poll-data frames without breaking the decode API.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RawFrame {
    /// Link-layer data frame.
    LData(LData),
}

impl RawFrame {
    /// Decode a raw frame received on `medium`.
    ///
    /// # Errors
    ///
    /// Returns a format error if the buffer is too short or carries an
    /// invalid control field.
    pub fn decode(medium: KnxMedium, buf: &[u8]) -> Result<Self> {
        Ok(RawFrame::LData(LData::decode(medium, buf)?))
    }

    /// Encode the frame into `buf`, returning the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        match self {
            RawFrame::LData(f) => f.encode(buf),
        }
    }
}

/// 8-bit frame checksum used on TP1 and PL110: odd horizontal parity,
/// the bitwise complement of the XOR over all frame octets.
pub(crate) fn checksum_parity(data: &[u8]) -> u8 {
    let mut x = 0u8;
    for b in data {
        x ^= b;
    }
    !x
}

/// 16-bit frame checksum used on PL132 (CRC-16/CCITT, poly 0x1021,
/// initial value 0xFFFF).
pub(crate) fn checksum_crc16(data: &[u8]) -> u16 {
    let mut crc = 0xFFFFu16;
    for b in data {
        crc ^= u16::from(*b) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parity_checksum() {
        // Complement of XOR: all zeros xor to 0, complement is 0xFF.
        assert_eq!(checksum_parity(&[0x00, 0x00]), 0xFF);
        assert_eq!(checksum_parity(&[0xFF]), 0x00);
        assert_eq!(checksum_parity(&[0x12, 0x34]), !(0x12 ^ 0x34));
    }

    #[test]
    fn test_crc16_known_vector() {
        // CRC-16/CCITT-FALSE check value for "123456789".
        assert_eq!(checksum_crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn test_medium_power_line() {
        assert!(!KnxMedium::Tp1.is_power_line());
        assert!(KnxMedium::Pl110.is_power_line());
        assert!(KnxMedium::Pl132.is_power_line());
    }
}
