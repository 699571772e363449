//! Raw acknowledgment frames per medium.
//!
//! TP1 and PL110 acknowledge with a single direct-code octet; anything
//! that is not a recognized code and not an L-Data request control field
//! is treated as NAK (transmission conditions on these media corrupt ack
//! octets regularly, and a spurious NAK only costs a repetition).
//!
//! PL132 acknowledges by echoing the checksum of the associated request:
//! the received FCS equal to the request checksum is a positive ack, its
//! bitwise complement signals a full reception buffer, and any other
//! value cannot be classified.

use crate::error::{KnxError, Result};
use crate::medium::KnxMedium;

/// Direct acknowledge code (TP1 and PL110).
const CODE_ACK: u8 = 0xCC;
/// Direct negative-acknowledge code (TP1 and PL110).
const CODE_NAK: u8 = 0x0C;

/// Kind of acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckType {
    /// Positive acknowledgment
    Ack,
    /// Negative acknowledgment
    Nak,
    /// Negative acknowledgment, reception buffer full (PL132 only)
    Full,
    /// Not classifiable (PL132 without a reference checksum, or an
    /// unrecognized echoed checksum)
    Unknown,
}

/// A raw acknowledgment frame received on one of the supported media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawAck {
    medium: KnxMedium,
    kind: AckType,
    checksum: Option<u16>,
}

impl RawAck {
    /// Build a direct-code acknowledgment for TP1 or PL110.
    ///
    /// # Errors
    ///
    /// Returns an argument error for PL132 (its acks carry a checksum,
    /// not a code) or for a kind the medium cannot express.
    pub fn direct(medium: KnxMedium, kind: AckType) -> Result<Self> {
        if medium == KnxMedium::Pl132 || !matches!(kind, AckType::Ack | AckType::Nak) {
            return Err(KnxError::value_out_of_range());
        }
        Ok(Self {
            medium,
            kind,
            checksum: None,
        })
    }

    /// Build a PL132 acknowledgment echoing `checksum`.
    pub const fn pl132(checksum: u16) -> Self {
        Self {
            medium: KnxMedium::Pl132,
            kind: AckType::Unknown,
            checksum: Some(checksum),
        }
    }

    /// Decode an acknowledgment frame received on `medium`.
    ///
    /// PL132 acks decoded without a reference checksum are always
    /// [`AckType::Unknown`]; use [`RawAck::decode_with_checksum`] when the
    /// checksum of the associated request is known.
    ///
    /// # Errors
    ///
    /// Returns a format error if the buffer is empty (or shorter than the
    /// 16-bit PL132 checksum), or if a direct-code octet matches the
    /// L-Data request control pattern of its medium.
    pub fn decode(medium: KnxMedium, buf: &[u8]) -> Result<Self> {
        match medium {
            KnxMedium::Tp1 | KnxMedium::Pl110 => {
                let code = *buf.first().ok_or_else(KnxError::buffer_too_short)?;
                let kind = match code {
                    CODE_ACK => AckType::Ack,
                    CODE_NAK => AckType::Nak,
                    // An L-Data request control field is not an ack at all.
                    c if medium == KnxMedium::Tp1 && c & 0x53 == 0x10 => {
                        return Err(KnxError::not_an_ack())
                    }
                    c if medium == KnxMedium::Pl110 && c & 0xD3 == 0x90 => {
                        return Err(KnxError::not_an_ack())
                    }
                    _ => AckType::Nak,
                };
                Ok(Self {
                    medium,
                    kind,
                    checksum: None,
                })
            }
            KnxMedium::Pl132 => {
                if buf.len() < 2 {
                    return Err(KnxError::buffer_too_short());
                }
                Ok(Self::pl132(u16::from_be_bytes([buf[0], buf[1]])))
            }
        }
    }

    /// Decode an acknowledgment and classify it against the checksum of
    /// the associated request.
    ///
    /// Only PL132 acks carry a checksum; for the direct-code media this is
    /// equivalent to [`RawAck::decode`].
    pub fn decode_with_checksum(
        medium: KnxMedium,
        buf: &[u8],
        request_checksum: u16,
    ) -> Result<Self> {
        let mut ack = Self::decode(medium, buf)?;
        if let Some(fcs) = ack.checksum {
            ack.kind = if fcs == request_checksum {
                AckType::Ack
            } else if !fcs == request_checksum {
                AckType::Full
            } else {
                AckType::Unknown
            };
        }
        Ok(ack)
    }

    /// Encode the acknowledgment into `buf`, returning the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the buffer is too small.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        match self.medium {
            KnxMedium::Tp1 | KnxMedium::Pl110 => {
                if buf.is_empty() {
                    return Err(KnxError::buffer_too_small());
                }
                buf[0] = match self.kind {
                    AckType::Ack => CODE_ACK,
                    _ => CODE_NAK,
                };
                Ok(1)
            }
            KnxMedium::Pl132 => {
                if buf.len() < 2 {
                    return Err(KnxError::buffer_too_small());
                }
                // Constructed via pl132() or decode(), checksum is present.
                let fcs = self.checksum.ok_or_else(KnxError::value_out_of_range)?;
                buf[0..2].copy_from_slice(&fcs.to_be_bytes());
                Ok(2)
            }
        }
    }

    /// Medium the ack was received on.
    pub const fn medium(&self) -> KnxMedium {
        self.medium
    }

    /// Kind of acknowledgment.
    pub const fn ack_type(&self) -> AckType {
        self.kind
    }

    /// Checksum echoed by a PL132 ack; `None` on the direct-code media.
    pub const fn checksum(&self) -> Option<u16> {
        self.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_codes() {
        let ack = RawAck::decode(KnxMedium::Tp1, &[0xCC]).unwrap();
        assert_eq!(ack.ack_type(), AckType::Ack);
        let nak = RawAck::decode(KnxMedium::Tp1, &[0x0C]).unwrap();
        assert_eq!(nak.ack_type(), AckType::Nak);
    }

    #[test]
    fn test_empty_buffer() {
        let err = RawAck::decode(KnxMedium::Tp1, &[]).unwrap_err();
        assert!(matches!(&err, KnxError::Format(e) if e.is_buffer_too_short()));
    }

    #[test]
    fn test_tp1_request_pattern_rejected() {
        // 0x10 matches the TP1 L-Data control pattern.
        let err = RawAck::decode(KnxMedium::Tp1, &[0x10]).unwrap_err();
        assert!(matches!(&err, KnxError::Format(e) if e.is_not_an_ack()));
        assert!(RawAck::decode(KnxMedium::Tp1, &[0xBC]).is_err());
    }

    #[test]
    fn test_pl110_request_pattern_rejected() {
        let err = RawAck::decode(KnxMedium::Pl110, &[0x90]).unwrap_err();
        assert!(matches!(&err, KnxError::Format(e) if e.is_not_an_ack()));
        // 0x90 | repeat/priority bits still matches the filter.
        assert!(RawAck::decode(KnxMedium::Pl110, &[0xBC]).is_err());
    }

    #[test]
    fn test_unrecognized_code_is_nak() {
        let ack = RawAck::decode(KnxMedium::Pl110, &[0x55]).unwrap();
        assert_eq!(ack.ack_type(), AckType::Nak);
        let ack = RawAck::decode(KnxMedium::Tp1, &[0xC0]).unwrap();
        assert_eq!(ack.ack_type(), AckType::Nak);
    }

    #[test]
    fn test_pl132_without_reference_is_unknown() {
        let ack = RawAck::decode(KnxMedium::Pl132, &[0x12, 0x34]).unwrap();
        assert_eq!(ack.ack_type(), AckType::Unknown);
        assert_eq!(ack.checksum(), Some(0x1234));
    }

    #[test]
    fn test_pl132_classification() {
        // Echoed checksum equals the request checksum: positive ack.
        let ack = RawAck::decode_with_checksum(KnxMedium::Pl132, &[0x12, 0x34], 0x1234).unwrap();
        assert_eq!(ack.ack_type(), AckType::Ack);
        // Bitwise complement: reception buffer full.
        let ack = RawAck::decode_with_checksum(KnxMedium::Pl132, &[0xED, 0xCB], 0x1234).unwrap();
        assert_eq!(ack.ack_type(), AckType::Full);
        // Anything else cannot be classified.
        let ack = RawAck::decode_with_checksum(KnxMedium::Pl132, &[0x00, 0x00], 0x1234).unwrap();
        assert_eq!(ack.ack_type(), AckType::Unknown);
    }

    #[test]
    fn test_pl132_short_buffer() {
        assert!(RawAck::decode(KnxMedium::Pl132, &[0x12]).is_err());
    }

    #[test]
    fn test_direct_constructor_validation() {
        assert!(RawAck::direct(KnxMedium::Tp1, AckType::Ack).is_ok());
        assert!(RawAck::direct(KnxMedium::Tp1, AckType::Full).is_err());
        assert!(RawAck::direct(KnxMedium::Pl132, AckType::Ack).is_err());
    }

    #[test]
    fn test_encode() {
        let mut buf = [0u8; 2];
        let ack = RawAck::direct(KnxMedium::Pl110, AckType::Ack).unwrap();
        assert_eq!(ack.encode(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0xCC);

        let ack = RawAck::pl132(0x1234);
        assert_eq!(ack.encode(&mut buf).unwrap(), 2);
        assert_eq!(buf, [0x12, 0x34]);
    }
}
