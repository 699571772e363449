//! L-Data link-layer frame parsing and construction.
//!
//! The L-Data frame layout follows the TP1 wire format in both its
//! standard and extended variants. Power-line frames reuse the TP1 layout
//! with a 2-byte domain address before the checksum; PL132 widens the
//! checksum to 16 bits.
//!
//! Standard frame:
//! `[ctrl][src:2][dst:2][addr/hop/len][tpdu: len+1]([domain:2])[fcs]`
//!
//! Extended frame (control bit 7 clear):
//! `[ctrl][ctrle][src:2][dst:2][len][tpdu: len+1]([domain:2])[fcs]`
//!
//! The length field counts TPDU octets minus one; the extended length
//! escape code 255 is reserved and rejected. A trailing checksum is
//! optional on decode (bus monitors may strip it) and always produced on
//! construction.

use heapless::Vec;

use crate::addressing::{Destination, GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::medium::{checksum_crc16, checksum_parity, KnxMedium};
use crate::protocol::Priority;

/// Control field: frame-type bits that must match for an L-Data frame.
const CTRL_LDATA_MASK: u8 = 0x53;
const CTRL_LDATA: u8 = 0x10;
/// Control field: set for standard frames, clear for extended.
const CTRL_STANDARD: u8 = 0x80;
/// Control field: clear when the frame is a repetition.
const CTRL_NOT_REPEATED: u8 = 0x20;

/// Shortest decodable L-Data frame (standard header + 1 TPDU octet).
const MIN_LENGTH: usize = 7;

/// Longest encoded frame: extended header, 255 TPDU octets, domain
/// address and 16-bit checksum.
const MAX_FRAME: usize = 7 + 255 + 2 + 2;

/// An L-Data frame on one of the supported media.
///
/// Decoding preserves the received checksum verbatim, so re-encoding a
/// decoded frame reproduces the original bytes. Frames built with
/// [`LData::new`] get their checksum computed from the frame octets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LData {
    medium: KnxMedium,
    extended: bool,
    repeated: bool,
    priority: Priority,
    hop_count: u8,
    // Low nibble of the extended control octet (0 for the standard
    // extended-frame format); preserved for re-encoding.
    ext_format: u8,
    source: IndividualAddress,
    destination: Destination,
    tpdu: Vec<u8, 255>,
    domain: Option<u16>,
    checksum: Option<u16>,
}

impl LData {
    /// Maximum TPDU length of a standard frame.
    pub const MAX_TPDU_STANDARD: usize = 16;
    /// Maximum TPDU length of an extended frame.
    pub const MAX_TPDU_EXTENDED: usize = 255;

    /// Build a new L-Data frame and compute its checksum.
    ///
    /// The frame format is chosen from the TPDU length: up to 16 octets
    /// fit a standard frame, longer TPDUs use the extended format.
    /// Power-line media require a domain address; on TP1 the `domain`
    /// argument is ignored.
    ///
    /// # Errors
    ///
    /// Returns an argument error if the TPDU is empty or longer than 255
    /// octets, if `hop_count` exceeds the 3-bit frame field, or if a
    /// power-line medium is given no domain address.
    pub fn new(
        medium: KnxMedium,
        source: IndividualAddress,
        destination: Destination,
        priority: Priority,
        hop_count: u8,
        tpdu: &[u8],
        domain: Option<u16>,
    ) -> Result<Self> {
        if tpdu.is_empty() || tpdu.len() > Self::MAX_TPDU_EXTENDED {
            return Err(KnxError::value_out_of_range());
        }
        if hop_count > 7 {
            return Err(KnxError::value_out_of_range());
        }
        let domain = if medium.is_power_line() {
            Some(domain.ok_or_else(KnxError::value_out_of_range)?)
        } else {
            None
        };

        let mut frame = Self {
            medium,
            extended: tpdu.len() > Self::MAX_TPDU_STANDARD,
            repeated: false,
            priority,
            hop_count,
            ext_format: 0,
            source,
            destination,
            tpdu: Vec::from_slice(tpdu).map_err(|_| KnxError::payload_too_large())?,
            domain,
            checksum: None,
        };

        // Checksum covers every frame octet before the checksum field.
        let mut scratch = [0u8; MAX_FRAME];
        let body_len = frame.encode(&mut scratch)?;
        frame.checksum = Some(match medium {
            KnxMedium::Pl132 => checksum_crc16(&scratch[..body_len]),
            _ => u16::from(checksum_parity(&scratch[..body_len])),
        });
        Ok(frame)
    }

    /// Decode an L-Data frame received on `medium`.
    ///
    /// # Errors
    ///
    /// Returns a format error if the buffer is shorter than a minimal
    /// frame, the control field is not an L-Data pattern, the extended
    /// length field carries the reserved escape code 255, or the buffer
    /// ends before the declared TPDU (plus domain address on power-line
    /// media).
    pub fn decode(medium: KnxMedium, buf: &[u8]) -> Result<Self> {
        if buf.len() < MIN_LENGTH {
            return Err(KnxError::buffer_too_short());
        }
        let ctrl = buf[0];
        if ctrl & CTRL_LDATA_MASK != CTRL_LDATA {
            return Err(KnxError::invalid_control_field());
        }
        let extended = ctrl & CTRL_STANDARD == 0;
        let repeated = ctrl & CTRL_NOT_REPEATED == 0;
        let priority = Priority::from_bits((ctrl >> 2) & 0x3);

        // Standard: [ctrl][src:2][dst:2][addr/hop/len]
        // Extended: [ctrl][ctrle][src:2][dst:2][len]
        let (addr_off, len_octet, header_len) = if extended {
            (2, buf[6], 7)
        } else {
            (1, buf[5], 6)
        };
        let source = IndividualAddress::decode(&buf[addr_off..])?;
        let dest_raw = u16::from_be_bytes([buf[addr_off + 2], buf[addr_off + 3]]);

        let (hop_count, group_dest, tpdu_len, ext_format) = if extended {
            let ctrle = buf[1];
            if len_octet == 255 {
                return Err(KnxError::unsupported_escape_code());
            }
            (
                (ctrle & 0x70) >> 4,
                ctrle & 0x80 != 0,
                usize::from(len_octet) + 1,
                ctrle & 0x0F,
            )
        } else {
            (
                (len_octet & 0x70) >> 4,
                len_octet & 0x80 != 0,
                usize::from(len_octet & 0x0F) + 1,
                0,
            )
        };
        let destination = if group_dest {
            Destination::Group(GroupAddress::from(dest_raw))
        } else {
            Destination::Individual(IndividualAddress::from(dest_raw))
        };

        let tpdu_end = header_len + tpdu_len;
        if buf.len() < tpdu_end {
            return Err(KnxError::buffer_too_short());
        }
        let tpdu =
            Vec::from_slice(&buf[header_len..tpdu_end]).map_err(|_| KnxError::payload_too_large())?;

        let mut rest = &buf[tpdu_end..];
        let domain = if medium.is_power_line() {
            if rest.len() < 2 {
                return Err(KnxError::buffer_too_short());
            }
            let d = u16::from_be_bytes([rest[0], rest[1]]);
            rest = &rest[2..];
            Some(d)
        } else {
            None
        };

        let checksum = match medium {
            KnxMedium::Pl132 => match rest.len() {
                0 => None,
                // Half of the 16-bit checksum is a truncated frame.
                1 => return Err(KnxError::buffer_too_short()),
                _ => Some(u16::from_be_bytes([rest[0], rest[1]])),
            },
            _ if !rest.is_empty() => Some(u16::from(rest[0])),
            _ => None,
        };

        Ok(Self {
            medium,
            extended,
            repeated,
            priority,
            hop_count,
            ext_format,
            source,
            destination,
            tpdu,
            domain,
            checksum,
        })
    }

    /// Encode the frame into `buf`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns a transport error if `buf` is too small for the frame.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let fcs_len = match (self.checksum, self.medium) {
            (None, _) => 0,
            (Some(_), KnxMedium::Pl132) => 2,
            (Some(_), _) => 1,
        };
        let header_len = if self.extended { 7 } else { 6 };
        let domain_len = if self.domain.is_some() { 2 } else { 0 };
        let total = header_len + self.tpdu.len() + domain_len + fcs_len;
        if buf.len() < total {
            return Err(KnxError::buffer_too_small());
        }

        let mut ctrl = CTRL_LDATA | (self.priority.bits() << 2);
        if !self.extended {
            ctrl |= CTRL_STANDARD;
        }
        if !self.repeated {
            ctrl |= CTRL_NOT_REPEATED;
        }
        buf[0] = ctrl;

        let group_bit = if self.destination.is_group() { 0x80 } else { 0 };
        let addr_off = if self.extended {
            buf[1] = group_bit | (self.hop_count << 4) | self.ext_format;
            // TPDU length is validated to 1..=255 at construction.
            buf[6] = (self.tpdu.len() - 1) as u8;
            2
        } else {
            buf[5] = group_bit | (self.hop_count << 4) | (self.tpdu.len() - 1) as u8;
            1
        };
        self.source.encode(&mut buf[addr_off..])?;
        buf[addr_off + 2..addr_off + 4].copy_from_slice(&self.destination.raw().to_be_bytes());

        let mut pos = header_len;
        buf[pos..pos + self.tpdu.len()].copy_from_slice(&self.tpdu);
        pos += self.tpdu.len();
        if let Some(domain) = self.domain {
            buf[pos..pos + 2].copy_from_slice(&domain.to_be_bytes());
            pos += 2;
        }
        if let Some(fcs) = self.checksum {
            if self.medium == KnxMedium::Pl132 {
                buf[pos..pos + 2].copy_from_slice(&fcs.to_be_bytes());
                pos += 2;
            } else {
                buf[pos] = fcs as u8;
                pos += 1;
            }
        }
        Ok(pos)
    }

    /// Medium this frame was built for or received on.
    pub const fn medium(&self) -> KnxMedium {
        self.medium
    }

    /// True for the extended frame format.
    pub const fn is_extended(&self) -> bool {
        self.extended
    }

    /// True if the frame is a repetition of an earlier transmission.
    pub const fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Frame priority.
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Routing hop count (3-bit frame field, 0-7).
    pub const fn hop_count(&self) -> u8 {
        self.hop_count
    }

    /// Source individual address.
    pub const fn source(&self) -> IndividualAddress {
        self.source
    }

    /// Destination address.
    pub const fn destination(&self) -> Destination {
        self.destination
    }

    /// Transport protocol data unit.
    pub fn tpdu(&self) -> &[u8] {
        &self.tpdu
    }

    /// Domain address (power-line media only).
    pub const fn domain(&self) -> Option<u16> {
        self.domain
    }

    /// Frame checksum as received or computed; `None` if the decoded
    /// buffer ended before the checksum field.
    pub const fn checksum(&self) -> Option<u16> {
        self.checksum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> IndividualAddress {
        IndividualAddress::new(1, 1, 10).unwrap()
    }

    fn group_dest() -> Destination {
        Destination::Group(GroupAddress::new(1, 2, 3).unwrap())
    }

    #[test]
    fn test_decode_too_short() {
        let err = LData::decode(KnxMedium::Tp1, &[0xBC; 6]).unwrap_err();
        assert!(matches!(&err, KnxError::Format(e) if e.is_buffer_too_short()));
        let err = LData::decode(KnxMedium::Tp1, &[0u8; 6]).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_decode_invalid_control_field() {
        // Bit 0x40 set breaks the L-Data pattern.
        let err = LData::decode(KnxMedium::Tp1, &[0x50, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(&err, KnxError::Format(e) if e.is_invalid_control_field()));
    }

    #[test]
    fn test_decode_standard_frame() {
        // ctrl 0xBC: standard, not repeated, priority low
        // src 1.1.10, dst group 1/2/3, hop 6, 1-octet TPDU, fcs
        let buf = [0xBC, 0x11, 0x0A, 0x0A, 0x03, 0xE0, 0x81, 0x55];
        let f = LData::decode(KnxMedium::Tp1, &buf).unwrap();
        assert!(!f.is_extended());
        assert!(!f.is_repeated());
        assert_eq!(f.priority(), Priority::Low);
        assert_eq!(f.hop_count(), 6);
        assert_eq!(f.source(), source());
        assert_eq!(f.destination(), group_dest());
        assert_eq!(f.tpdu(), &[0x81]);
        assert_eq!(f.checksum(), Some(0x55));
    }

    #[test]
    fn test_decode_extended_frame_ctrl_0x10() {
        // ctrl 0x10: bit 7 clear selects the extended format
        let buf = [0x10, 0x60, 0x11, 0x0A, 0x11, 0x0B, 0x00, 0x81, 0x42];
        let f = LData::decode(KnxMedium::Tp1, &buf).unwrap();
        assert!(f.is_extended());
        assert!(f.is_repeated());
        assert_eq!(f.hop_count(), 6);
        assert_eq!(
            f.destination(),
            Destination::Individual(IndividualAddress::new(1, 1, 11).unwrap())
        );
        assert_eq!(f.tpdu(), &[0x81]);
    }

    #[test]
    fn test_decode_extended_escape_code_rejected() {
        let buf = [0x10, 0x60, 0x11, 0x0A, 0x11, 0x0B, 0xFF, 0x81, 0x42];
        let err = LData::decode(KnxMedium::Tp1, &buf).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_decode_tpdu_truncated() {
        // Declared TPDU length 4 (field 3), only one octet present.
        let buf = [0xBC, 0x11, 0x0A, 0x0A, 0x03, 0x83, 0x81];
        let err = LData::decode(KnxMedium::Tp1, &buf).unwrap_err();
        assert!(matches!(&err, KnxError::Format(e) if e.is_buffer_too_short()));
    }

    #[test]
    fn test_new_rejects_bad_arguments() {
        assert!(LData::new(KnxMedium::Tp1, source(), group_dest(), Priority::Low, 8, &[0x80], None)
            .unwrap_err()
            .is_argument());
        assert!(LData::new(KnxMedium::Tp1, source(), group_dest(), Priority::Low, 6, &[], None)
            .unwrap_err()
            .is_argument());
        // Power-line frames need a domain address.
        assert!(
            LData::new(KnxMedium::Pl110, source(), group_dest(), Priority::Low, 6, &[0x80], None)
                .unwrap_err()
                .is_argument()
        );
    }

    #[test]
    fn test_round_trip_standard() {
        let f = LData::new(
            KnxMedium::Tp1,
            source(),
            group_dest(),
            Priority::Normal,
            6,
            &[0x00, 0x81],
            None,
        )
        .unwrap();
        assert!(!f.is_extended());
        let mut buf = [0u8; 32];
        let n = f.encode(&mut buf).unwrap();
        assert_eq!(LData::decode(KnxMedium::Tp1, &buf[..n]).unwrap(), f);
    }

    #[test]
    fn test_round_trip_extended() {
        let tpdu = [0xAB; 40];
        let f = LData::new(
            KnxMedium::Tp1,
            source(),
            group_dest(),
            Priority::Low,
            5,
            &tpdu,
            None,
        )
        .unwrap();
        assert!(f.is_extended());
        let mut buf = [0u8; 64];
        let n = f.encode(&mut buf).unwrap();
        let decoded = LData::decode(KnxMedium::Tp1, &buf[..n]).unwrap();
        assert_eq!(decoded, f);
        // Decoded bytes re-encode to the identical buffer.
        let mut buf2 = [0u8; 64];
        let n2 = decoded.encode(&mut buf2).unwrap();
        assert_eq!(&buf[..n], &buf2[..n2]);
    }

    #[test]
    fn test_round_trip_pl110_with_domain() {
        let f = LData::new(
            KnxMedium::Pl110,
            source(),
            group_dest(),
            Priority::Urgent,
            6,
            &[0x00, 0x80, 0x01],
            Some(0x1234),
        )
        .unwrap();
        assert_eq!(f.domain(), Some(0x1234));
        let mut buf = [0u8; 32];
        let n = f.encode(&mut buf).unwrap();
        let decoded = LData::decode(KnxMedium::Pl110, &buf[..n]).unwrap();
        assert_eq!(decoded, f);
    }

    #[test]
    fn test_round_trip_pl132_wide_checksum() {
        let f = LData::new(
            KnxMedium::Pl132,
            source(),
            group_dest(),
            Priority::System,
            6,
            &[0x00, 0x80],
            Some(0x00A5),
        )
        .unwrap();
        let fcs = f.checksum().unwrap();
        let mut buf = [0u8; 32];
        let n = f.encode(&mut buf).unwrap();
        // 16-bit checksum occupies the last two octets.
        assert_eq!(u16::from_be_bytes([buf[n - 2], buf[n - 1]]), fcs);
        assert_eq!(LData::decode(KnxMedium::Pl132, &buf[..n]).unwrap(), f);

        // Only half the checksum present: rejected, not silently dropped.
        let err = LData::decode(KnxMedium::Pl132, &buf[..n - 1]).unwrap_err();
        assert!(matches!(&err, KnxError::Format(e) if e.is_buffer_too_short()));
        // Missing entirely is still fine (monitor hand-off without fcs).
        let short = LData::decode(KnxMedium::Pl132, &buf[..n - 2]).unwrap();
        assert_eq!(short.checksum(), None);
    }

    #[test]
    fn test_decode_without_checksum() {
        // A monitor may hand over the frame without its trailing fcs.
        let buf = [0xBC, 0x11, 0x0A, 0x0A, 0x03, 0xE0, 0x81];
        let f = LData::decode(KnxMedium::Tp1, &buf).unwrap();
        assert_eq!(f.checksum(), None);
        let mut out = [0u8; 16];
        let n = f.encode(&mut out).unwrap();
        assert_eq!(&out[..n], &buf);
    }
}
