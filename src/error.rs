//! Error types for KNX link and KNXnet/IP operations.
//!
//! This module provides structured error types with backtraces (when std is
//! enabled) and helper methods for error information. Every failure in this
//! crate is scoped to one frame, one operation or one connection; nothing is
//! fatal to the process.

use core::fmt;

#[cfg(feature = "std")]
use std::backtrace::Backtrace;

/// Result type alias for KNX operations.
pub type Result<T> = core::result::Result<T, KnxError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Format error variants (internal): malformed inbound bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum FormatErrorKind {
    BufferTooShort,
    InvalidFrame,
    InvalidControlField,
    UnsupportedEscapeCode,
    UnsupportedVersion,
    UnsupportedServiceType,
    NotAnAck,
    PayloadTooLarge,
}

/// Argument error variants (internal): caller-supplied value outside the
/// protocol-defined range, raised at construction/assignment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ArgumentErrorKind {
    ValueOutOfRange,
    InvalidMulticastGroup,
}

/// Connection error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum ConnectionErrorKind {
    Closed,
    Refused,
    Timeout,
    Busy,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum TransportErrorKind {
    SendFailed,
    ReceiveFailed,
    BufferTooSmall,
    SocketError,
}

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AddressingErrorKind {
    InvalidIndividualAddress,
    InvalidGroupAddress,
    OutOfRange,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// KNX protocol error types.
///
/// This is the main error type returned by all operations in this crate.
/// It contains a backtrace (when the std feature is enabled) and detailed
/// error information through helper methods.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KnxError {
    /// Malformed bytes (insufficient length, invalid control bits, escape
    /// codes). Recoverable: the caller discards the offending buffer.
    Format(FormatError),
    /// Caller-supplied value outside its protocol-defined range. Raised
    /// synchronously at construction/assignment; never leaves an object in a
    /// partially-updated state.
    Argument(ArgumentError),
    /// Connection lifecycle errors (closed, timeout, refused, lost).
    Connection(ConnectionError),
    /// Underlying I/O failures, surfaced from the transport boundary.
    Transport(TransportError),
    /// Invalid KNX individual/group address.
    Addressing(AddressingError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Format error with optional backtrace
#[derive(Debug)]
pub struct FormatError {
    kind: FormatErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl FormatError {
    pub(crate) fn new(kind: FormatErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the buffer was too short for the expected structure
    pub fn is_buffer_too_short(&self) -> bool {
        matches!(self.kind, FormatErrorKind::BufferTooShort)
    }

    /// Check if a control field carried an invalid bit pattern
    pub fn is_invalid_control_field(&self) -> bool {
        matches!(self.kind, FormatErrorKind::InvalidControlField)
    }

    /// Check if the buffer was not an acknowledgment frame at all
    pub fn is_not_an_ack(&self) -> bool {
        matches!(self.kind, FormatErrorKind::NotAnAck)
    }
}

/// Argument error with optional backtrace
#[derive(Debug)]
pub struct ArgumentError {
    kind: ArgumentErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl ArgumentError {
    pub(crate) fn new(kind: ArgumentErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if a value was outside its protocol-defined range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, ArgumentErrorKind::ValueOutOfRange)
    }
}

/// Connection error with optional backtrace
#[derive(Debug)]
pub struct ConnectionError {
    kind: ConnectionErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl ConnectionError {
    pub(crate) fn new(kind: ConnectionErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if the operation failed because the connection is closed
    pub fn is_closed(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Closed)
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Timeout)
    }

    /// Check if the connection was refused by the peer
    pub fn is_refused(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Refused)
    }

    /// Check if a blocking send was already in progress
    pub fn is_busy(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Busy)
    }
}

/// Transport error with optional backtrace
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl TransportError {
    pub(crate) fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if an encode buffer was too small
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(self.kind, TransportErrorKind::BufferTooSmall)
    }

    /// Check if receiving a datagram failed
    pub fn is_receive_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::ReceiveFailed)
    }

    /// Check if this is a socket error
    pub fn is_socket_error(&self) -> bool {
        matches!(self.kind, TransportErrorKind::SocketError)
    }
}

/// Addressing error with optional backtrace
#[derive(Debug)]
pub struct AddressingError {
    kind: AddressingErrorKind,
    #[cfg(feature = "std")]
    backtrace: Backtrace,
}

impl AddressingError {
    pub(crate) fn new(kind: AddressingErrorKind) -> Self {
        Self {
            kind,
            #[cfg(feature = "std")]
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if an address component was out of range
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }
}

// defmt cannot format a std backtrace, so only the kind is emitted.
#[cfg(feature = "defmt")]
mod defmt_impls {
    use super::*;

    macro_rules! format_kind_only {
        ($($err:ty),*) => {
            $(impl defmt::Format for $err {
                fn format(&self, fmt: defmt::Formatter<'_>) {
                    defmt::write!(fmt, "{}", self.kind);
                }
            })*
        };
    }

    format_kind_only!(
        FormatError,
        ArgumentError,
        ConnectionError,
        TransportError,
        AddressingError
    );
}

// =============================================================================
// Convenience Constructors for KnxError
// =============================================================================

impl KnxError {
    // Format errors
    pub fn buffer_too_short() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::BufferTooShort))
    }

    pub fn invalid_frame() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::InvalidFrame))
    }

    pub fn invalid_control_field() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::InvalidControlField))
    }

    pub fn unsupported_escape_code() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::UnsupportedEscapeCode))
    }

    pub fn unsupported_version() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::UnsupportedVersion))
    }

    pub fn unsupported_service_type() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::UnsupportedServiceType))
    }

    pub fn not_an_ack() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::NotAnAck))
    }

    pub fn payload_too_large() -> Self {
        Self::Format(FormatError::new(FormatErrorKind::PayloadTooLarge))
    }

    // Argument errors
    pub fn value_out_of_range() -> Self {
        Self::Argument(ArgumentError::new(ArgumentErrorKind::ValueOutOfRange))
    }

    pub fn invalid_multicast_group() -> Self {
        Self::Argument(ArgumentError::new(ArgumentErrorKind::InvalidMulticastGroup))
    }

    // Connection errors
    pub fn connection_closed() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Closed))
    }

    pub fn connection_refused() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Refused))
    }

    pub fn connection_timeout() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Timeout))
    }

    pub fn connection_busy() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Busy))
    }

    // Transport errors
    pub fn buffer_too_small() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::BufferTooSmall))
    }

    pub fn send_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::SendFailed))
    }

    pub fn receive_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ReceiveFailed))
    }

    pub fn socket_error() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::SocketError))
    }

    // Addressing errors
    pub fn invalid_individual_address() -> Self {
        Self::Addressing(AddressingError::new(
            AddressingErrorKind::InvalidIndividualAddress,
        ))
    }

    pub fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroupAddress))
    }

    pub fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    // =========================================================================
    // Category probes
    // =========================================================================

    /// Check if this is a format error (malformed inbound bytes)
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Check if this is an argument error (value outside protocol range)
    pub fn is_argument(&self) -> bool {
        matches!(self, Self::Argument(_))
    }

    /// Check if the operation failed on a closed connection
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::Connection(e) if e.is_closed())
    }

    /// Check if this is a transport (I/O) error
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for KnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxError::Format(e) => write!(f, "Format error: {:?}", e.kind),
            KnxError::Argument(e) => write!(f, "Argument error: {:?}", e.kind),
            KnxError::Connection(e) => write!(f, "Connection error: {:?}", e.kind),
            KnxError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            KnxError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
        }
    }
}

// Implement std::error::Error for std-based applications
#[cfg(feature = "std")]
impl std::error::Error for KnxError {}
