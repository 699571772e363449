//! Unified logging macros.
//!
//! This module provides a unified logging interface that automatically
//! selects between `defmt::` and `log::` based on the active feature
//! flags, and compiles to nothing when neither backend is enabled.
//!
//! # Usage
//!
//! ```rust
//! use knx_link::knx_log;
//!
//! knx_log!(info, "Connection established");
//! knx_log!(debug, "Received {} bytes", 12);
//! knx_log!(warn, "Heartbeat response overdue");
//! ```
//!
//! # Feature Flags
//!
//! - `defmt` - Uses `defmt::` (efficient for embedded targets)
//! - `log` - Uses the `log::` crate (host applications)
//! - Neither - All invocations are no-ops

/// Unified logging macro - selects defmt::, log::, or a no-op based on features
#[macro_export]
#[cfg(feature = "defmt")]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
}

#[macro_export]
#[cfg(all(feature = "log", not(feature = "defmt")))]
macro_rules! knx_log {
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
}

#[macro_export]
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! knx_log {
    ($level:ident, $($arg:tt)*) => {{
        // Silence unused-variable warnings from format arguments.
        let _ = || ($($arg)*);
    }};
}
