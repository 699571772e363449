//! Network transport abstraction for KNXnet/IP communication.
//!
//! The [`AsyncTransport`] trait abstracts the underlying datagram
//! transport: the async connection driver depends only on this trait, so
//! real sockets, serial bridges and the test mock are interchangeable.

use crate::error::Result;
use crate::net::IpEndpoint;

/// Asynchronous datagram transport abstraction.
///
/// The trait is kept minimal for embedded use: no heap allocations, data
/// moves through caller-provided buffers.
#[allow(async_fn_in_trait)]
pub trait AsyncTransport {
    /// Bind the transport to a local port (0 = any available port).
    ///
    /// The default implementation is a no-op for transports without an
    /// explicit bind step.
    ///
    /// # Errors
    ///
    /// Returns an error if the port is already in use or binding fails.
    fn bind(&mut self, _port: u16) -> Result<()> {
        Ok(())
    }

    /// Send a datagram to `addr`.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the network is unavailable or the
    /// transport is closed.
    async fn send_to(&mut self, data: &[u8], addr: IpEndpoint) -> Result<()>;

    /// Receive a datagram into `buf`, returning the number of bytes and
    /// the source endpoint.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the receive fails or the transport is
    /// closed.
    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, IpEndpoint)>;

    /// Whether the transport is bound and usable.
    fn is_ready(&self) -> bool {
        true
    }

    /// Close the transport and release its resources.
    fn close(&mut self) {}
}
