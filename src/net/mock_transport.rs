//! Mock transport implementation for testing.
//!
//! A bounded, heap-free [`AsyncTransport`] double: pre-programmed
//! datagrams are replayed by `recv_from` in FIFO order, and everything
//! passed to `send_to` is recorded for inspection.

use heapless::{Deque, Vec};

use crate::error::{KnxError, Result};
use crate::net::transport::AsyncTransport;
use crate::net::{IpEndpoint, Ipv4Addr};

/// Maximum datagram size the mock stores.
pub const MOCK_DATAGRAM_SIZE: usize = 512;

/// Queue depths for programmed responses and the sent-packet log.
const QUEUE_DEPTH: usize = 8;
const SENT_LOG_DEPTH: usize = 16;

type Datagram = (Vec<u8, MOCK_DATAGRAM_SIZE>, IpEndpoint);

/// Mock transport for exercising connection logic without a network.
#[derive(Debug)]
pub struct MockTransport {
    responses: Deque<Datagram, QUEUE_DEPTH>,
    sent_packets: Vec<Datagram, SENT_LOG_DEPTH>,
    ready: bool,
}

impl MockTransport {
    /// Create a new mock transport, ready by default.
    pub fn new() -> Self {
        Self {
            responses: Deque::new(),
            sent_packets: Vec::new(),
            ready: true,
        }
    }

    /// Program a datagram to be returned by the next `recv_from` call,
    /// reported as coming from a default gateway endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the datagram or the queue exceeds capacity.
    pub fn add_response(&mut self, data: &[u8]) -> Result<()> {
        self.add_response_from(
            data,
            IpEndpoint::new(Ipv4Addr::new(192, 168, 1, 10), 3671),
        )
    }

    /// Program a datagram with an explicit source endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the datagram or the queue exceeds capacity.
    pub fn add_response_from(&mut self, data: &[u8], from: IpEndpoint) -> Result<()> {
        let stored = Vec::from_slice(data).map_err(|_| KnxError::payload_too_large())?;
        self.responses
            .push_back((stored, from))
            .map_err(|_| KnxError::payload_too_large())
    }

    /// All datagrams passed to `send_to`, in order.
    pub fn sent_packets(&self) -> &[Datagram] {
        &self.sent_packets
    }

    /// The most recently sent datagram, if any.
    pub fn last_sent(&self) -> Option<&Datagram> {
        self.sent_packets.last()
    }

    /// Clear the sent-packet log.
    pub fn clear_sent(&mut self) {
        self.sent_packets.clear();
    }

    /// Whether programmed responses are still pending.
    pub fn has_responses(&self) -> bool {
        !self.responses.is_empty()
    }

    /// Simulate an unbound or failed socket.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncTransport for MockTransport {
    async fn send_to(&mut self, data: &[u8], addr: IpEndpoint) -> Result<()> {
        if !self.ready {
            return Err(KnxError::socket_error());
        }
        let stored = Vec::from_slice(data).map_err(|_| KnxError::payload_too_large())?;
        self.sent_packets
            .push((stored, addr))
            .map_err(|_| KnxError::send_failed())
    }

    async fn recv_from(&mut self, buf: &mut [u8]) -> Result<(usize, IpEndpoint)> {
        if !self.ready {
            return Err(KnxError::receive_failed());
        }
        // Out of programmed responses: behaves like a receive timeout.
        let (data, from) = self
            .responses
            .pop_front()
            .ok_or_else(KnxError::connection_timeout)?;
        if buf.len() < data.len() {
            return Err(KnxError::buffer_too_small());
        }
        buf[..data.len()].copy_from_slice(&data);
        Ok((data.len(), from))
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn close(&mut self) {
        self.ready = false;
        self.responses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_send_receive() {
        let mut mock = MockTransport::new();
        mock.add_response(&[0x01, 0x02, 0x03]).unwrap();

        let dest = IpEndpoint::new(Ipv4Addr::new(192, 168, 1, 10), 3671);
        mock.send_to(&[0xAA, 0xBB], dest).await.unwrap();

        assert_eq!(mock.sent_packets().len(), 1);
        assert_eq!(&mock.sent_packets()[0].0[..], [0xAA, 0xBB]);
        assert_eq!(mock.sent_packets()[0].1, dest);

        let mut buf = [0u8; 16];
        let (n, _) = mock.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x01, 0x02, 0x03]);
    }

    #[tokio::test]
    async fn test_mock_empty_queue_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 16];
        let err = mock.recv_from(&mut buf).await.unwrap_err();
        assert!(matches!(&err, KnxError::Connection(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_mock_fifo_order() {
        let mut mock = MockTransport::new();
        mock.add_response(&[0x01]).unwrap();
        mock.add_response(&[0x02]).unwrap();

        let mut buf = [0u8; 16];
        mock.recv_from(&mut buf).await.unwrap();
        assert_eq!(buf[0], 0x01);
        mock.recv_from(&mut buf).await.unwrap();
        assert_eq!(buf[0], 0x02);
    }

    #[tokio::test]
    async fn test_mock_not_ready_fails_io() {
        let mut mock = MockTransport::new();
        mock.add_response(&[0x01]).unwrap();
        mock.set_ready(false);

        let dest = IpEndpoint::new(Ipv4Addr::new(192, 168, 1, 10), 3671);
        let err = mock.send_to(&[0x00], dest).await.unwrap_err();
        assert!(matches!(&err, KnxError::Transport(e) if e.is_socket_error()));

        let mut buf = [0u8; 4];
        let err = mock.recv_from(&mut buf).await.unwrap_err();
        assert!(matches!(&err, KnxError::Transport(e) if e.is_receive_failed()));
    }

    #[test]
    fn test_mock_ready_state() {
        let mut mock = MockTransport::new();
        assert!(mock.is_ready());
        mock.set_ready(false);
        assert!(!mock.is_ready());
        mock.set_ready(true);
        mock.close();
        assert!(!mock.is_ready());
        assert!(!mock.has_responses());
    }
}
