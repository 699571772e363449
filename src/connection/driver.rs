//! Embassy async driver for the tunneling machine.
//!
//! [`TunnelDriver`] joins a [`TunnelMachine`] with an [`AsyncTransport`]
//! and the embassy clock: received datagrams and elapsed time are fed
//! into the machine, and every frame the machine produces is sent to the
//! server endpoint. Applications that want received cEMI frames outside
//! of listener callbacks register a [`QueueListener`] on the machine and
//! read frames from its channel in another task.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{with_timeout, Duration, Instant, Timer};

use crate::connection::events::{FrameEvent, LinkListener};
use crate::connection::machine::{BlockingMode, ConnState, TunnelMachine};
use crate::error::{KnxError, Result};
use crate::net::transport::AsyncTransport;
use crate::net::IpEndpoint;
use crate::protocol::constants::{CONNECT_RESPONSE_TIMEOUT_MS, MAX_FRAME_SIZE};

/// How often the machine is polled when no datagram arrives.
const POLL_TICK: Duration = Duration::from_millis(100);

/// Grace period for the disconnect response on close.
const DISCONNECT_GRACE: Duration = Duration::from_secs(1);

/// Received cEMI frame, copied out of the transport buffer.
pub type RxFrame = heapless::Vec<u8, MAX_FRAME_SIZE>;

/// Bounded queue of received cEMI frames.
pub type RxQueue = Channel<NoopRawMutex, RxFrame, 4>;

/// Listener that copies received frames into an [`RxQueue`].
///
/// Frames arriving while the queue is full are dropped; the server will
/// repeat unacknowledged ones.
pub struct QueueListener<'q> {
    queue: &'q RxQueue,
}

impl<'q> QueueListener<'q> {
    /// Create a listener feeding `queue`.
    pub const fn new(queue: &'q RxQueue) -> Self {
        Self { queue }
    }
}

impl LinkListener for QueueListener<'_> {
    fn frame_received(&self, event: &FrameEvent<'_>) {
        let mut frame = RxFrame::new();
        if frame.extend_from_slice(event.frame).is_ok() {
            let _ = self.queue.try_send(frame);
        }
    }
}

/// Async driver binding a tunneling machine to a transport.
pub struct TunnelDriver<'a, T: AsyncTransport> {
    machine: TunnelMachine<'a>,
    transport: T,
    server: IpEndpoint,
    rx: [u8; MAX_FRAME_SIZE],
}

impl<'a, T: AsyncTransport> TunnelDriver<'a, T> {
    /// Create a driver for `machine`, talking to `server` over
    /// `transport`.
    pub fn new(machine: TunnelMachine<'a>, transport: T, server: IpEndpoint) -> Self {
        Self {
            machine,
            transport,
            server,
            rx: [0u8; MAX_FRAME_SIZE],
        }
    }

    /// The wrapped machine.
    pub fn machine(&self) -> &TunnelMachine<'a> {
        &self.machine
    }

    /// Current connection state.
    pub fn state(&self) -> ConnState {
        self.machine.state()
    }

    fn now_ms() -> u64 {
        Instant::now().as_millis()
    }

    /// Establish the tunneling connection.
    ///
    /// Sends the connect request and processes received frames until the
    /// machine leaves the `Init` state.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the server refuses the request or
    /// the response times out, or a transport error from the socket.
    pub async fn connect(&mut self) -> Result<()> {
        self.transport.bind(0)?;
        let mut out = [0u8; MAX_FRAME_SIZE];
        let n = self.machine.connect_request(Self::now_ms(), &mut out)?;
        if n > 0 {
            self.transport.send_to(&out[..n], self.server).await?;
        }
        while self.machine.state() == ConnState::Init {
            let (len, from) = with_timeout(
                Duration::from_millis(CONNECT_RESPONSE_TIMEOUT_MS),
                self.transport.recv_from(&mut self.rx),
            )
            .await
            .map_err(|_| KnxError::connection_timeout())??;
            let n = self
                .machine
                .handle_frame_from(Self::now_ms(), &self.rx[..len], from, &mut out)?;
            if n > 0 {
                self.transport.send_to(&out[..n], self.server).await?;
            }
        }
        Ok(())
    }

    /// Send a cEMI frame through the tunnel.
    ///
    /// For the blocking modes the driver keeps processing traffic until
    /// the acknowledgment (or confirmation) arrives or the connection
    /// closes.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the connection is not open or
    /// closes while waiting, or a transport error from the socket.
    pub async fn send(&mut self, cemi: &[u8], mode: BlockingMode) -> Result<()> {
        let mut out = [0u8; MAX_FRAME_SIZE];
        let n = self.machine.send_request(Self::now_ms(), cemi, mode, &mut out)?;
        self.transport.send_to(&out[..n], self.server).await?;
        while self.machine.send_pending() {
            self.step().await?;
            if self.machine.state() == ConnState::Closed {
                return Err(KnxError::connection_closed());
            }
        }
        Ok(())
    }

    /// Process one received datagram or one poll tick.
    ///
    /// # Errors
    ///
    /// Returns a format error for malformed frames or a transport error
    /// from the socket.
    pub async fn step(&mut self) -> Result<()> {
        let mut out = [0u8; MAX_FRAME_SIZE];
        match select(self.transport.recv_from(&mut self.rx), Timer::after(POLL_TICK)).await {
            Either::First(received) => {
                let (len, from) = received?;
                let n = self
                    .machine
                    .handle_frame_from(Self::now_ms(), &self.rx[..len], from, &mut out)?;
                if n > 0 {
                    self.transport.send_to(&out[..n], self.server).await?;
                }
            }
            Either::Second(()) => {}
        }
        let n = self.machine.poll(Self::now_ms(), &mut out)?;
        if n > 0 {
            self.transport.send_to(&out[..n], self.server).await?;
        }
        Ok(())
    }

    /// Drive the connection until it closes.
    ///
    /// # Errors
    ///
    /// Returns the first frame or transport error encountered; the
    /// connection may still be open in that case and `run` can be called
    /// again.
    pub async fn run(&mut self) -> Result<()> {
        while self.machine.state() != ConnState::Closed {
            self.step().await?;
        }
        Ok(())
    }

    /// Close the connection and the transport.
    ///
    /// The disconnect response is awaited briefly as a courtesy; its
    /// absence does not fail the close.
    ///
    /// # Errors
    ///
    /// Returns a transport error when sending the disconnect request
    /// fails.
    pub async fn close(&mut self) -> Result<()> {
        let mut out = [0u8; MAX_FRAME_SIZE];
        let n = self.machine.close(Self::now_ms(), &mut out)?;
        if n > 0 {
            self.transport.send_to(&out[..n], self.server).await?;
            let _ = with_timeout(DISCONNECT_GRACE, self.transport.recv_from(&mut self.rx)).await;
        }
        self.transport.close();
        Ok(())
    }
}
