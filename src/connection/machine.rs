//! Tunneling connection state machine.
//!
//! [`TunnelMachine`] implements the client side of a KNXnet/IP tunneling
//! connection without doing any I/O itself: it consumes received frames
//! and explicit time, and produces frames for the caller to transmit.
//! This keeps the protocol logic deterministic and testable; an async
//! driver supplies real sockets and a clock.
//!
//! The connection lifecycle is `Init -> Open -> Closed`, with `Closed`
//! terminal. While open, the machine supervises the channel with a
//! connection-state request every 60 s; a response missing its 10 s
//! deadline closes the connection. Listeners receive exactly one close
//! notification per connection instance, whether the close was user
//! requested, server requested, or a supervision timeout.

use crate::connection::events::{CloseEvent, EventDispatcher, FrameEvent, LinkListener};
use crate::error::{KnxError, Result};
use crate::net::IpEndpoint;
use crate::protocol::constants::{
    ServiceType, CONFIRMATION_TIMEOUT_MS, CONNECTIONSTATE_RESPONSE_TIMEOUT_MS,
    CONNECT_RESPONSE_TIMEOUT_MS, E_NO_ERROR, HEARTBEAT_INTERVAL_MS, TUNNELING_ACK_TIMEOUT_MS,
};
use crate::protocol::frame::{FrameBuilder, KnxnetIpFrame};
use crate::protocol::services::{
    ConnectRequest, ConnectResponse, ConnectionStateRequest, ConnectionStateResponse,
    ConnectionStatus, Cri, DisconnectRequest, DisconnectResponse, Hpai, TunnelingAck,
    TunnelingRequest,
};

/// cEMI message code of `L_Data.con`, the confirmation of a sent frame.
const MC_LDATA_CON: u8 = 0x2E;

/// Default routing hop count of a new link.
const DEFAULT_HOP_COUNT: u8 = 6;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnState {
    /// Created; connect request not yet answered.
    Init,
    /// Connect response accepted, channel established.
    Open,
    /// Terminal: closed by user, server or supervision timeout.
    Closed,
}

/// How a send call completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockingMode {
    /// Hand the frame to the transport and return.
    NonBlocking,
    /// Wait until the server acknowledges the tunneling request.
    WaitForAck,
    /// Wait until the confirmation of the frame arrives from the bus.
    WaitForCon,
}

/// A blocking send in flight.
#[derive(Debug, Clone, Copy)]
struct PendingSend {
    sequence: u8,
    mode: BlockingMode,
    acked: bool,
    deadline: u64,
}

/// Sans-I/O client state machine for a KNXnet/IP tunneling connection.
///
/// Time is passed explicitly as milliseconds (`now_ms`); the zero point
/// is arbitrary but must be monotonic across calls. All frame output
/// goes into caller buffers: a return value of `Ok(n)` with `n > 0`
/// means `out[..n]` must be sent to the server.
pub struct TunnelMachine<'a> {
    state: ConnState,
    local: Hpai,
    channel_id: u8,
    knx_address: Option<u16>,
    seq_send: u8,
    seq_recv: u8,
    hop_count: u8,
    dispatcher: EventDispatcher<'a>,
    connect_deadline: Option<u64>,
    next_heartbeat: u64,
    heartbeat_deadline: Option<u64>,
    pending: Option<PendingSend>,
    rx_source: Option<IpEndpoint>,
}

impl<'a> TunnelMachine<'a> {
    /// Create a new machine in the `Init` state.
    ///
    /// `local` is the client control/data endpoint advertised to the
    /// server in the connect request.
    pub fn new(local: Hpai) -> Self {
        Self {
            state: ConnState::Init,
            local,
            channel_id: 0,
            knx_address: None,
            seq_send: 0,
            seq_recv: 0,
            hop_count: DEFAULT_HOP_COUNT,
            dispatcher: EventDispatcher::new(),
            connect_deadline: None,
            next_heartbeat: 0,
            heartbeat_deadline: None,
            pending: None,
            rx_source: None,
        }
    }

    /// Register an event listener. Returns false when the listener is
    /// already registered or the listener set is full.
    pub fn add_listener(&mut self, listener: &'a dyn LinkListener) -> bool {
        self.dispatcher.add_listener(listener)
    }

    /// Remove an event listener.
    pub fn remove_listener(&mut self, listener: &'a dyn LinkListener) -> bool {
        self.dispatcher.remove_listener(listener)
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ConnState {
        self.state
    }

    /// Channel identifier assigned by the server (0 before open).
    pub const fn channel_id(&self) -> u8 {
        self.channel_id
    }

    /// Individual address assigned to the tunnel by the server.
    pub const fn knx_address(&self) -> Option<u16> {
        self.knx_address
    }

    /// Configured routing hop count.
    pub const fn hop_count(&self) -> u8 {
        self.hop_count
    }

    /// True while a blocking send is waiting for its ack/confirmation.
    pub const fn send_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Set the routing hop count used for sent frames.
    ///
    /// Accepted range is 0..=255. Only an open connection applies the
    /// assignment; in any other state the call is ignored.
    ///
    /// # Errors
    ///
    /// Returns an argument error for values above 255; the previous
    /// value stays in effect.
    pub fn set_hop_count(&mut self, hop_count: u16) -> Result<()> {
        if self.state != ConnState::Open {
            return Ok(());
        }
        let hops = u8::try_from(hop_count).map_err(|_| KnxError::value_out_of_range())?;
        self.hop_count = hops;
        Ok(())
    }

    /// Build the connect request, starting the connect timeout.
    ///
    /// Valid in `Init`; an open connection returns `Ok(0)` and a closed
    /// one fails.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the machine is closed, or a
    /// transport error when `out` is too small.
    pub fn connect_request(&mut self, now_ms: u64, out: &mut [u8]) -> Result<usize> {
        match self.state {
            ConnState::Closed => Err(KnxError::connection_closed()),
            ConnState::Open => Ok(0),
            ConnState::Init => {
                let request = ConnectRequest {
                    control_endpoint: self.local,
                    data_endpoint: self.local,
                    cri: Cri::tunnel_link_layer(),
                };
                let mut body = [0u8; ConnectRequest::SIZE];
                let n = request.build(&mut body)?;
                self.connect_deadline = Some(now_ms + CONNECT_RESPONSE_TIMEOUT_MS);
                FrameBuilder::new(ServiceType::ConnectRequest, &body[..n]).build(out)
            }
        }
    }

    /// Queue a cEMI frame for transmission through the tunnel.
    ///
    /// Builds the tunneling request into `out`. For the blocking modes
    /// the machine tracks the outstanding acknowledgment; only one
    /// blocking send may be in flight at a time.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the connection is not open (no
    /// bytes are produced), when a blocking send is already pending, or
    /// a transport error when `out` is too small.
    pub fn send_request(
        &mut self,
        now_ms: u64,
        cemi: &[u8],
        mode: BlockingMode,
        out: &mut [u8],
    ) -> Result<usize> {
        if self.state != ConnState::Open {
            return Err(KnxError::connection_closed());
        }
        if mode != BlockingMode::NonBlocking && self.pending.is_some() {
            return Err(KnxError::connection_busy());
        }
        let request = TunnelingRequest {
            channel_id: self.channel_id,
            sequence: self.seq_send,
            payload: cemi,
        };
        let mut body = [0u8; crate::protocol::constants::MAX_FRAME_SIZE];
        let n = request.build(&mut body)?;
        let written = FrameBuilder::new(ServiceType::TunnelingRequest, &body[..n]).build(out)?;
        if mode != BlockingMode::NonBlocking {
            self.pending = Some(PendingSend {
                sequence: self.seq_send,
                mode,
                acked: false,
                deadline: now_ms + TUNNELING_ACK_TIMEOUT_MS,
            });
        }
        self.seq_send = self.seq_send.wrapping_add(1);
        Ok(written)
    }

    /// Close the connection.
    ///
    /// Builds the disconnect request into `out` when the connection was
    /// open. Idempotent: a second call returns `Ok(0)` and no further
    /// close notification is delivered.
    pub fn close(&mut self, _now_ms: u64, out: &mut [u8]) -> Result<usize> {
        if self.state == ConnState::Closed {
            return Ok(0);
        }
        let written = if self.state == ConnState::Open {
            let request = DisconnectRequest {
                channel_id: self.channel_id,
                control_endpoint: self.local,
            };
            let mut body = [0u8; DisconnectRequest::SIZE];
            let n = request.build(&mut body)?;
            FrameBuilder::new(ServiceType::DisconnectRequest, &body[..n]).build(out)?
        } else {
            0
        };
        self.transition_closed(true, "user request");
        Ok(written)
    }

    /// Advance time-driven behavior: connect and heartbeat supervision.
    ///
    /// Returns bytes to transmit (a connection-state request when the
    /// heartbeat interval elapsed) or `Ok(0)`.
    ///
    /// # Errors
    ///
    /// Returns a transport error when `out` is too small for a due
    /// heartbeat frame.
    pub fn poll(&mut self, now_ms: u64, out: &mut [u8]) -> Result<usize> {
        match self.state {
            ConnState::Closed => Ok(0),
            ConnState::Init => {
                if matches!(self.connect_deadline, Some(d) if now_ms >= d) {
                    self.transition_closed(false, "connect request timed out");
                }
                Ok(0)
            }
            ConnState::Open => {
                if matches!(self.heartbeat_deadline, Some(d) if now_ms >= d) {
                    self.transition_closed(false, "connection state request timed out");
                    return Ok(0);
                }
                if matches!(self.pending, Some(p) if now_ms >= p.deadline) {
                    self.transition_closed(false, "acknowledgment timed out");
                    return Ok(0);
                }
                if self.heartbeat_deadline.is_none() && now_ms >= self.next_heartbeat {
                    let request = ConnectionStateRequest {
                        channel_id: self.channel_id,
                        control_endpoint: self.local,
                    };
                    let mut body = [0u8; ConnectionStateRequest::SIZE];
                    let n = request.build(&mut body)?;
                    self.heartbeat_deadline =
                        Some(now_ms + CONNECTIONSTATE_RESPONSE_TIMEOUT_MS);
                    self.next_heartbeat = now_ms + HEARTBEAT_INTERVAL_MS;
                    return FrameBuilder::new(ServiceType::ConnectionstateRequest, &body[..n])
                        .build(out);
                }
                Ok(0)
            }
        }
    }

    /// Process a frame received from the server.
    ///
    /// Returns bytes to transmit in reaction (tunneling ack, disconnect
    /// response) or `Ok(0)`. Frames for other channels and services not
    /// belonging to a tunneling connection are ignored.
    ///
    /// # Errors
    ///
    /// Returns a format error for malformed frames and a connection
    /// error when the server refuses the connect request.
    pub fn handle_frame(&mut self, now_ms: u64, data: &[u8], out: &mut [u8]) -> Result<usize> {
        self.rx_source = None;
        self.process_frame(now_ms, data, out)
    }

    /// Same as [`TunnelMachine::handle_frame`], recording the datagram
    /// source so listeners see where a delivered frame came from.
    ///
    /// # Errors
    ///
    /// Returns a format error for malformed frames and a connection
    /// error when the server refuses the connect request.
    pub fn handle_frame_from(
        &mut self,
        now_ms: u64,
        data: &[u8],
        source: IpEndpoint,
        out: &mut [u8],
    ) -> Result<usize> {
        self.rx_source = Some(source);
        let written = self.process_frame(now_ms, data, out);
        self.rx_source = None;
        written
    }

    fn process_frame(&mut self, now_ms: u64, data: &[u8], out: &mut [u8]) -> Result<usize> {
        let frame = KnxnetIpFrame::parse(data)?;
        match frame.service_type() {
            ServiceType::ConnectResponse => self.on_connect_response(now_ms, frame.body()),
            ServiceType::ConnectionstateResponse => {
                self.on_connectionstate_response(frame.body())?;
                Ok(0)
            }
            ServiceType::TunnelingRequest => self.on_tunneling_request(frame.body(), out),
            ServiceType::TunnelingAck => {
                self.on_tunneling_ack(now_ms, frame.body())?;
                Ok(0)
            }
            ServiceType::DisconnectRequest => self.on_disconnect_request(frame.body(), out),
            _ => Ok(0),
        }
    }

    fn on_connect_response(&mut self, now_ms: u64, body: &[u8]) -> Result<usize> {
        if self.state != ConnState::Init {
            return Ok(0);
        }
        let response = ConnectResponse::parse(body)?;
        if response.connection_status() != ConnectionStatus::Ok {
            self.transition_closed(false, "connection refused by server");
            return Err(KnxError::connection_refused());
        }
        self.channel_id = response.channel_id;
        self.knx_address = response.knx_address;
        self.connect_deadline = None;
        self.next_heartbeat = now_ms + HEARTBEAT_INTERVAL_MS;
        self.state = ConnState::Open;
        Ok(0)
    }

    fn on_connectionstate_response(&mut self, body: &[u8]) -> Result<()> {
        let response = ConnectionStateResponse::parse(body)?;
        if self.state != ConnState::Open || response.channel_id != self.channel_id {
            return Ok(());
        }
        self.heartbeat_deadline = None;
        if response.status != E_NO_ERROR {
            self.transition_closed(false, "connection state error reported by server");
        }
        Ok(())
    }

    fn on_tunneling_request(&mut self, body: &[u8], out: &mut [u8]) -> Result<usize> {
        if self.state != ConnState::Open {
            return Ok(0);
        }
        let request = TunnelingRequest::parse(body)?;
        if request.channel_id != self.channel_id {
            return Ok(0);
        }
        let expected = self.seq_recv;
        if request.sequence == expected {
            self.seq_recv = self.seq_recv.wrapping_add(1);
            // A confirmation completes a send waiting for it.
            if request.payload.first() == Some(&MC_LDATA_CON) {
                if let Some(p) = self.pending {
                    if p.mode == BlockingMode::WaitForCon && p.acked {
                        self.pending = None;
                    }
                }
            }
            self.dispatcher.notify_frame(&FrameEvent {
                frame: request.payload,
                source: self.rx_source,
            });
        } else if request.sequence != expected.wrapping_sub(1) {
            // Neither the expected sequence nor a repeat of the last one.
            return Ok(0);
        }
        let ack = TunnelingAck {
            channel_id: self.channel_id,
            sequence: request.sequence,
            status: E_NO_ERROR,
        };
        let mut ack_body = [0u8; TunnelingAck::SIZE];
        let n = ack.build(&mut ack_body)?;
        FrameBuilder::new(ServiceType::TunnelingAck, &ack_body[..n]).build(out)
    }

    fn on_tunneling_ack(&mut self, now_ms: u64, body: &[u8]) -> Result<()> {
        let ack = TunnelingAck::parse(body)?;
        if self.state != ConnState::Open || ack.channel_id != self.channel_id {
            return Ok(());
        }
        let Some(mut p) = self.pending else {
            return Ok(());
        };
        if ack.sequence != p.sequence {
            return Ok(());
        }
        if ack.status != E_NO_ERROR {
            self.transition_closed(false, "tunneling request rejected by server");
            return Ok(());
        }
        match p.mode {
            BlockingMode::WaitForAck | BlockingMode::NonBlocking => self.pending = None,
            BlockingMode::WaitForCon => {
                p.acked = true;
                p.deadline = now_ms + CONFIRMATION_TIMEOUT_MS;
                self.pending = Some(p);
            }
        }
        Ok(())
    }

    fn on_disconnect_request(&mut self, body: &[u8], out: &mut [u8]) -> Result<usize> {
        let request = DisconnectRequest::parse(body)?;
        if self.state == ConnState::Closed || request.channel_id != self.channel_id {
            return Ok(0);
        }
        let response = DisconnectResponse {
            channel_id: self.channel_id,
            status: E_NO_ERROR,
        };
        let mut rsp_body = [0u8; DisconnectResponse::SIZE];
        let n = response.build(&mut rsp_body)?;
        let written = FrameBuilder::new(ServiceType::DisconnectResponse, &rsp_body[..n]).build(out)?;
        self.transition_closed(false, "server request");
        Ok(written)
    }

    /// Enter the closed state, aborting any pending send, and notify
    /// listeners exactly once.
    fn transition_closed(&mut self, user_request: bool, reason: &'static str) {
        if self.state == ConnState::Closed {
            return;
        }
        self.state = ConnState::Closed;
        self.pending = None;
        self.connect_deadline = None;
        self.heartbeat_deadline = None;
        self.dispatcher.notify_closed(&CloseEvent {
            user_request,
            reason,
        });
    }
}
