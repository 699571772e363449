//! Multicast routing connection.
//!
//! KNXnet/IP routing is connectionless: routers exchange cEMI frames as
//! ROUTING_INDICATION multicasts and report queue overflows through
//! ROUTING_LOST_MESSAGE. [`RouterMachine`] validates the configured
//! multicast group, builds indications for transmission and feeds
//! received lost-message reports through a [`LossTracker`].
//!
//! There is no channel or heartbeat; the machine is usable immediately
//! after construction and only a close (always user initiated) ends it.

use crate::connection::events::{CloseEvent, EventDispatcher, FrameEvent, LinkListener};
use crate::connection::loss::{DeviceState, LossTracker};
use crate::error::{KnxError, Result};
use crate::net::{IpEndpoint, Ipv4Addr};
use crate::protocol::constants::{ServiceType, ROUTING_MULTICAST_ADDR};
use crate::protocol::frame::{FrameBuilder, KnxnetIpFrame};
use crate::protocol::services::{RoutingIndication, RoutingLostMessage};

/// Sans-I/O state machine for a KNXnet/IP routing endpoint.
pub struct RouterMachine<'a> {
    multicast: Ipv4Addr,
    closed: bool,
    dispatcher: EventDispatcher<'a>,
    loss: LossTracker,
}

impl<'a> RouterMachine<'a> {
    /// Create a routing endpoint on `multicast`.
    ///
    /// # Errors
    ///
    /// Returns an argument error unless the address is a multicast
    /// address at or above the KNXnet/IP routing range start
    /// (224.0.23.12); lower groups belong to other services.
    pub fn new(multicast: Ipv4Addr) -> Result<Self> {
        let floor = u32::from_be_bytes(ROUTING_MULTICAST_ADDR);
        if !multicast.is_multicast() || u32::from(multicast) < floor {
            return Err(KnxError::invalid_multicast_group());
        }
        Ok(Self {
            multicast,
            closed: false,
            dispatcher: EventDispatcher::new(),
            loss: LossTracker::new(),
        })
    }

    /// Register an event listener.
    pub fn add_listener(&mut self, listener: &'a dyn LinkListener) -> bool {
        self.dispatcher.add_listener(listener)
    }

    /// Remove an event listener.
    pub fn remove_listener(&mut self, listener: &'a dyn LinkListener) -> bool {
        self.dispatcher.remove_listener(listener)
    }

    /// Configured multicast group.
    pub const fn multicast(&self) -> Ipv4Addr {
        self.multicast
    }

    /// True after [`RouterMachine::close`].
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Build a routing indication carrying `cemi` into `out`.
    ///
    /// Routing sends are always non-blocking; there is no acknowledgment
    /// on the multicast group.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the endpoint is closed (no bytes
    /// are produced) or a transport error when `out` is too small.
    pub fn send_indication(&mut self, cemi: &[u8], out: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(KnxError::connection_closed());
        }
        FrameBuilder::new(ServiceType::RoutingIndication, cemi).build(out)
    }

    /// Process a frame received on the multicast group.
    ///
    /// Routing indications are delivered to listeners; lost-message
    /// reports go through the loss tracker, notifying listeners only when
    /// the reported total increased. Other services are ignored.
    ///
    /// # Errors
    ///
    /// Returns a format error for malformed frames.
    pub fn handle_frame(&mut self, data: &[u8]) -> Result<()> {
        self.dispatch(data, None)
    }

    /// Same as [`RouterMachine::handle_frame`], recording the datagram
    /// source so listeners see which router sent an indication.
    ///
    /// # Errors
    ///
    /// Returns a format error for malformed frames.
    pub fn handle_frame_from(&mut self, data: &[u8], source: IpEndpoint) -> Result<()> {
        self.dispatch(data, Some(source))
    }

    fn dispatch(&mut self, data: &[u8], source: Option<IpEndpoint>) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let frame = KnxnetIpFrame::parse(data)?;
        match frame.service_type() {
            ServiceType::RoutingIndication => {
                let indication = RoutingIndication::parse(frame.body())?;
                self.dispatcher.notify_frame(&FrameEvent {
                    frame: indication.payload,
                    source,
                });
            }
            ServiceType::RoutingLostMessage => {
                let report = RoutingLostMessage::parse(frame.body())?;
                let state = DeviceState::new(report.device_state);
                if let Some(event) = self.loss.update(state, report.lost_messages) {
                    self.dispatcher.notify_lost(&event);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Close the endpoint. Idempotent; listeners are notified exactly
    /// once, always as a user-requested close.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.dispatcher.notify_closed(&CloseEvent {
            user_request: true,
            reason: "user request",
        });
    }
}
