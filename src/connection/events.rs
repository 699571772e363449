//! Listener notification for connection events.
//!
//! Connections notify registered [`LinkListener`]s about received frames,
//! message loss reported by routers, and the transition to the closed
//! state. The dispatcher holds a bounded set of listener references,
//! de-duplicated by identity, and guarantees that the close notification
//! fires at most once per connection instance.

use heapless::Vec;

use crate::connection::loss::DeviceState;
use crate::net::IpEndpoint;

/// Maximum number of listeners registered on one connection.
pub const MAX_LISTENERS: usize = 4;

/// A frame was received on the connection.
#[derive(Debug, Clone, Copy)]
pub struct FrameEvent<'a> {
    /// Raw cEMI frame bytes as carried by the service body.
    pub frame: &'a [u8],
    /// Endpoint the datagram came from, when the transport reported one.
    pub source: Option<IpEndpoint>,
}

/// The connection transitioned to the closed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CloseEvent {
    /// True when the local user requested the close, false for closes
    /// initiated by the remote endpoint or by supervision timeouts.
    pub user_request: bool,
    /// Short description of what caused the close.
    pub reason: &'static str,
}

/// A router reported lost messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LostMessageEvent {
    /// Device state of the reporting router.
    pub device_state: DeviceState,
    /// Running total of messages the router has dropped.
    pub total_lost: u16,
}

/// Receiver of connection events.
///
/// All methods have empty default bodies; implementors override only the
/// notifications they care about.
pub trait LinkListener {
    /// A frame arrived on the connection.
    fn frame_received(&self, _event: &FrameEvent<'_>) {}

    /// The connection is closed; no further events will follow.
    fn connection_closed(&self, _event: &CloseEvent) {}

    /// A router reported an increased lost-message total.
    fn lost_message(&self, _event: &LostMessageEvent) {}
}

/// Bounded listener set with once-only close delivery.
pub struct EventDispatcher<'a> {
    listeners: Vec<&'a dyn LinkListener, MAX_LISTENERS>,
    close_notified: bool,
}

impl<'a> EventDispatcher<'a> {
    /// Create an empty dispatcher.
    pub const fn new() -> Self {
        Self {
            listeners: Vec::new(),
            close_notified: false,
        }
    }

    /// Register a listener.
    ///
    /// Returns false if the listener is already registered (compared by
    /// identity) or the listener set is full.
    pub fn add_listener(&mut self, listener: &'a dyn LinkListener) -> bool {
        if self.contains(listener) {
            return false;
        }
        self.listeners.push(listener).is_ok()
    }

    /// Remove a listener, returning whether it was registered.
    pub fn remove_listener(&mut self, listener: &'a dyn LinkListener) -> bool {
        let before = self.listeners.len();
        self.listeners
            .retain(|l| !core::ptr::addr_eq(*l as *const dyn LinkListener, listener));
        self.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True when no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn contains(&self, listener: &'a dyn LinkListener) -> bool {
        self.listeners
            .iter()
            .any(|l| core::ptr::addr_eq(*l as *const dyn LinkListener, listener))
    }

    /// Deliver a received frame to every listener.
    pub fn notify_frame(&self, event: &FrameEvent<'_>) {
        for l in &self.listeners {
            l.frame_received(event);
        }
    }

    /// Deliver a lost-message report to every listener.
    pub fn notify_lost(&self, event: &LostMessageEvent) {
        for l in &self.listeners {
            l.lost_message(event);
        }
    }

    /// Deliver the close notification to every listener, at most once per
    /// dispatcher instance. Later calls are ignored.
    pub fn notify_closed(&mut self, event: &CloseEvent) {
        if self.close_notified {
            return;
        }
        self.close_notified = true;
        for l in &self.listeners {
            l.connection_closed(event);
        }
    }
}

impl Default for EventDispatcher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct CountingListener {
        frames: Cell<usize>,
        closes: Cell<usize>,
        losses: Cell<usize>,
        last_close: Cell<Option<CloseEvent>>,
    }

    impl LinkListener for CountingListener {
        fn frame_received(&self, _event: &FrameEvent<'_>) {
            self.frames.set(self.frames.get() + 1);
        }
        fn connection_closed(&self, event: &CloseEvent) {
            self.closes.set(self.closes.get() + 1);
            self.last_close.set(Some(*event));
        }
        fn lost_message(&self, _event: &LostMessageEvent) {
            self.losses.set(self.losses.get() + 1);
        }
    }

    #[test]
    fn test_add_remove_and_dedup() {
        let listener = CountingListener::default();
        let mut dispatcher = EventDispatcher::new();
        assert!(dispatcher.add_listener(&listener));
        // Same listener again is rejected.
        assert!(!dispatcher.add_listener(&listener));
        assert_eq!(dispatcher.len(), 1);
        assert!(dispatcher.remove_listener(&listener));
        assert!(!dispatcher.remove_listener(&listener));
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let listeners: [CountingListener; MAX_LISTENERS + 1] = Default::default();
        let mut dispatcher = EventDispatcher::new();
        for l in listeners.iter().take(MAX_LISTENERS) {
            assert!(dispatcher.add_listener(l));
        }
        assert!(!dispatcher.add_listener(&listeners[MAX_LISTENERS]));
    }

    #[test]
    fn test_frame_and_loss_delivery() {
        let listener = CountingListener::default();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_listener(&listener);
        dispatcher.notify_frame(&FrameEvent {
            frame: &[0x29],
            source: None,
        });
        dispatcher.notify_frame(&FrameEvent {
            frame: &[0x29],
            source: None,
        });
        dispatcher.notify_lost(&LostMessageEvent {
            device_state: DeviceState::new(0),
            total_lost: 9,
        });
        assert_eq!(listener.frames.get(), 2);
        assert_eq!(listener.losses.get(), 1);
    }

    #[test]
    fn test_close_delivered_once() {
        let listener = CountingListener::default();
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_listener(&listener);
        let event = CloseEvent {
            user_request: true,
            reason: "user request",
        };
        dispatcher.notify_closed(&event);
        dispatcher.notify_closed(&event);
        assert_eq!(listener.closes.get(), 1);
        assert_eq!(listener.last_close.get(), Some(event));
    }
}
