//! KNXnet/IP connection state machines.
//!
//! Two connection flavors are provided: [`TunnelMachine`] for the
//! point-to-point tunneling protocol (channel, sequence numbers,
//! acknowledgments, heartbeat supervision) and [`RouterMachine`] for
//! connectionless multicast routing. Both are sans-I/O: they consume
//! received datagrams and a caller-supplied clock, and produce datagrams
//! into caller buffers. The embassy driver in [`driver`] binds a tunnel
//! machine to a transport and a real clock.

pub mod events;
pub mod loss;
pub mod machine;
pub mod router;

#[cfg(feature = "embassy")]
pub mod driver;

pub use events::{CloseEvent, EventDispatcher, FrameEvent, LinkListener, LostMessageEvent};
pub use loss::{DeviceState, LossTracker};
pub use machine::{BlockingMode, ConnState, TunnelMachine};
pub use router::RouterMachine;

#[cfg(feature = "embassy")]
pub use driver::TunnelDriver;
