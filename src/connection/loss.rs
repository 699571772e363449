//! Lost-message accounting for routing connections.
//!
//! KNXnet/IP routers multicast a ROUTING_LOST_MESSAGE whenever their
//! queue overflows; the body carries the running total of dropped
//! frames since device startup. [`LossTracker`] turns those reports into
//! at most one notification per increase: the first report only sets the
//! baseline, repeats of a known total are silent.

use crate::connection::events::LostMessageEvent;

/// Device state byte carried in a lost-message report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceState(u8);

impl DeviceState {
    /// Wrap a raw device-state byte.
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// Raw device-state byte.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// The router reports a KNX network fault.
    pub const fn is_knx_fault(self) -> bool {
        self.0 & 0x01 != 0
    }

    /// The router reports an IP network fault.
    pub const fn is_ip_fault(self) -> bool {
        self.0 & 0x02 != 0
    }
}

/// Tracks the lost-message total reported by a router.
#[derive(Debug, Default)]
pub struct LossTracker {
    last_total: Option<u16>,
}

impl LossTracker {
    /// Create a tracker with no baseline yet.
    pub const fn new() -> Self {
        Self { last_total: None }
    }

    /// Process a lost-message report.
    ///
    /// Returns an event to deliver when the reported total exceeds the
    /// previously observed one. The first report establishes the baseline
    /// without a notification; a total below the baseline (router restart)
    /// resets it silently.
    pub fn update(&mut self, device_state: DeviceState, total: u16) -> Option<LostMessageEvent> {
        let notify = matches!(self.last_total, Some(prev) if total > prev);
        self.last_total = Some(total);
        notify.then_some(LostMessageEvent {
            device_state,
            total_lost: total,
        })
    }

    /// Last total observed, if any report arrived yet.
    pub const fn last_total(&self) -> Option<u16> {
        self.last_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_state_bits() {
        assert!(DeviceState::new(0x01).is_knx_fault());
        assert!(!DeviceState::new(0x01).is_ip_fault());
        assert!(DeviceState::new(0x02).is_ip_fault());
        assert!(!DeviceState::new(0x00).is_knx_fault());
        assert_eq!(DeviceState::new(0x03).raw(), 0x03);
    }

    #[test]
    fn test_first_report_sets_baseline_silently() {
        let mut tracker = LossTracker::new();
        assert_eq!(tracker.update(DeviceState::new(0), 5), None);
        assert_eq!(tracker.last_total(), Some(5));
    }

    #[test]
    fn test_notifies_only_on_increase() {
        let mut tracker = LossTracker::new();
        let state = DeviceState::new(0);
        let mut notifications = 0;
        for total in [5u16, 5, 9, 9, 20] {
            if tracker.update(state, total).is_some() {
                notifications += 1;
            }
        }
        assert_eq!(notifications, 2);
    }

    #[test]
    fn test_event_carries_total_and_state() {
        let mut tracker = LossTracker::new();
        tracker.update(DeviceState::new(0), 5);
        let event = tracker.update(DeviceState::new(0x01), 9).unwrap();
        assert_eq!(event.total_lost, 9);
        assert!(event.device_state.is_knx_fault());
    }

    #[test]
    fn test_lower_total_resets_baseline() {
        let mut tracker = LossTracker::new();
        tracker.update(DeviceState::new(0), 20);
        // Router restarted and counts from zero again.
        assert_eq!(tracker.update(DeviceState::new(0), 2), None);
        assert!(tracker.update(DeviceState::new(0), 3).is_some());
    }
}
