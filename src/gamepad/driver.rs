//! # Gamepad Driver Boundary
//!
//! Trait abstraction over the gamepad driver layer to enable testing.
//!
//! The driver exposes device probing, per-device readings, and hotplug
//! notifications. Hotplug is delivered as messages on a bounded channel
//! rather than callbacks; the session drains the channel synchronously at
//! the top of each poll tick, so no rebind ever races another.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::gamepad::button::{GamepadReading, SlotId};

/// Stable identity for one physical device, used to match hotplug removal
/// notifications against the device a session currently holds.
pub type DeviceHandle = String;

/// A device connectivity notification from the driver layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotplugEvent {
    /// A gamepad was connected.
    Added(DeviceHandle),
    /// A gamepad was disconnected.
    Removed(DeviceHandle),
}

/// Capacity of the hotplug notification channel.
///
/// Notification delivery can lag actual device state, and the scheduler
/// re-verifies readiness every tick anyway, so dropped events are harmless.
pub const HOTPLUG_CHANNEL_CAPACITY: usize = 16;

/// Creates the bounded hotplug channel shared between a driver-side
/// watcher and a [`crate::gamepad::GamepadSession`].
pub fn hotplug_channel() -> (mpsc::Sender<HotplugEvent>, mpsc::Receiver<HotplugEvent>) {
    mpsc::channel(HOTPLUG_CHANNEL_CAPACITY)
}

/// Computes hotplug events from a fresh presence snapshot.
///
/// `known` is the watcher's view of the connected devices; it is updated
/// to match `present`. Devices in `known` but not `present` yield
/// `Removed`, the reverse yields `Added`. Removals are reported first so
/// a replug that lands on a new handle tears down before it rebinds.
pub fn diff_presence(
    known: &mut HashSet<DeviceHandle>,
    present: &HashSet<DeviceHandle>,
) -> Vec<HotplugEvent> {
    let mut events: Vec<HotplugEvent> = known
        .difference(present)
        .cloned()
        .map(HotplugEvent::Removed)
        .collect();
    events.extend(present.difference(known).cloned().map(HotplugEvent::Added));
    known.clone_from(present);
    events
}

/// An open connection to one physical gamepad.
pub trait GamepadDevice: Send {
    /// The identity handle of this device.
    fn handle(&self) -> &DeviceHandle;

    /// The driver-reported friendly name.
    fn friendly_name(&self) -> &str;

    /// The slot the device occupies.
    fn slot(&self) -> SlotId;

    /// The latest hardware reading.
    ///
    /// # Errors
    ///
    /// Returns `Gamepad` error if the device has gone away mid-call.
    fn read(&mut self) -> Result<GamepadReading>;
}

/// Driver operations for enumerating and opening gamepads.
pub trait GamepadDriver: Send {
    /// Probes for a connected gamepad, returning the first one enumerated.
    ///
    /// Returns `None` when no driver is loaded or no device is present;
    /// absence is a normal operating state, not an error.
    fn probe(&mut self) -> Option<Box<dyn GamepadDevice>>;

    /// Opens the device a hotplug notification referred to, if it is still
    /// present.
    fn open(&mut self, handle: &DeviceHandle) -> Option<Box<dyn GamepadDevice>>;
}


#[cfg(test)]
mod tests {
    use super::*;

    fn handles(names: &[&str]) -> HashSet<DeviceHandle> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_diff_first_scan_reports_additions() {
        let mut known = HashSet::new();
        let events = diff_presence(&mut known, &handles(&["pad-a"]));
        assert_eq!(events, vec![HotplugEvent::Added("pad-a".to_string())]);
        assert_eq!(known, handles(&["pad-a"]));
    }

    #[test]
    fn test_diff_steady_state_is_silent() {
        let mut known = handles(&["pad-a"]);
        let events = diff_presence(&mut known, &handles(&["pad-a"]));
        assert!(events.is_empty());
    }

    #[test]
    fn test_diff_disappearance_reports_removal() {
        let mut known = handles(&["pad-a"]);
        let events = diff_presence(&mut known, &handles(&[]));
        assert_eq!(events, vec![HotplugEvent::Removed("pad-a".to_string())]);
        assert!(known.is_empty());
    }

    #[test]
    fn test_diff_replug_on_new_handle_removes_before_adding() {
        let mut known = handles(&["pad-a"]);
        let events = diff_presence(&mut known, &handles(&["pad-b"]));
        assert_eq!(
            events,
            vec![
                HotplugEvent::Removed("pad-a".to_string()),
                HotplugEvent::Added("pad-b".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_feeds_session_through_channel() {
        // The watcher's events arrive on the same channel the session
        // drains; a full round trip disconnect-then-reconnect
        let (tx, mut rx) = hotplug_channel();
        let mut known = handles(&["pad-a"]);

        for event in diff_presence(&mut known, &handles(&[])) {
            tx.try_send(event).unwrap();
        }
        for event in diff_presence(&mut known, &handles(&["pad-a"])) {
            tx.try_send(event).unwrap();
        }

        assert_eq!(
            rx.try_recv().unwrap(),
            HotplugEvent::Removed("pad-a".to_string())
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            HotplugEvent::Added("pad-a".to_string())
        );
    }
}
