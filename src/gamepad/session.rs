//! # Gamepad Session
//!
//! Supervises the connection to one physical gamepad.
//!
//! A session is constructed once and handed to the scheduler; the device
//! inside it comes and goes. Binding is lazy: the scheduler calls
//! [`GamepadSession::try_bind`] on ticks where no device is held, and a
//! failed read or a matching removal notification flips the session back
//! to not-ready. The session never searches for a replacement on its own -
//! hotplug delivery can lag actual device state, so readiness is
//! re-verified every tick instead of trusting events alone.

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{KeyBridgeError, Result};
use crate::gamepad::button::{GamepadReading, SlotId};
use crate::gamepad::driver::{GamepadDevice, GamepadDriver, HotplugEvent};

/// Owns the connection to one physical gamepad.
pub struct GamepadSession {
    driver: Box<dyn GamepadDriver>,
    device: Option<Box<dyn GamepadDevice>>,
    hotplug: mpsc::Receiver<HotplugEvent>,
}

impl GamepadSession {
    /// Creates a session with no device bound.
    ///
    /// `hotplug` is the driver layer's notification channel; the session
    /// drains it synchronously via [`GamepadSession::drain_hotplug`].
    pub fn new(driver: Box<dyn GamepadDriver>, hotplug: mpsc::Receiver<HotplugEvent>) -> Self {
        Self {
            driver,
            device: None,
            hotplug,
        }
    }

    /// True once a device is bound and has not since been removed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.device.is_some()
    }

    /// Probes the driver for a connected device and binds to it.
    ///
    /// Returns true if the session is ready afterwards. A session that is
    /// already ready stays bound to its current device.
    pub fn try_bind(&mut self) -> bool {
        if self.device.is_some() {
            return true;
        }

        match self.driver.probe() {
            Some(device) => {
                info!(
                    "Bound gamepad \"{}\" ({})",
                    device.friendly_name(),
                    device.slot()
                );
                self.device = Some(device);
                true
            }
            None => false,
        }
    }

    /// The slot of the currently bound device.
    ///
    /// # Errors
    ///
    /// Returns [`KeyBridgeError::GamepadNotReady`] if no device is bound;
    /// calling this while not ready is a contract violation at the call
    /// site.
    pub fn current_slot(&self) -> Result<SlotId> {
        self.device
            .as_ref()
            .map(|device| device.slot())
            .ok_or(KeyBridgeError::GamepadNotReady)
    }

    /// The latest hardware reading from the bound device.
    ///
    /// # Errors
    ///
    /// Returns [`KeyBridgeError::GamepadNotReady`] if no device is bound,
    /// or a `Gamepad` error if the device went away mid-read. The caller
    /// should [`GamepadSession::invalidate`] on the latter and skip the
    /// tick.
    pub fn read(&mut self) -> Result<GamepadReading> {
        self.device
            .as_mut()
            .ok_or(KeyBridgeError::GamepadNotReady)?
            .read()
    }

    /// Discards the bound device; the next tick rediscovers via
    /// [`GamepadSession::try_bind`].
    pub fn invalidate(&mut self) {
        if self.device.take().is_some() {
            warn!("Gamepad invalidated, awaiting rediscovery");
        }
    }

    /// Drains pending hotplug notifications.
    ///
    /// "Added" binds only when no device is currently held; "Removed"
    /// flips the session to not-ready only when the handle matches the
    /// held device. Draining happens on the scheduler's context, so two
    /// notifications can never race each other into a half-bound state.
    pub fn drain_hotplug(&mut self) {
        while let Ok(event) = self.hotplug.try_recv() {
            match event {
                HotplugEvent::Added(handle) => {
                    if self.device.is_none() {
                        if let Some(device) = self.driver.open(&handle) {
                            info!(
                                "Hotplug: bound gamepad \"{}\" ({})",
                                device.friendly_name(),
                                device.slot()
                            );
                            self.device = Some(device);
                        }
                    }
                }
                HotplugEvent::Removed(handle) => {
                    let matches = self
                        .device
                        .as_ref()
                        .map(|device| *device.handle() == handle)
                        .unwrap_or(false);
                    if matches {
                        warn!("Hotplug: gamepad {} removed", handle);
                        self.device = None;
                    }
                }
            }
        }
    }
}
