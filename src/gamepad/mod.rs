//! # Gamepad Module
//!
//! Xbox Elite gamepad input handling.
//!
//! This module handles:
//! - Paddle button and reading data types
//! - The gamepad driver boundary (device enumeration, readings, hotplug)
//! - The Elite controller evdev backend
//! - Session supervision with hotplug add/remove and lazy rediscovery

pub mod button;
pub mod driver;
pub mod elite;
pub mod session;

pub use button::{ButtonMask, GamepadReading, PaddleButton, SlotId};
pub use driver::{DeviceHandle, GamepadDevice, GamepadDriver, HotplugEvent};
pub use session::GamepadSession;
