//! # Key Bridge Library
//!
//! Remap Xbox Elite paddle presses to synthesized keyboard key events.
//!
//! This library provides the core functionality for polling an Elite
//! gamepad, detecting paddle press/release edges, and injecting the bound
//! keyboard keys through a local uinput device or a remote key-sender
//! service.

pub mod config;
pub mod error;
pub mod keys;
pub mod gamepad;
pub mod inject;
pub mod bindings;
pub mod engine;
