//! # Error Types
//!
//! Custom error types for Key Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Key Bridge
#[derive(Debug, Error)]
pub enum KeyBridgeError {
    /// Gamepad driver or device errors
    #[error("Gamepad error: {0}")]
    Gamepad(String),

    /// Access to a session that holds no device.
    ///
    /// Calling `read()` or `current_slot()` before a device is bound (or
    /// after it was removed) is a contract violation at the call site; the
    /// remapping engine absorbs it only at the tick boundary, where a
    /// removal race makes it an environmental condition.
    #[error("The gamepad is uninitialized or disconnected")]
    GamepadNotReady,

    /// Key injection transport errors
    #[error("Injection error: {0}")]
    Injection(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Key Bridge
pub type Result<T> = std::result::Result<T, KeyBridgeError>;
