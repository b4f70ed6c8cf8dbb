//! # Edge Detection
//!
//! Pure computation of press/release edges between two readings.
//!
//! Keeping this stateless - the caller owns the pressed set and the
//! previous reading - makes the transition logic independently testable
//! and keeps the scheduler's tick body a straight pipeline.

use crate::gamepad::button::ButtonMask;

/// The edges produced by comparing two consecutive readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeReport {
    /// True iff the current reading duplicates the previous one
    /// (equal timestamps). No processing should occur and no state
    /// should change.
    pub skip: bool,
    /// Buttons newly pressed: set now, not set before, and not already
    /// tracked in the pressed set (guards against double-fire if a tick
    /// is re-entered).
    pub pressed: ButtonMask,
    /// Buttons newly released: tracked in the pressed set but absent from
    /// the current mask.
    pub released: ButtonMask,
}

impl EdgeReport {
    /// A report with no edges and no skip.
    pub const NONE: EdgeReport = EdgeReport {
        skip: false,
        pressed: ButtonMask::EMPTY,
        released: ButtonMask::EMPTY,
    };
}

/// Computes press/release edges between consecutive readings.
///
/// The caller is responsible for updating its pressed set afterwards:
/// insert every paddle in `pressed`, remove every paddle in `released`.
///
/// # Examples
///
/// ```
/// use key_bridge::engine::edges::detect_edges;
/// use key_bridge::gamepad::{ButtonMask, PaddleButton};
///
/// let report = detect_edges(
///     ButtonMask::EMPTY,
///     ButtonMask::from(PaddleButton::Paddle1),
///     10,
///     20,
///     ButtonMask::EMPTY,
/// );
/// assert!(!report.skip);
/// assert!(report.pressed.contains(PaddleButton::Paddle1));
/// assert!(report.released.is_empty());
/// ```
#[must_use]
pub fn detect_edges(
    previous_mask: ButtonMask,
    current_mask: ButtonMask,
    previous_timestamp: u64,
    current_timestamp: u64,
    pressed_set: ButtonMask,
) -> EdgeReport {
    if current_timestamp == previous_timestamp {
        return EdgeReport {
            skip: true,
            ..EdgeReport::NONE
        };
    }

    let pressed = current_mask
        .difference(previous_mask)
        .difference(pressed_set);
    let released = pressed_set.difference(current_mask);

    EdgeReport {
        skip: false,
        pressed,
        released,
    }
}
