//! # Paddle Buttons and Readings
//!
//! Data types for one snapshot of Elite gamepad state.
//!
//! The four rear paddles are the only buttons in scope for remapping; each
//! occupies one bit of a [`ButtonMask`]. A [`GamepadReading`] combines the
//! mask with the hardware timestamp and the four thumbstick axis values
//! (the axes ride along for display but are never remapped).

use std::fmt;
use std::str::FromStr;

/// One of the four rear paddle buttons on the Elite controller.
///
/// Each paddle is a single bit in a [`ButtonMask`].
///
/// # Examples
///
/// ```
/// use key_bridge::gamepad::PaddleButton;
///
/// assert_eq!(PaddleButton::Paddle1.bit(), 0x0001);
/// assert_eq!(PaddleButton::Paddle4.bit(), 0x0008);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PaddleButton {
    /// Upper-left paddle
    Paddle1 = 0x0001,
    /// Upper-right paddle
    Paddle2 = 0x0002,
    /// Lower-left paddle
    Paddle3 = 0x0004,
    /// Lower-right paddle
    Paddle4 = 0x0008,
}

/// All paddles, in mask bit order.
pub const ALL_PADDLES: [PaddleButton; 4] = [
    PaddleButton::Paddle1,
    PaddleButton::Paddle2,
    PaddleButton::Paddle3,
    PaddleButton::Paddle4,
];

impl PaddleButton {
    /// The bit this paddle occupies in a [`ButtonMask`].
    #[must_use]
    pub fn bit(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for PaddleButton {
    /// Formats the paddle as its stable name, the key used by the binding
    /// store.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error returned when parsing an unknown paddle name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaddleName(pub String);

impl fmt::Display for UnknownPaddleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown paddle name: {}", self.0)
    }
}

impl std::error::Error for UnknownPaddleName {}

impl FromStr for PaddleButton {
    type Err = UnknownPaddleName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Paddle1" => Ok(PaddleButton::Paddle1),
            "Paddle2" => Ok(PaddleButton::Paddle2),
            "Paddle3" => Ok(PaddleButton::Paddle3),
            "Paddle4" => Ok(PaddleButton::Paddle4),
            other => Err(UnknownPaddleName(other.to_string())),
        }
    }
}

/// An unsigned bitmask of pressed paddles at a point in time.
///
/// Also used by the engine for its pressed-set bookkeeping (the set of
/// paddles currently considered down, distinct from the raw mask).
///
/// # Examples
///
/// ```
/// use key_bridge::gamepad::{ButtonMask, PaddleButton};
///
/// let mut mask = ButtonMask::EMPTY;
/// mask.insert(PaddleButton::Paddle1);
/// assert!(mask.contains(PaddleButton::Paddle1));
/// assert!(!mask.contains(PaddleButton::Paddle2));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonMask(u16);

impl ButtonMask {
    /// Mask with no paddles set.
    pub const EMPTY: ButtonMask = ButtonMask(0);

    /// Creates a mask from raw bits. Bits outside the paddle range are
    /// preserved but never yielded by [`ButtonMask::iter`].
    #[must_use]
    pub fn from_bits(bits: u16) -> Self {
        ButtonMask(bits)
    }

    /// The raw bits of this mask.
    #[must_use]
    pub fn bits(self) -> u16 {
        self.0
    }

    /// True if no paddle bit is set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if the paddle's bit is set.
    #[must_use]
    pub fn contains(self, paddle: PaddleButton) -> bool {
        self.0 & paddle.bit() != 0
    }

    /// Sets the paddle's bit.
    pub fn insert(&mut self, paddle: PaddleButton) {
        self.0 |= paddle.bit();
    }

    /// Clears the paddle's bit.
    pub fn remove(&mut self, paddle: PaddleButton) {
        self.0 &= !paddle.bit();
    }

    /// Bits set in `self` but not in `other`.
    #[must_use]
    pub fn difference(self, other: ButtonMask) -> ButtonMask {
        ButtonMask(self.0 & !other.0)
    }

    /// Iterates over the paddles whose bits are set, in mask bit order.
    pub fn iter(self) -> impl Iterator<Item = PaddleButton> {
        ALL_PADDLES
            .into_iter()
            .filter(move |paddle| self.contains(*paddle))
    }
}

impl From<PaddleButton> for ButtonMask {
    fn from(paddle: PaddleButton) -> Self {
        ButtonMask(paddle.bit())
    }
}

impl std::ops::BitOr for ButtonMask {
    type Output = ButtonMask;

    fn bitor(self, rhs: ButtonMask) -> ButtonMask {
        ButtonMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOr<PaddleButton> for ButtonMask {
    type Output = ButtonMask;

    fn bitor(self, rhs: PaddleButton) -> ButtonMask {
        ButtonMask(self.0 | rhs.bit())
    }
}

/// Driver-assigned identifier for the physical port a gamepad occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotId(pub u8);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot{}", self.0)
    }
}

/// One snapshot of gamepad state.
///
/// `timestamp` increases monotonically with hardware activity; two
/// readings with equal timestamps are duplicates and the engine skips the
/// second one entirely. Axis values are raw -1.0..=1.0 thumbstick
/// positions, surfaced to observers but unused by remapping logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamepadReading {
    /// Paddles currently pressed.
    pub buttons: ButtonMask,
    /// Hardware-reported timestamp in microseconds.
    pub timestamp: u64,
    /// Left thumbstick X, -1.0..=1.0.
    pub left_stick_x: f32,
    /// Left thumbstick Y, -1.0..=1.0.
    pub left_stick_y: f32,
    /// Right thumbstick X, -1.0..=1.0.
    pub right_stick_x: f32,
    /// Right thumbstick Y, -1.0..=1.0.
    pub right_stick_y: f32,
    /// Which physical slot the gamepad occupies.
    pub slot: SlotId,
}

impl Default for GamepadReading {
    /// A reading with no paddles pressed and sticks centered.
    fn default() -> Self {
        Self {
            buttons: ButtonMask::EMPTY,
            timestamp: 0,
            left_stick_x: 0.0,
            left_stick_y: 0.0,
            right_stick_x: 0.0,
            right_stick_y: 0.0,
            slot: SlotId(0),
        }
    }
}
