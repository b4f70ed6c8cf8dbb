//! # Virtual Key Codes
//!
//! Platform-independent identifiers for keyboard keys.
//!
//! A [`KeyCode`] names one keyboard key. Its numeric value follows the
//! Windows virtual-key numbering, which is what the remote key-sender
//! endpoint expects on the wire; the local uinput transport instead needs
//! the evdev scan code, resolved by [`KeyCode::scan_code`]. Bindings are
//! persisted by key *name* (see [`std::fmt::Display`] / [`std::str::FromStr`]),
//! so stored settings stay readable and survive renumbering.

use std::fmt;
use std::str::FromStr;

use evdev::Key;

/// A keyboard key, identified by its virtual-key code.
///
/// # Examples
///
/// ```
/// use key_bridge::keys::KeyCode;
///
/// assert_eq!(KeyCode::A.virtual_key(), 0x41);
/// assert_eq!(KeyCode::A.to_string(), "A");
/// assert_eq!("Space".parse::<KeyCode>().unwrap(), KeyCode::Space);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum KeyCode {
    // Letters (VK 0x41..=0x5A)
    A = 0x41,
    B = 0x42,
    C = 0x43,
    D = 0x44,
    E = 0x45,
    F = 0x46,
    G = 0x47,
    H = 0x48,
    I = 0x49,
    J = 0x4A,
    K = 0x4B,
    L = 0x4C,
    M = 0x4D,
    N = 0x4E,
    O = 0x4F,
    P = 0x50,
    Q = 0x51,
    R = 0x52,
    S = 0x53,
    T = 0x54,
    U = 0x55,
    V = 0x56,
    W = 0x57,
    X = 0x58,
    Y = 0x59,
    Z = 0x5A,

    // Digits (VK 0x30..=0x39)
    Number0 = 0x30,
    Number1 = 0x31,
    Number2 = 0x32,
    Number3 = 0x33,
    Number4 = 0x34,
    Number5 = 0x35,
    Number6 = 0x36,
    Number7 = 0x37,
    Number8 = 0x38,
    Number9 = 0x39,

    // Function keys (VK 0x70..=0x7B)
    F1 = 0x70,
    F2 = 0x71,
    F3 = 0x72,
    F4 = 0x73,
    F5 = 0x74,
    F6 = 0x75,
    F7 = 0x76,
    F8 = 0x77,
    F9 = 0x78,
    F10 = 0x79,
    F11 = 0x7A,
    F12 = 0x7B,

    // Editing and whitespace
    Back = 0x08,
    Tab = 0x09,
    Enter = 0x0D,
    Escape = 0x1B,
    Space = 0x20,

    // Arrows
    Left = 0x25,
    Up = 0x26,
    Right = 0x27,
    Down = 0x28,

    // Modifiers
    LeftShift = 0xA0,
    RightShift = 0xA1,
    LeftControl = 0xA2,
    RightControl = 0xA3,
    LeftAlt = 0xA4,
    RightAlt = 0xA5,
}

/// All supported key codes, used to pre-register the uinput device keys.
pub const ALL_KEYS: &[KeyCode] = &[
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
    KeyCode::K,
    KeyCode::L,
    KeyCode::M,
    KeyCode::N,
    KeyCode::O,
    KeyCode::P,
    KeyCode::Q,
    KeyCode::R,
    KeyCode::S,
    KeyCode::T,
    KeyCode::U,
    KeyCode::V,
    KeyCode::W,
    KeyCode::X,
    KeyCode::Y,
    KeyCode::Z,
    KeyCode::Number0,
    KeyCode::Number1,
    KeyCode::Number2,
    KeyCode::Number3,
    KeyCode::Number4,
    KeyCode::Number5,
    KeyCode::Number6,
    KeyCode::Number7,
    KeyCode::Number8,
    KeyCode::Number9,
    KeyCode::F1,
    KeyCode::F2,
    KeyCode::F3,
    KeyCode::F4,
    KeyCode::F5,
    KeyCode::F6,
    KeyCode::F7,
    KeyCode::F8,
    KeyCode::F9,
    KeyCode::F10,
    KeyCode::F11,
    KeyCode::F12,
    KeyCode::Back,
    KeyCode::Tab,
    KeyCode::Enter,
    KeyCode::Escape,
    KeyCode::Space,
    KeyCode::Left,
    KeyCode::Up,
    KeyCode::Right,
    KeyCode::Down,
    KeyCode::LeftShift,
    KeyCode::RightShift,
    KeyCode::LeftControl,
    KeyCode::RightControl,
    KeyCode::LeftAlt,
    KeyCode::RightAlt,
];

impl KeyCode {
    /// The virtual-key code sent to the remote key-sender service.
    #[must_use]
    pub fn virtual_key(self) -> u16 {
        self as u16
    }

    /// Resolve the evdev scan code for this key.
    ///
    /// This lookup is the per-key cost that the injector's descriptor cache
    /// exists to amortize; callers should go through
    /// [`crate::inject::KeyInjector`] rather than resolving per event.
    #[must_use]
    pub fn scan_code(self) -> u16 {
        let key = match self {
            KeyCode::A => Key::KEY_A,
            KeyCode::B => Key::KEY_B,
            KeyCode::C => Key::KEY_C,
            KeyCode::D => Key::KEY_D,
            KeyCode::E => Key::KEY_E,
            KeyCode::F => Key::KEY_F,
            KeyCode::G => Key::KEY_G,
            KeyCode::H => Key::KEY_H,
            KeyCode::I => Key::KEY_I,
            KeyCode::J => Key::KEY_J,
            KeyCode::K => Key::KEY_K,
            KeyCode::L => Key::KEY_L,
            KeyCode::M => Key::KEY_M,
            KeyCode::N => Key::KEY_N,
            KeyCode::O => Key::KEY_O,
            KeyCode::P => Key::KEY_P,
            KeyCode::Q => Key::KEY_Q,
            KeyCode::R => Key::KEY_R,
            KeyCode::S => Key::KEY_S,
            KeyCode::T => Key::KEY_T,
            KeyCode::U => Key::KEY_U,
            KeyCode::V => Key::KEY_V,
            KeyCode::W => Key::KEY_W,
            KeyCode::X => Key::KEY_X,
            KeyCode::Y => Key::KEY_Y,
            KeyCode::Z => Key::KEY_Z,
            KeyCode::Number0 => Key::KEY_0,
            KeyCode::Number1 => Key::KEY_1,
            KeyCode::Number2 => Key::KEY_2,
            KeyCode::Number3 => Key::KEY_3,
            KeyCode::Number4 => Key::KEY_4,
            KeyCode::Number5 => Key::KEY_5,
            KeyCode::Number6 => Key::KEY_6,
            KeyCode::Number7 => Key::KEY_7,
            KeyCode::Number8 => Key::KEY_8,
            KeyCode::Number9 => Key::KEY_9,
            KeyCode::F1 => Key::KEY_F1,
            KeyCode::F2 => Key::KEY_F2,
            KeyCode::F3 => Key::KEY_F3,
            KeyCode::F4 => Key::KEY_F4,
            KeyCode::F5 => Key::KEY_F5,
            KeyCode::F6 => Key::KEY_F6,
            KeyCode::F7 => Key::KEY_F7,
            KeyCode::F8 => Key::KEY_F8,
            KeyCode::F9 => Key::KEY_F9,
            KeyCode::F10 => Key::KEY_F10,
            KeyCode::F11 => Key::KEY_F11,
            KeyCode::F12 => Key::KEY_F12,
            KeyCode::Back => Key::KEY_BACKSPACE,
            KeyCode::Tab => Key::KEY_TAB,
            KeyCode::Enter => Key::KEY_ENTER,
            KeyCode::Escape => Key::KEY_ESC,
            KeyCode::Space => Key::KEY_SPACE,
            KeyCode::Left => Key::KEY_LEFT,
            KeyCode::Up => Key::KEY_UP,
            KeyCode::Right => Key::KEY_RIGHT,
            KeyCode::Down => Key::KEY_DOWN,
            KeyCode::LeftShift => Key::KEY_LEFTSHIFT,
            KeyCode::RightShift => Key::KEY_RIGHTSHIFT,
            KeyCode::LeftControl => Key::KEY_LEFTCTRL,
            KeyCode::RightControl => Key::KEY_RIGHTCTRL,
            KeyCode::LeftAlt => Key::KEY_LEFTALT,
            KeyCode::RightAlt => Key::KEY_RIGHTALT,
        };
        key.code()
    }
}

impl fmt::Display for KeyCode {
    /// Formats the key as its stable name, the form stored by the binding
    /// store.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error returned when parsing an unknown key name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKeyName(pub String);

impl fmt::Display for UnknownKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key name: {}", self.0)
    }
}

impl std::error::Error for UnknownKeyName {}

impl FromStr for KeyCode {
    type Err = UnknownKeyName;

    /// Parses a key from the name produced by [`fmt::Display`].
    ///
    /// Unknown names fail with [`UnknownKeyName`]; the binding store maps
    /// that to "no binding" rather than surfacing an error.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| format!("{:?}", key) == s)
            .ok_or_else(|| UnknownKeyName(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_key_values() {
        // Spot-check the VK numbering used on the remote wire
        assert_eq!(KeyCode::A.virtual_key(), 0x41);
        assert_eq!(KeyCode::Z.virtual_key(), 0x5A);
        assert_eq!(KeyCode::Number0.virtual_key(), 0x30);
        assert_eq!(KeyCode::Space.virtual_key(), 0x20);
        assert_eq!(KeyCode::F12.virtual_key(), 0x7B);
        assert_eq!(KeyCode::LeftShift.virtual_key(), 0xA0);
    }

    #[test]
    fn test_name_round_trip_for_all_keys() {
        for &key in ALL_KEYS {
            let name = key.to_string();
            let parsed: KeyCode = name.parse().unwrap_or_else(|_| {
                panic!("Key {} should parse back from its own name", name)
            });
            assert_eq!(parsed, key, "Round trip failed for {}", name);
        }
    }

    #[test]
    fn test_parse_unknown_name_fails() {
        let result = "NotAKey".parse::<KeyCode>();
        assert_eq!(result, Err(UnknownKeyName("NotAKey".to_string())));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        // Stored names are exact; "space" is not a valid stored value
        assert!("space".parse::<KeyCode>().is_err());
        assert!("Space".parse::<KeyCode>().is_ok());
    }

    #[test]
    fn test_scan_codes_match_evdev() {
        assert_eq!(KeyCode::A.scan_code(), Key::KEY_A.code());
        assert_eq!(KeyCode::Space.scan_code(), Key::KEY_SPACE.code());
        assert_eq!(KeyCode::Escape.scan_code(), Key::KEY_ESC.code());
        assert_eq!(KeyCode::Back.scan_code(), Key::KEY_BACKSPACE.code());
    }

    #[test]
    fn test_all_keys_have_distinct_virtual_keys() {
        let mut seen = std::collections::HashSet::new();
        for &key in ALL_KEYS {
            assert!(
                seen.insert(key.virtual_key()),
                "Duplicate virtual key for {:?}",
                key
            );
        }
    }

    #[test]
    fn test_all_keys_have_distinct_scan_codes() {
        let mut seen = std::collections::HashSet::new();
        for &key in ALL_KEYS {
            assert!(
                seen.insert(key.scan_code()),
                "Duplicate scan code for {:?}",
                key
            );
        }
    }
}
