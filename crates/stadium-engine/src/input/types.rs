use std::fmt;

/// Keyboard key identifier.
///
/// Only keys the renderer reacts to (plus a few common ones) are named.
/// Anything else travels as `Key::Unknown` with its virtual-key code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Shift,
    Control,
    Alt,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    /// Platform virtual-key code not represented above.
    Unknown(u32),
}

impl Key {
    const LETTERS: [Key; 26] = [
        Key::A, Key::B, Key::C, Key::D, Key::E, Key::F, Key::G, Key::H, Key::I,
        Key::J, Key::K, Key::L, Key::M, Key::N, Key::O, Key::P, Key::Q, Key::R,
        Key::S, Key::T, Key::U, Key::V, Key::W, Key::X, Key::Y, Key::Z,
    ];

    const DIGITS: [Key; 10] = [
        Key::Digit0, Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4,
        Key::Digit5, Key::Digit6, Key::Digit7, Key::Digit8, Key::Digit9,
    ];

    /// Slot of this key in the 256-entry key table.
    ///
    /// Letters and digits use their upper-case ASCII code, the rest follow the
    /// usual virtual-key numbering. Returns `None` for unknown codes that do
    /// not fit the table.
    pub fn code(self) -> Option<u8> {
        let code = match self {
            Key::Backspace => 0x08,
            Key::Tab => 0x09,
            Key::Enter => 0x0D,
            Key::Shift => 0x10,
            Key::Control => 0x11,
            Key::Alt => 0x12,
            Key::Escape => 0x1B,
            Key::Space => 0x20,
            Key::ArrowLeft => 0x25,
            Key::ArrowUp => 0x26,
            Key::ArrowRight => 0x27,
            Key::ArrowDown => 0x28,
            Key::Unknown(code) => return u8::try_from(code).ok(),
            other => {
                if let Some(i) = Self::LETTERS.iter().position(|k| *k == other) {
                    b'A' + i as u8
                } else {
                    let i = Self::DIGITS.iter().position(|k| *k == other)?;
                    b'0' + i as u8
                }
            }
        };
        Some(code)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MouseButtonState {
    Pressed,
    Released,
}

/// Pointer move event in window pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerMoveEvent {
    pub x: f32,
    pub y: f32,
}

/// Pointer button event, with the pointer position at the time of the press.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerButtonEvent {
    pub button: MouseButton,
    pub state: MouseButtonState,
    pub x: f32,
    pub y: f32,
}

/// Platform-agnostic input events, translated by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { key: Key, state: KeyState },

    PointerMoved(PointerMoveEvent),
    PointerButton(PointerButtonEvent),

    /// Pointer left the window surface.
    PointerLeft,

    /// Window focus change.
    Focused(bool),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_use_ascii_slots() {
        assert_eq!(Key::W.code(), Some(b'W'));
        assert_eq!(Key::A.code(), Some(0x41));
        assert_eq!(Key::X.code(), Some(0x58));
        assert_eq!(Key::Space.code(), Some(0x20));
        assert_eq!(Key::Digit7.code(), Some(b'7'));
    }

    #[test]
    fn unknown_codes_outside_the_table_are_dropped() {
        assert_eq!(Key::Unknown(0xA0).code(), Some(0xA0));
        assert_eq!(Key::Unknown(0x1_0000).code(), None);
    }
}
