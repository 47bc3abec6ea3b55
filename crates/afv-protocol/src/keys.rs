//! Push-to-talk key codes
//!
//! Bound keys are persisted as integers from the libuiohook virtual key
//! table, so existing configuration files keep working regardless of which
//! hook backend produced the event. Platform keys with no entry in the table
//! are carried as [`KeyCode::raw`] codes above [`RAW_KEY_BASE`].

use std::fmt;

/// Offset for platform key codes that have no virtual key equivalent
pub const RAW_KEY_BASE: u32 = 0x1_0000;

/// A global keyboard key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// The "nothing bound" sentinel. Never matches any key event.
    pub const UNBOUND: KeyCode = KeyCode(0);

    /// Wrap a platform scan code that has no virtual key mapping
    pub fn raw(code: u32) -> Self {
        KeyCode(RAW_KEY_BASE.saturating_add(code))
    }

    /// Get the raw integer value
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Whether this code refers to a real key
    pub fn is_bound(&self) -> bool {
        *self != Self::UNBOUND
    }

    /// Human-readable key name
    pub fn name(&self) -> String {
        if !self.is_bound() {
            return "Not bound".to_string();
        }
        match KEY_NAMES.iter().find(|(code, _)| *code == self.0) {
            Some((_, name)) => (*name).to_string(),
            None if self.0 >= RAW_KEY_BASE => format!("Key 0x{:X}", self.0 - RAW_KEY_BASE),
            None => format!("Key {}", self.0),
        }
    }
}

impl From<u32> for KeyCode {
    fn from(code: u32) -> Self {
        KeyCode(code)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Virtual key codes (libuiohook numbering)
pub mod vc {
    pub const ESCAPE: u32 = 0x0001;
    pub const F1: u32 = 0x003B;
    pub const F2: u32 = 0x003C;
    pub const F3: u32 = 0x003D;
    pub const F4: u32 = 0x003E;
    pub const F5: u32 = 0x003F;
    pub const F6: u32 = 0x0040;
    pub const F7: u32 = 0x0041;
    pub const F8: u32 = 0x0042;
    pub const F9: u32 = 0x0043;
    pub const F10: u32 = 0x0044;
    pub const F11: u32 = 0x0057;
    pub const F12: u32 = 0x0058;

    pub const BACKQUOTE: u32 = 0x0029;
    pub const NUM_1: u32 = 0x0002;
    pub const NUM_2: u32 = 0x0003;
    pub const NUM_3: u32 = 0x0004;
    pub const NUM_4: u32 = 0x0005;
    pub const NUM_5: u32 = 0x0006;
    pub const NUM_6: u32 = 0x0007;
    pub const NUM_7: u32 = 0x0008;
    pub const NUM_8: u32 = 0x0009;
    pub const NUM_9: u32 = 0x000A;
    pub const NUM_0: u32 = 0x000B;
    pub const MINUS: u32 = 0x000C;
    pub const EQUALS: u32 = 0x000D;
    pub const BACKSPACE: u32 = 0x000E;

    pub const TAB: u32 = 0x000F;
    pub const CAPS_LOCK: u32 = 0x003A;

    pub const A: u32 = 0x001E;
    pub const B: u32 = 0x0030;
    pub const C: u32 = 0x002E;
    pub const D: u32 = 0x0020;
    pub const E: u32 = 0x0012;
    pub const F: u32 = 0x0021;
    pub const G: u32 = 0x0022;
    pub const H: u32 = 0x0023;
    pub const I: u32 = 0x0017;
    pub const J: u32 = 0x0024;
    pub const K: u32 = 0x0025;
    pub const L: u32 = 0x0026;
    pub const M: u32 = 0x0032;
    pub const N: u32 = 0x0031;
    pub const O: u32 = 0x0018;
    pub const P: u32 = 0x0019;
    pub const Q: u32 = 0x0010;
    pub const R: u32 = 0x0013;
    pub const S: u32 = 0x001F;
    pub const T: u32 = 0x0014;
    pub const U: u32 = 0x0016;
    pub const V: u32 = 0x002F;
    pub const W: u32 = 0x0011;
    pub const X: u32 = 0x002D;
    pub const Y: u32 = 0x0015;
    pub const Z: u32 = 0x002C;

    pub const OPEN_BRACKET: u32 = 0x001A;
    pub const CLOSE_BRACKET: u32 = 0x001B;
    pub const BACK_SLASH: u32 = 0x002B;
    pub const SEMICOLON: u32 = 0x0027;
    pub const QUOTE: u32 = 0x0028;
    pub const ENTER: u32 = 0x001C;
    pub const COMMA: u32 = 0x0033;
    pub const PERIOD: u32 = 0x0034;
    pub const SLASH: u32 = 0x0035;
    pub const SPACE: u32 = 0x0039;

    pub const PRINTSCREEN: u32 = 0x0E37;
    pub const SCROLL_LOCK: u32 = 0x0046;
    pub const PAUSE: u32 = 0x0E45;

    pub const INSERT: u32 = 0x0E52;
    pub const DELETE: u32 = 0x0E53;
    pub const HOME: u32 = 0x0E47;
    pub const END: u32 = 0x0E4F;
    pub const PAGE_UP: u32 = 0x0E49;
    pub const PAGE_DOWN: u32 = 0x0E51;

    pub const UP: u32 = 0xE048;
    pub const LEFT: u32 = 0xE04B;
    pub const RIGHT: u32 = 0xE04D;
    pub const DOWN: u32 = 0xE050;

    pub const NUM_LOCK: u32 = 0x0045;
    pub const KP_DIVIDE: u32 = 0x0E35;
    pub const KP_MULTIPLY: u32 = 0x0037;
    pub const KP_SUBTRACT: u32 = 0x004A;
    pub const KP_ADD: u32 = 0x004E;
    pub const KP_ENTER: u32 = 0x0E1C;
    pub const KP_SEPARATOR: u32 = 0x0053;
    pub const KP_1: u32 = 0x004F;
    pub const KP_2: u32 = 0x0050;
    pub const KP_3: u32 = 0x0051;
    pub const KP_4: u32 = 0x004B;
    pub const KP_5: u32 = 0x004C;
    pub const KP_6: u32 = 0x004D;
    pub const KP_7: u32 = 0x0047;
    pub const KP_8: u32 = 0x0048;
    pub const KP_9: u32 = 0x0049;
    pub const KP_0: u32 = 0x0052;

    pub const SHIFT_L: u32 = 0x002A;
    pub const SHIFT_R: u32 = 0x0036;
    pub const CONTROL_L: u32 = 0x001D;
    pub const CONTROL_R: u32 = 0x0E1D;
    pub const ALT_L: u32 = 0x0038;
    pub const ALT_R: u32 = 0x0E38;
    pub const META_L: u32 = 0x0E5B;
    pub const META_R: u32 = 0x0E5C;
}

const KEY_NAMES: &[(u32, &str)] = &[
    (vc::ESCAPE, "Escape"),
    (vc::F1, "F1"),
    (vc::F2, "F2"),
    (vc::F3, "F3"),
    (vc::F4, "F4"),
    (vc::F5, "F5"),
    (vc::F6, "F6"),
    (vc::F7, "F7"),
    (vc::F8, "F8"),
    (vc::F9, "F9"),
    (vc::F10, "F10"),
    (vc::F11, "F11"),
    (vc::F12, "F12"),
    (vc::BACKQUOTE, "`"),
    (vc::NUM_1, "1"),
    (vc::NUM_2, "2"),
    (vc::NUM_3, "3"),
    (vc::NUM_4, "4"),
    (vc::NUM_5, "5"),
    (vc::NUM_6, "6"),
    (vc::NUM_7, "7"),
    (vc::NUM_8, "8"),
    (vc::NUM_9, "9"),
    (vc::NUM_0, "0"),
    (vc::MINUS, "-"),
    (vc::EQUALS, "="),
    (vc::BACKSPACE, "Backspace"),
    (vc::TAB, "Tab"),
    (vc::CAPS_LOCK, "Caps Lock"),
    (vc::A, "A"),
    (vc::B, "B"),
    (vc::C, "C"),
    (vc::D, "D"),
    (vc::E, "E"),
    (vc::F, "F"),
    (vc::G, "G"),
    (vc::H, "H"),
    (vc::I, "I"),
    (vc::J, "J"),
    (vc::K, "K"),
    (vc::L, "L"),
    (vc::M, "M"),
    (vc::N, "N"),
    (vc::O, "O"),
    (vc::P, "P"),
    (vc::Q, "Q"),
    (vc::R, "R"),
    (vc::S, "S"),
    (vc::T, "T"),
    (vc::U, "U"),
    (vc::V, "V"),
    (vc::W, "W"),
    (vc::X, "X"),
    (vc::Y, "Y"),
    (vc::Z, "Z"),
    (vc::OPEN_BRACKET, "["),
    (vc::CLOSE_BRACKET, "]"),
    (vc::BACK_SLASH, "\\"),
    (vc::SEMICOLON, ";"),
    (vc::QUOTE, "'"),
    (vc::ENTER, "Enter"),
    (vc::COMMA, ","),
    (vc::PERIOD, "."),
    (vc::SLASH, "/"),
    (vc::SPACE, "Space"),
    (vc::PRINTSCREEN, "Print Screen"),
    (vc::SCROLL_LOCK, "Scroll Lock"),
    (vc::PAUSE, "Pause"),
    (vc::INSERT, "Insert"),
    (vc::DELETE, "Delete"),
    (vc::HOME, "Home"),
    (vc::END, "End"),
    (vc::PAGE_UP, "Page Up"),
    (vc::PAGE_DOWN, "Page Down"),
    (vc::UP, "Up"),
    (vc::LEFT, "Left"),
    (vc::RIGHT, "Right"),
    (vc::DOWN, "Down"),
    (vc::NUM_LOCK, "Num Lock"),
    (vc::KP_DIVIDE, "Numpad /"),
    (vc::KP_MULTIPLY, "Numpad *"),
    (vc::KP_SUBTRACT, "Numpad -"),
    (vc::KP_ADD, "Numpad +"),
    (vc::KP_ENTER, "Numpad Enter"),
    (vc::KP_SEPARATOR, "Numpad ."),
    (vc::KP_1, "Numpad 1"),
    (vc::KP_2, "Numpad 2"),
    (vc::KP_3, "Numpad 3"),
    (vc::KP_4, "Numpad 4"),
    (vc::KP_5, "Numpad 5"),
    (vc::KP_6, "Numpad 6"),
    (vc::KP_7, "Numpad 7"),
    (vc::KP_8, "Numpad 8"),
    (vc::KP_9, "Numpad 9"),
    (vc::KP_0, "Numpad 0"),
    (vc::SHIFT_L, "Left Shift"),
    (vc::SHIFT_R, "Right Shift"),
    (vc::CONTROL_L, "Left Ctrl"),
    (vc::CONTROL_R, "Right Ctrl"),
    (vc::ALT_L, "Left Alt"),
    (vc::ALT_R, "Right Alt"),
    (vc::META_L, "Left Meta"),
    (vc::META_R, "Right Meta"),
];
