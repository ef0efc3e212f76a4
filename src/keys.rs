//! Key codes, scancodes, and input masks
//!
//! Logical key codes are plain integers: printable keys use their uppercase
//! ASCII value, while extended keys (modifiers, arrows, function keys) carry
//! the physical scancode tagged with [`KEY_SCANCODE_MASK`]. This keeps the
//! codes stable across keyboard layouts and lets single-character key
//! bindings resolve with no lookup at all.

use std::collections::HashMap;

use bitflags::bitflags;

/// Logical key code (layout-dependent symbol, uppercased)
pub type KeyCode = i32;

/// Physical key location code (layout-independent)
pub type Scancode = i32;

/// Bit marking a key code derived from a scancode rather than a printable symbol
pub const KEY_SCANCODE_MASK: KeyCode = 1 << 30;

const fn from_scancode(scancode: Scancode) -> KeyCode {
    scancode | KEY_SCANCODE_MASK
}

pub const KEY_BACKSPACE: KeyCode = 8;
pub const KEY_TAB: KeyCode = 9;
pub const KEY_RETURN: KeyCode = 13;
pub const KEY_ESCAPE: KeyCode = 27;
pub const KEY_SPACE: KeyCode = 32;

pub const KEY_F1: KeyCode = from_scancode(SCANCODE_F1);
pub const KEY_F2: KeyCode = from_scancode(SCANCODE_F1 + 1);
pub const KEY_F3: KeyCode = from_scancode(SCANCODE_F1 + 2);
pub const KEY_F4: KeyCode = from_scancode(SCANCODE_F1 + 3);
pub const KEY_F5: KeyCode = from_scancode(SCANCODE_F1 + 4);
pub const KEY_F6: KeyCode = from_scancode(SCANCODE_F1 + 5);
pub const KEY_F7: KeyCode = from_scancode(SCANCODE_F1 + 6);
pub const KEY_F8: KeyCode = from_scancode(SCANCODE_F1 + 7);
pub const KEY_F9: KeyCode = from_scancode(SCANCODE_F1 + 8);
pub const KEY_F10: KeyCode = from_scancode(SCANCODE_F1 + 9);
pub const KEY_F11: KeyCode = from_scancode(SCANCODE_F1 + 10);
pub const KEY_F12: KeyCode = from_scancode(SCANCODE_F1 + 11);

pub const KEY_RIGHT: KeyCode = from_scancode(SCANCODE_RIGHT);
pub const KEY_LEFT: KeyCode = from_scancode(SCANCODE_LEFT);
pub const KEY_DOWN: KeyCode = from_scancode(SCANCODE_DOWN);
pub const KEY_UP: KeyCode = from_scancode(SCANCODE_UP);

pub const KEY_KP_ENTER: KeyCode = from_scancode(SCANCODE_KP_ENTER);
pub const KEY_SELECT: KeyCode = from_scancode(SCANCODE_SELECT);
pub const KEY_RETURN2: KeyCode = from_scancode(SCANCODE_RETURN2);

pub const KEY_LCTRL: KeyCode = from_scancode(SCANCODE_LCTRL);
pub const KEY_LSHIFT: KeyCode = from_scancode(SCANCODE_LCTRL + 1);
pub const KEY_LALT: KeyCode = from_scancode(SCANCODE_LCTRL + 2);
pub const KEY_LGUI: KeyCode = from_scancode(SCANCODE_LCTRL + 3);
pub const KEY_RCTRL: KeyCode = from_scancode(SCANCODE_LCTRL + 4);
pub const KEY_RSHIFT: KeyCode = from_scancode(SCANCODE_LCTRL + 5);
pub const KEY_RALT: KeyCode = from_scancode(SCANCODE_LCTRL + 6);
pub const KEY_RGUI: KeyCode = from_scancode(SCANCODE_LCTRL + 7);

pub const SCANCODE_UNKNOWN: Scancode = 0;
pub const SCANCODE_A: Scancode = 4;
pub const SCANCODE_RETURN: Scancode = 40;
pub const SCANCODE_ESCAPE: Scancode = 41;
pub const SCANCODE_BACKSPACE: Scancode = 42;
pub const SCANCODE_TAB: Scancode = 43;
pub const SCANCODE_SPACE: Scancode = 44;
pub const SCANCODE_F1: Scancode = 58;
pub const SCANCODE_RIGHT: Scancode = 79;
pub const SCANCODE_LEFT: Scancode = 80;
pub const SCANCODE_DOWN: Scancode = 81;
pub const SCANCODE_UP: Scancode = 82;
pub const SCANCODE_KP_ENTER: Scancode = 88;
pub const SCANCODE_SELECT: Scancode = 119;
pub const SCANCODE_RETURN2: Scancode = 158;
pub const SCANCODE_LCTRL: Scancode = 224;
/// "Back" navigation key reported by some mobile platforms
pub const SCANCODE_AC_BACK: Scancode = 270;

bitflags! {
    /// Mouse button mask; raw button ordinal n maps to bit n-1
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MouseButton: u32 {
        const LEFT = 1;
        const MIDDLE = 2;
        const RIGHT = 4;
    }
}

impl MouseButton {
    /// Translates a platform button ordinal (1-based) to its mask bit
    pub fn from_ordinal(ordinal: u8) -> Self {
        if ordinal == 0 {
            return Self::empty();
        }
        Self::from_bits_truncate(1 << (ordinal - 1))
    }
}

bitflags! {
    /// Modifier key class; down if either the left or right variant is down
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Qualifier: u32 {
        const SHIFT = 1;
        const CTRL = 2;
        const ALT = 4;
    }
}

bitflags! {
    /// Hat (directional pad) position as a direction mask; empty = centered
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HatPosition: u8 {
        const UP = 1;
        const RIGHT = 2;
        const DOWN = 4;
        const LEFT = 8;
    }
}

/// Uppercases a printable ASCII key symbol, leaving other codes untouched
pub fn ascii_uppercase(code: KeyCode) -> KeyCode {
    if (97..=122).contains(&code) { code - 32 } else { code }
}

/// Normalizes a raw platform key symbol to a logical key code.
///
/// The mobile "AC back" physical key reports varying symbols across
/// platforms, so it is pinned to escape by scancode.
pub fn normalize_key_code(sym: KeyCode, scancode: Scancode) -> KeyCode {
    if scancode == SCANCODE_AC_BACK {
        KEY_ESCAPE
    } else {
        ascii_uppercase(sym)
    }
}

const NAMED_KEYS: &[(&str, KeyCode)] = &[
    ("SPACE", KEY_SPACE),
    ("LCTRL", KEY_LCTRL),
    ("RCTRL", KEY_RCTRL),
    ("LSHIFT", KEY_LSHIFT),
    ("RSHIFT", KEY_RSHIFT),
    ("LALT", KEY_LALT),
    ("RALT", KEY_RALT),
    ("LGUI", KEY_LGUI),
    ("RGUI", KEY_RGUI),
    ("TAB", KEY_TAB),
    ("RETURN", KEY_RETURN),
    ("RETURN2", KEY_RETURN2),
    ("ENTER", KEY_KP_ENTER),
    ("SELECT", KEY_SELECT),
    ("LEFT", KEY_LEFT),
    ("RIGHT", KEY_RIGHT),
    ("UP", KEY_UP),
    ("DOWN", KEY_DOWN),
    ("F1", KEY_F1),
    ("F2", KEY_F2),
    ("F3", KEY_F3),
    ("F4", KEY_F4),
    ("F5", KEY_F5),
    ("F6", KEY_F6),
    ("F7", KEY_F7),
    ("F8", KEY_F8),
    ("F9", KEY_F9),
    ("F10", KEY_F10),
    ("F11", KEY_F11),
    ("F12", KEY_F12),
];

/// Bidirectional name-to-code table for the non-printable keys.
///
/// Built once when the input manager is constructed and owned by it;
/// single printable characters resolve without consulting the table.
#[derive(Debug)]
pub struct KeyNameTable {
    by_name: HashMap<&'static str, KeyCode>,
    by_code: HashMap<KeyCode, &'static str>,
}

impl KeyNameTable {
    pub fn new() -> Self {
        let mut by_name = HashMap::new();
        let mut by_code = HashMap::new();
        for &(name, code) in NAMED_KEYS {
            by_name.insert(name, code);
            by_code.entry(code).or_insert(name);
        }
        Self { by_name, by_code }
    }

    /// Resolves a key name to its code.
    ///
    /// A single character resolves to its uppercase ASCII value; longer
    /// names are looked up in the table.
    pub fn key_from_name(&self, name: &str) -> Option<KeyCode> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => Some(ascii_uppercase(c as KeyCode)),
            _ => self.by_name.get(name).copied(),
        }
    }

    /// Returns the display name of a key code, or an empty string if unknown
    pub fn key_name(&self, key: KeyCode) -> String {
        if let Some(name) = self.by_code.get(&key) {
            return (*name).to_string();
        }
        match u8::try_from(key) {
            Ok(byte) if byte.is_ascii_graphic() => (byte as char).to_string(),
            _ => String::new(),
        }
    }
}

impl Default for KeyNameTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a logical key code to its physical scancode, if one is known
pub fn scancode_from_key(key: KeyCode) -> Scancode {
    if key & KEY_SCANCODE_MASK != 0 {
        return key & !KEY_SCANCODE_MASK;
    }
    match ascii_uppercase(key) {
        k @ 65..=90 => SCANCODE_A + (k - 65),
        KEY_RETURN => SCANCODE_RETURN,
        KEY_ESCAPE => SCANCODE_ESCAPE,
        KEY_BACKSPACE => SCANCODE_BACKSPACE,
        KEY_TAB => SCANCODE_TAB,
        KEY_SPACE => SCANCODE_SPACE,
        _ => SCANCODE_UNKNOWN,
    }
}

/// Maps a physical scancode back to its logical key code
pub fn key_from_scancode(scancode: Scancode) -> KeyCode {
    match scancode {
        s @ 4..=29 => 65 + (s - SCANCODE_A),
        SCANCODE_RETURN => KEY_RETURN,
        SCANCODE_ESCAPE => KEY_ESCAPE,
        SCANCODE_BACKSPACE => KEY_BACKSPACE,
        SCANCODE_TAB => KEY_TAB,
        SCANCODE_SPACE => KEY_SPACE,
        SCANCODE_UNKNOWN => 0,
        other => from_scancode(other),
    }
}
