//! evdev keycode constants
//!
//! Consolidates the evdev key constants used by keymouse and the
//! name table used to resolve key names from the config file.
//! These are Linux input event codes from <linux/input-event-codes.h>.

#![allow(dead_code)]

// ============================================================================
// Modifier Keys
// ============================================================================

/// Left Control key
pub const KEY_LEFTCTRL: u16 = 29;

/// Right Control key
pub const KEY_RIGHTCTRL: u16 = 97;

/// Left Shift key
pub const KEY_LEFTSHIFT: u16 = 42;

/// Right Shift key
pub const KEY_RIGHTSHIFT: u16 = 54;

/// Left Alt key
pub const KEY_LEFTALT: u16 = 56;

/// Right Alt key (AltGr on some keyboards)
pub const KEY_RIGHTALT: u16 = 100;

/// Left Meta (Super/Windows) key
pub const KEY_LEFTMETA: u16 = 125;

/// Right Meta key
pub const KEY_RIGHTMETA: u16 = 126;

// ============================================================================
// Keys used by the default bindings
// ============================================================================

pub const KEY_ESC: u16 = 1;
pub const KEY_TAB: u16 = 15;
pub const KEY_SPACE: u16 = 57;

pub const KEY_A: u16 = 30;
pub const KEY_B: u16 = 48;
pub const KEY_D: u16 = 32;
pub const KEY_E: u16 = 18;
pub const KEY_F: u16 = 33;
pub const KEY_H: u16 = 35;
pub const KEY_J: u16 = 36;
pub const KEY_K: u16 = 37;
pub const KEY_L: u16 = 38;
pub const KEY_S: u16 = 31;
pub const KEY_U: u16 = 22;
pub const KEY_W: u16 = 17;
pub const KEY_X: u16 = 45;

// ============================================================================
// Navigation Keys
// ============================================================================

/// Up arrow key
pub const KEY_UP: u16 = 103;

/// Down arrow key
pub const KEY_DOWN: u16 = 108;

/// Left arrow key
pub const KEY_LEFT: u16 = 105;

/// Right arrow key
pub const KEY_RIGHT: u16 = 106;

// ============================================================================
// Mouse Buttons (BTN_* from linux/input-event-codes.h)
// ============================================================================

/// Left mouse button
pub const BTN_LEFT: u16 = 0x110;

/// Right mouse button
pub const BTN_RIGHT: u16 = 0x111;

/// Middle mouse button
pub const BTN_MIDDLE: u16 = 0x112;

// ============================================================================
// Name Table
// ============================================================================

/// Key names accepted in the config file, lowercase, without the `KEY_` prefix.
/// The first entry for a code is its canonical name.
const KEY_NAMES: &[(&str, u16)] = &[
    ("esc", 1),
    ("escape", 1),
    ("1", 2),
    ("2", 3),
    ("3", 4),
    ("4", 5),
    ("5", 6),
    ("6", 7),
    ("7", 8),
    ("8", 9),
    ("9", 10),
    ("0", 11),
    ("minus", 12),
    ("equal", 13),
    ("backspace", 14),
    ("tab", 15),
    ("q", 16),
    ("w", 17),
    ("e", 18),
    ("r", 19),
    ("t", 20),
    ("y", 21),
    ("u", 22),
    ("i", 23),
    ("o", 24),
    ("p", 25),
    ("leftbrace", 26),
    ("rightbrace", 27),
    ("enter", 28),
    ("return", 28),
    ("leftctrl", 29),
    ("ctrl", 29),
    ("a", 30),
    ("s", 31),
    ("d", 32),
    ("f", 33),
    ("g", 34),
    ("h", 35),
    ("j", 36),
    ("k", 37),
    ("l", 38),
    ("semicolon", 39),
    ("apostrophe", 40),
    ("grave", 41),
    ("leftshift", 42),
    ("shift", 42),
    ("backslash", 43),
    ("z", 44),
    ("x", 45),
    ("c", 46),
    ("v", 47),
    ("b", 48),
    ("n", 49),
    ("m", 50),
    ("comma", 51),
    ("dot", 52),
    ("slash", 53),
    ("rightshift", 54),
    ("leftalt", 56),
    ("alt", 56),
    ("space", 57),
    ("capslock", 58),
    ("f1", 59),
    ("f2", 60),
    ("f3", 61),
    ("f4", 62),
    ("f5", 63),
    ("f6", 64),
    ("f7", 65),
    ("f8", 66),
    ("f9", 67),
    ("f10", 68),
    ("numlock", 69),
    ("scrolllock", 70),
    ("f11", 87),
    ("f12", 88),
    ("rightctrl", 97),
    ("rightalt", 100),
    ("altgr", 100),
    ("home", 102),
    ("up", 103),
    ("pageup", 104),
    ("left", 105),
    ("right", 106),
    ("end", 107),
    ("down", 108),
    ("pagedown", 109),
    ("insert", 110),
    ("delete", 111),
    ("pause", 119),
    ("leftmeta", 125),
    ("super", 125),
    ("meta", 125),
    ("rightmeta", 126),
    ("compose", 127),
    ("menu", 127),
];

/// Resolve a key name ("tab", "KEY_TAB", "LeftMeta") to its evdev code.
///
/// Raw codes ("code:183") are accepted for keys missing from the table.
pub fn code_for_name(name: &str) -> Option<u16> {
    let lowercase = name.trim().to_lowercase();
    let stripped = lowercase.strip_prefix("key_").unwrap_or(&lowercase);

    if let Some((_, code)) = KEY_NAMES.iter().find(|(n, _)| *n == stripped) {
        return Some(*code);
    }

    // Bare digits are key names ("1" = KEY_1), raw codes need the prefix
    if let Some(raw) = stripped.strip_prefix("code:") {
        return raw.parse().ok();
    }
    None
}

/// Canonical config-file name for an evdev code.
pub fn name_for_code(code: u16) -> Option<&'static str> {
    KEY_NAMES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| *name)
}

/// Config-file spelling of a code: its name, or `code:N` when unnamed.
pub fn display_code(code: u16) -> String {
    match name_for_code(code) {
        Some(name) => name.to_string(),
        None => format!("code:{}", code),
    }
}
