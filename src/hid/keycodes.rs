//! Symbol → HID usage table for a US keyboard layout.
//!
//! Every printable ASCII character plus the common control characters
//! (newline, tab, escape, backspace, delete) resolves to exactly one
//! [`KeyBinding`]. Shifted symbols carry [`MOD_LSHIFT`]; everything else
//! carries no modifier.

use crate::error::{Error, Result};

// Modifier bits (byte 0 of the report)

pub const MOD_NONE: u8 = 0x00;
pub const MOD_LCTRL: u8 = 1 << 0;
pub const MOD_LSHIFT: u8 = 1 << 1;
pub const MOD_LALT: u8 = 1 << 2;
pub const MOD_LGUI: u8 = 1 << 3;
pub const MOD_RCTRL: u8 = 1 << 4;
pub const MOD_RSHIFT: u8 = 1 << 5;
pub const MOD_RALT: u8 = 1 << 6;
pub const MOD_RGUI: u8 = 1 << 7;

// Keyboard/Keypad page usage IDs (HID Usage Tables, section 10)

pub const KEY_A: u8 = 0x04;
pub const KEY_Z: u8 = 0x1D;
pub const KEY_1: u8 = 0x1E;
pub const KEY_0: u8 = 0x27;
pub const KEY_ENTER: u8 = 0x28;
pub const KEY_ESCAPE: u8 = 0x29;
pub const KEY_BACKSPACE: u8 = 0x2A;
pub const KEY_TAB: u8 = 0x2B;
pub const KEY_SPACE: u8 = 0x2C;
pub const KEY_MINUS: u8 = 0x2D;
pub const KEY_EQUAL: u8 = 0x2E;
pub const KEY_LEFT_BRACKET: u8 = 0x2F;
pub const KEY_RIGHT_BRACKET: u8 = 0x30;
pub const KEY_BACKSLASH: u8 = 0x31;
pub const KEY_SEMICOLON: u8 = 0x33;
pub const KEY_QUOTE: u8 = 0x34;
pub const KEY_GRAVE: u8 = 0x35;
pub const KEY_COMMA: u8 = 0x36;
pub const KEY_DOT: u8 = 0x37;
pub const KEY_SLASH: u8 = 0x38;
pub const KEY_DELETE: u8 = 0x4C;

/// Modifier + usage pair for one symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBinding {
    pub modifier: u8,
    pub scancode: u8,
}

impl KeyBinding {
    pub const fn plain(scancode: u8) -> Self {
        Self {
            modifier: MOD_NONE,
            scancode,
        }
    }

    pub const fn shifted(scancode: u8) -> Self {
        Self {
            modifier: MOD_LSHIFT,
            scancode,
        }
    }
}

/// Resolve `symbol` to its binding, or `None` if it cannot be typed.
pub fn binding_for(symbol: char) -> Option<KeyBinding> {
    use KeyBinding as K;

    let binding = match symbol {
        'a'..='z' => K::plain(KEY_A + (symbol as u8 - b'a')),
        'A'..='Z' => K::shifted(KEY_A + (symbol as u8 - b'A')),
        '1'..='9' => K::plain(KEY_1 + (symbol as u8 - b'1')),
        '0' => K::plain(KEY_0),

        '!' => K::shifted(KEY_1),
        '@' => K::shifted(KEY_1 + 1),
        '#' => K::shifted(KEY_1 + 2),
        '$' => K::shifted(KEY_1 + 3),
        '%' => K::shifted(KEY_1 + 4),
        '^' => K::shifted(KEY_1 + 5),
        '&' => K::shifted(KEY_1 + 6),
        '*' => K::shifted(KEY_1 + 7),
        '(' => K::shifted(KEY_1 + 8),
        ')' => K::shifted(KEY_0),

        '-' => K::plain(KEY_MINUS),
        '_' => K::shifted(KEY_MINUS),
        '=' => K::plain(KEY_EQUAL),
        '+' => K::shifted(KEY_EQUAL),
        '[' => K::plain(KEY_LEFT_BRACKET),
        '{' => K::shifted(KEY_LEFT_BRACKET),
        ']' => K::plain(KEY_RIGHT_BRACKET),
        '}' => K::shifted(KEY_RIGHT_BRACKET),
        '\\' => K::plain(KEY_BACKSLASH),
        '|' => K::shifted(KEY_BACKSLASH),
        ';' => K::plain(KEY_SEMICOLON),
        ':' => K::shifted(KEY_SEMICOLON),
        '\'' => K::plain(KEY_QUOTE),
        '"' => K::shifted(KEY_QUOTE),
        '`' => K::plain(KEY_GRAVE),
        '~' => K::shifted(KEY_GRAVE),
        ',' => K::plain(KEY_COMMA),
        '<' => K::shifted(KEY_COMMA),
        '.' => K::plain(KEY_DOT),
        '>' => K::shifted(KEY_DOT),
        '/' => K::plain(KEY_SLASH),
        '?' => K::shifted(KEY_SLASH),

        ' ' => K::plain(KEY_SPACE),
        '\n' | '\r' => K::plain(KEY_ENTER),
        '\t' => K::plain(KEY_TAB),
        '\x1B' => K::plain(KEY_ESCAPE),
        '\x08' => K::plain(KEY_BACKSPACE),
        '\x7F' => K::plain(KEY_DELETE),

        _ => return None,
    };
    Some(binding)
}

/// Resolve the symbol found at position `index` of a sequence, reporting
/// a miss as [`Error::UnsupportedSymbol`].
pub fn lookup(index: usize, symbol: char) -> Result<KeyBinding> {
    binding_for(symbol).ok_or(Error::UnsupportedSymbol { symbol, index })
}
