//! HID keyboard reports, the symbol table and the sequence encoder.

pub mod encoder;
pub mod keyboard;
pub mod keycodes;

#[cfg(test)]
mod tests;

pub use encoder::{encode_symbol, encode_text, Burst};
pub use keyboard::{KeyboardReport, KEYBOARD_REPORT_DESCRIPTOR, KEYBOARD_REPORT_SIZE};
pub use keycodes::{lookup, KeyBinding};
