//! Symbol sequence → press/release report frames.
//!
//! Encoding is all-or-nothing: the whole sequence is resolved before a
//! single frame is produced, so a sequence containing an unsupported
//! symbol yields an error and no reports at all.

use heapless::Vec;

use super::keyboard::KeyboardReport;
use super::keycodes::{self, KeyBinding};
use crate::error::{Error, Result};

/// Longest symbol sequence one trigger may type.
pub const MAX_SEQUENCE_LEN: usize = 64;

/// Reports per symbol (press + release).
pub const REPORTS_PER_SYMBOL: usize = 2;

pub const MAX_BURST_REPORTS: usize = MAX_SEQUENCE_LEN * REPORTS_PER_SYMBOL;

/// The frames for one triggered sequence, in send order.
pub type Burst = Vec<KeyboardReport, MAX_BURST_REPORTS>;

/// Press/release pair for one binding.
pub const fn encode_binding(binding: KeyBinding) -> [KeyboardReport; REPORTS_PER_SYMBOL] {
    [KeyboardReport::press(binding), KeyboardReport::release()]
}

/// Press/release pair for a one-symbol sequence.
pub fn encode_symbol(symbol: char) -> Result<[KeyboardReport; REPORTS_PER_SYMBOL]> {
    keycodes::lookup(0, symbol).map(encode_binding)
}

/// Encode `text` into one burst: press, release for every symbol in order.
pub fn encode_text(text: &str) -> Result<Burst> {
    let len = text.chars().count();
    if len > MAX_SEQUENCE_LEN {
        return Err(Error::SequenceTooLong {
            len,
            max: MAX_SEQUENCE_LEN,
        });
    }

    let mut burst = Burst::new();
    for (index, symbol) in text.chars().enumerate() {
        let binding = keycodes::lookup(index, symbol)?;
        burst
            .extend_from_slice(&encode_binding(binding))
            .map_err(|_| Error::SequenceTooLong {
                len,
                max: MAX_SEQUENCE_LEN,
            })?;
    }
    Ok(burst)
}
