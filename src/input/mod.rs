//! Input subsystem - GPIO edge sources and per-line debouncing.
//!
//! Each monitored line has a reader thread blocked on the GPIO character
//! device. Every edge it sees is stamped and folded into the line's
//! [`DebounceGate`](debounce::DebounceGate); the gate's async task runs
//! the triggers it decided.

pub mod debounce;
pub mod line;

use embassy_time::Instant;

/// One observed transition of a monitored line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeEvent {
    /// When the edge was observed.
    pub at: Instant,
}

impl EdgeEvent {
    pub fn now() -> Self {
        Self { at: Instant::now() }
    }

    pub const fn at(at: Instant) -> Self {
        Self { at }
    }
}
