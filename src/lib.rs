//! gpio2hid - type fixed text on a USB host when a GPIO line changes.
//!
//! The device side of a Linux USB gadget: each monitored GPIO line is
//! debounced into discrete triggers, every trigger encodes its text into
//! boot-keyboard reports, and one sink writes those reports to the
//! gadget's `/dev/hidgN` node without interleaving bursts.
//!
//! ```text
//! gpiochip ──edge──▶ DebounceGate ──trigger──▶ encode_text ──burst──▶ ReportSink ──▶ /dev/hidg0
//! ```
//!
//! Usage: `cargo test` runs everything on the host; no GPIO chip or UDC
//! is needed.

pub mod config;
pub mod error;
pub mod hid;
pub mod input;
pub mod pipeline;
pub mod usb;

pub use config::Settings;
pub use error::{ChannelError, Error, Result};
pub use input::debounce::{DebounceConfig, DebounceGate, DebouncePolicy};
pub use input::EdgeEvent;
pub use pipeline::{Line, Pipeline, PipelineStats, ShutdownReason};
pub use usb::sink::{ReportChannel, ReportSink, SinkTiming};
