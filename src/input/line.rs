//! GPIO line edge source (Linux GPIO character device).
//!
//! The line is requested as an input with the configured edge detection
//! and bias. A dedicated reader thread blocks on the kernel's edge event
//! queue and forwards every event to the line's debounce gate, so the
//! async side never waits on the device.

use std::path::PathBuf;
use std::thread;

use embassy_sync::blocking_mutex::raw::RawMutex;
use gpiocdev::line::{Bias, EdgeDetection};
use gpiocdev::Request;
use log::{debug, error, info};

use super::debounce::DebounceGate;
use super::EdgeEvent;
use crate::config::{BiasSetting, EdgeKind, LineSettings};
use crate::error::{Error, Result};

impl From<EdgeKind> for EdgeDetection {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Rising => EdgeDetection::RisingEdge,
            EdgeKind::Falling => EdgeDetection::FallingEdge,
            EdgeKind::Both => EdgeDetection::BothEdges,
        }
    }
}

fn bias_for(setting: BiasSetting) -> Option<Bias> {
    match setting {
        BiasSetting::AsIs => None,
        BiasSetting::PullUp => Some(Bias::PullUp),
        BiasSetting::PullDown => Some(Bias::PullDown),
        BiasSetting::Disabled => Some(Bias::Disabled),
    }
}

/// A requested GPIO line delivering edge events.
pub struct EdgeSource {
    name: String,
    chip: PathBuf,
    offset: u32,
    request: Request,
}

impl EdgeSource {
    /// Request the line described by `line`. Failure is startup-fatal.
    pub fn request(line: &LineSettings, consumer: &str) -> Result<Self> {
        let mut builder = Request::builder();
        builder
            .on_chip(&line.chip)
            .with_consumer(consumer)
            .with_line(line.offset)
            .as_input()
            .with_edge_detection(EdgeDetection::from(line.edge));
        if let Some(bias) = bias_for(line.bias) {
            builder.with_bias(bias);
        }

        let request = builder.request().map_err(|e| Error::SourceUnavailable {
            chip: line.chip.clone(),
            offset: line.offset,
            reason: e.to_string(),
        })?;

        info!(
            "Line {}: {}:{} requested ({:?} edge, {:?})",
            line.name,
            line.chip.display(),
            line.offset,
            line.edge,
            line.bias
        );

        Ok(Self {
            name: line.name.clone(),
            chip: line.chip.clone(),
            offset: line.offset,
            request,
        })
    }

    /// Move the line onto a reader thread feeding `gate`.
    ///
    /// The thread ends when the gate is closed and the next edge arrives,
    /// or when reading from the device fails.
    pub fn spawn<M>(self, gate: &'static DebounceGate<M>) -> Result<thread::JoinHandle<()>>
    where
        M: RawMutex + Sync + 'static,
    {
        let thread_name = format!("edge-{}", self.name);
        let (chip, offset) = (self.chip.clone(), self.offset);
        thread::Builder::new()
            .name(thread_name)
            .spawn(move || self.forward(gate))
            .map_err(|e| Error::SourceUnavailable {
                chip,
                offset,
                reason: format!("spawning reader thread: {e}"),
            })
    }

    fn forward<M: RawMutex>(self, gate: &DebounceGate<M>) {
        for event in self.request.edge_events() {
            match event {
                Ok(event) => {
                    debug!("Line {}: {:?} edge", self.name, event.kind);
                    gate.notify_edge(EdgeEvent::now());
                }
                Err(e) => {
                    error!(
                        "Line {}: reading {}:{} failed: {}",
                        self.name,
                        self.chip.display(),
                        self.offset,
                        e
                    );
                    return;
                }
            }
            if gate.is_closed() {
                break;
            }
        }
        debug!("Line {}: reader stopped", self.name);
    }
}
