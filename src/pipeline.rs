//! Pipeline driver - lines, gates and the shared report sink.
//!
//! Every line owns a [`DebounceGate`] and a fixed text. When the gate
//! fires, the text is encoded into one burst and handed to the single
//! [`ReportSink`], whose lock keeps concurrent bursts from interleaving.
//!
//! Burst failures are logged and counted; only a lost channel stops the
//! pipeline.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use log::{debug, error, info, warn};

use crate::config::{Settings, MAX_LINES};
use crate::error::{Error, Result};
use crate::hid::encoder::encode_text;
use crate::input::debounce::{DebounceConfig, DebounceGate};
use crate::usb::sink::{ReportChannel, ReportSink, SinkTiming};

/// Why the pipeline stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Stop was asked for.
    Requested,
    /// The report channel can no longer be written.
    ChannelLost,
}

impl ShutdownReason {
    /// Process exit status for this reason.
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownReason::Requested => 0,
            ShutdownReason::ChannelLost => 1,
        }
    }
}

/// One input line bound to the text it types.
pub struct Line<M: RawMutex> {
    name: String,
    text: String,
    gate: DebounceGate<M>,
}

impl<M: RawMutex> Line<M> {
    pub fn new(name: impl Into<String>, text: impl Into<String>, debounce: DebounceConfig) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            gate: DebounceGate::new(debounce),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The gate edge readers notify.
    pub fn gate(&self) -> &DebounceGate<M> {
        &self.gate
    }
}

/// Trigger and burst counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Accepted triggers across all lines.
    pub triggers: u32,
    /// Bursts written completely.
    pub bursts: u32,
    /// Triggers that ended in an error.
    pub failures: u32,
}

pub struct Pipeline<M: RawMutex, C: ReportChannel> {
    sink: ReportSink<M, C>,
    lines: Vec<Line<M>>,
    shutdown: Signal<M, ShutdownReason>,
    stopping: AtomicBool,
    triggers: AtomicU32,
    bursts: AtomicU32,
    failures: AtomicU32,
}

impl<M: RawMutex, C: ReportChannel> Pipeline<M, C> {
    pub fn new(sink: ReportSink<M, C>, lines: Vec<Line<M>>) -> Result<Self> {
        if lines.len() > MAX_LINES {
            return Err(Error::TooManyLines {
                count: lines.len(),
                max: MAX_LINES,
            });
        }
        Ok(Self {
            sink,
            lines,
            shutdown: Signal::new(),
            stopping: AtomicBool::new(false),
            triggers: AtomicU32::new(0),
            bursts: AtomicU32::new(0),
            failures: AtomicU32::new(0),
        })
    }

    /// Build lines and sink timing from validated settings.
    pub fn from_settings(settings: &Settings, channel: C) -> Result<Self> {
        let timing = SinkTiming {
            press_hold: embassy_time::Duration::from_millis(settings.device.press_hold_ms),
            key_gap: embassy_time::Duration::from_millis(settings.device.key_gap_ms),
        };
        let lines = settings
            .lines
            .iter()
            .map(|line| {
                let debounce = DebounceConfig::from_millis(line.policy, line.window_ms)?;
                Ok(Line::new(line.name.clone(), line.text.clone(), debounce))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(ReportSink::new(channel, timing), lines)
    }

    pub fn lines(&self) -> &[Line<M>] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line<M>> {
        self.lines.get(index)
    }

    pub fn sink(&self) -> &ReportSink<M, C> {
        &self.sink
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            triggers: self.triggers.load(Ordering::Relaxed),
            bursts: self.bursts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }

    /// Type the text of line `index` once. Returns the reports written.
    pub async fn trigger(&self, index: usize) -> Result<usize> {
        let line = self.lines.get(index).ok_or(Error::UnknownLine(index))?;
        let burst = encode_text(&line.text)?;
        self.sink.send_burst(&burst).await
    }

    async fn on_trigger(&self, index: usize) {
        self.triggers.fetch_add(1, Ordering::Relaxed);
        let name = self.lines.get(index).map(Line::name).unwrap_or("?");

        match self.trigger(index).await {
            Ok(sent) => {
                self.bursts.fetch_add(1, Ordering::Relaxed);
                info!("Line {}: {} reports sent", name, sent);
            }
            Err(e) if self.is_stopping() => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                info!("Line {}: {} during shutdown", name, e);
            }
            Err(e) if e.is_fatal() => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                error!("Line {}: {}; report channel lost, shutting down", name, e);
                self.shutdown(ShutdownReason::ChannelLost);
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!("Line {}: {}", name, e);
            }
        }
    }

    /// Serve line `index` until the pipeline shuts down.
    pub async fn run_line(&self, index: usize) {
        let Some(line) = self.lines.get(index) else {
            warn!("No line {} to run", index);
            return;
        };
        info!("Line {}: armed ({:?})", line.name, line.gate.config());
        line.gate.run(move || self.on_trigger(index)).await;
        info!("Line {}: stopped", line.name);
    }

    /// Close every gate, stop new presses and wake [`wait_shutdown`](Self::wait_shutdown).
    ///
    /// Only the first reason is reported; later calls are no-ops.
    pub fn shutdown(&self, reason: ShutdownReason) {
        if self.stopping.swap(true, Ordering::AcqRel) {
            debug!("Pipeline: already stopping, ignoring {:?}", reason);
            return;
        }
        info!("Pipeline: shutting down ({:?})", reason);
        for line in &self.lines {
            line.gate.close();
        }
        self.sink.cancel();
        self.shutdown.signal(reason);
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    pub async fn wait_shutdown(&self) -> ShutdownReason {
        self.shutdown.wait().await
    }

    /// Release the report channel once any in-flight burst is done.
    pub async fn close(&self) -> Option<C> {
        self.sink.close().await
    }
}
