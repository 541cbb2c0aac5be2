//! Report sink - sequences encoded frames onto the device channel.
//!
//! One burst is written under the channel lock so bursts from different
//! lines never interleave. A press is held for `press_hold` before its
//! release goes out, giving the host's polling a distinct key-down and
//! key-up. The first failed write ends the burst.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};
use log::{debug, info, warn};

use crate::config::{KEY_GAP_MS, PRESS_HOLD_MS};
use crate::error::{ChannelError, Error, Result};
use crate::hid::keyboard::{KeyboardReport, KEYBOARD_REPORT_SIZE};

/// Write-only sink for 8-byte keyboard reports.
///
/// A write may block until the host accepts the report.
pub trait ReportChannel {
    fn write_report(&mut self, report: &[u8; KEYBOARD_REPORT_SIZE]) -> Result<(), ChannelError>;
}

impl<C: ReportChannel + ?Sized> ReportChannel for &mut C {
    fn write_report(&mut self, report: &[u8; KEYBOARD_REPORT_SIZE]) -> Result<(), ChannelError> {
        (**self).write_report(report)
    }
}

/// Inter-report delays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkTiming {
    /// Between a press and its release.
    pub press_hold: Duration,
    /// After a release, before the next press.
    pub key_gap: Duration,
}

impl Default for SinkTiming {
    fn default() -> Self {
        Self {
            press_hold: Duration::from_millis(PRESS_HOLD_MS),
            key_gap: Duration::from_millis(KEY_GAP_MS),
        }
    }
}

/// Sole writer of the shared report channel.
pub struct ReportSink<M: RawMutex, C: ReportChannel> {
    channel: Mutex<M, Option<C>>,
    timing: SinkTiming,
    cancelled: AtomicBool,
}

impl<M: RawMutex, C: ReportChannel> ReportSink<M, C> {
    pub fn new(channel: C, timing: SinkTiming) -> Self {
        Self {
            channel: Mutex::new(Some(channel)),
            timing,
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn timing(&self) -> SinkTiming {
        self.timing
    }

    /// Write every report of `burst` in order; returns the number written.
    ///
    /// Cancellation is checked before each press. A press that has gone
    /// out is always followed by its release, so a cancelled burst never
    /// leaves a key held on the host.
    pub async fn send_burst(&self, burst: &[KeyboardReport]) -> Result<usize> {
        let mut guard = self.channel.lock().await;
        let channel = guard.as_mut().ok_or(Error::ChannelClosed)?;

        let mut sent = 0;
        for report in burst {
            let is_press = !report.is_release();
            if is_press && self.is_cancelled() {
                info!("Sink: burst cancelled after {} reports", sent);
                return Err(Error::BurstCancelled { sent });
            }
            if is_press && sent > 0 && self.timing.key_gap.as_ticks() > 0 {
                Timer::after(self.timing.key_gap).await;
            }

            channel
                .write_report(&report.to_bytes())
                .map_err(|source| Error::ChannelWrite { sent, source })?;
            sent += 1;

            if is_press {
                Timer::after(self.timing.press_hold).await;
            }
        }

        debug!("Sink: burst of {} reports written", sent);
        Ok(sent)
    }

    /// Stop starting new presses; an in-flight write still completes.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Cancel, wait for any burst in progress, then release the channel.
    /// Returns the channel so the caller decides how it is dropped.
    pub async fn close(&self) -> Option<C> {
        self.cancel();
        let channel = self.channel.lock().await.take();
        if channel.is_some() {
            info!("Sink: report channel closed");
        } else {
            warn!("Sink: report channel already closed");
        }
        channel
    }
}
