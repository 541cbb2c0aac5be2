//! Edge debouncing.
//!
//! Two policies are supported, chosen per line:
//!
//! - [`DebouncePolicy::Leading`] fires on the first edge of a burst and
//!   ignores every edge until `window` has elapsed since that edge.
//! - [`DebouncePolicy::Trailing`] fires once, `window` after the last edge
//!   of a burst; every edge restarts the countdown.
//!
//! [`Debouncer`] is the time-injected state machine; [`DebounceGate`] feeds
//! it edges straight from the reader threads under a short blocking lock,
//! and runs an async loop that owns the timers and runs the action once per
//! decided fire.

use core::cell::RefCell;
use core::future::Future;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use log::{debug, trace};
use serde::Deserialize;

use super::EdgeEvent;
use crate::error::{Error, Result};

/// When a burst of edges produces its single fire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DebouncePolicy {
    /// Fire on the first edge, then suppress for `window`.
    #[default]
    Leading,
    /// Fire after `window` of quiet following the last edge.
    Trailing,
}

/// Validated policy + window pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    policy: DebouncePolicy,
    window: Duration,
}

impl DebounceConfig {
    /// A zero window is rejected rather than degrading to pass-through.
    pub fn new(policy: DebouncePolicy, window: Duration) -> Result<Self> {
        if window.as_ticks() == 0 {
            return Err(Error::InvalidDebounceConfig {
                window_ms: window.as_millis(),
            });
        }
        Ok(Self { policy, window })
    }

    pub fn from_millis(policy: DebouncePolicy, window_ms: u64) -> Result<Self> {
        Self::new(policy, Duration::from_millis(window_ms))
    }

    pub fn policy(&self) -> DebouncePolicy {
        self.policy
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// What the state machine decided for one edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Run the action now.
    Fire,
    /// Edge swallowed by an open suppression window.
    Suppressed,
    /// Countdown (re)started; the fire is due at the given instant.
    Deferred(Instant),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GateState {
    Idle,
    /// Leading: suppressing until `reopen_at`.
    Suppressing { reopen_at: Instant },
    /// Trailing: fire due at `deadline`.
    Pending { deadline: Instant },
}

/// Debounce state for one line. Time is always passed in.
#[derive(Clone, Debug)]
pub struct Debouncer {
    config: DebounceConfig,
    state: GateState,
}

impl Debouncer {
    pub const fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: GateState::Idle,
        }
    }

    pub fn config(&self) -> DebounceConfig {
        self.config
    }

    /// Feed one edge observed at `at`.
    pub fn on_edge(&mut self, at: Instant) -> EdgeOutcome {
        let window = self.config.window;
        match self.config.policy {
            DebouncePolicy::Leading => match self.state {
                GateState::Suppressing { reopen_at } if at < reopen_at => EdgeOutcome::Suppressed,
                _ => {
                    self.state = GateState::Suppressing {
                        reopen_at: at + window,
                    };
                    EdgeOutcome::Fire
                }
            },
            DebouncePolicy::Trailing => {
                let deadline = at + window;
                self.state = GateState::Pending { deadline };
                EdgeOutcome::Deferred(deadline)
            }
        }
    }

    /// Next instant at which [`on_deadline`](Self::on_deadline) has work.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            GateState::Idle => None,
            GateState::Suppressing { reopen_at } => Some(reopen_at),
            GateState::Pending { deadline } => Some(deadline),
        }
    }

    /// Advance the clock to `now`. Returns `true` when a deferred fire is due.
    pub fn on_deadline(&mut self, now: Instant) -> bool {
        match self.state {
            GateState::Suppressing { reopen_at } if now >= reopen_at => {
                self.state = GateState::Idle;
                false
            }
            GateState::Pending { deadline } if now >= deadline => {
                self.state = GateState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending fire or suppression.
    pub fn reset(&mut self) {
        self.state = GateState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        self.state == GateState::Idle
    }
}

/// Gate state shared between edge readers and the run loop.
struct GateInner {
    debouncer: Debouncer,
    /// Fires decided but not yet run.
    pending: u32,
}

/// Debounce gate bound to one logical input line.
///
/// [`notify`](Self::notify) may be called from any thread, any number of
/// times. Each edge is folded into the state machine as it arrives, so an
/// edge is judged by its own timestamp even while the action is running.
/// Decided fires are counted and run in order by [`run`](Self::run).
pub struct DebounceGate<M: RawMutex> {
    config: DebounceConfig,
    state: BlockingMutex<M, RefCell<GateInner>>,
    wake: Signal<M, ()>,
    close: Signal<M, ()>,
    closed: AtomicBool,
}

impl<M: RawMutex> DebounceGate<M> {
    pub const fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: BlockingMutex::new(RefCell::new(GateInner {
                debouncer: Debouncer::new(config),
                pending: 0,
            })),
            wake: Signal::new(),
            close: Signal::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Construct and validate in one step.
    pub fn arm(policy: DebouncePolicy, window: Duration) -> Result<Self> {
        DebounceConfig::new(policy, window).map(Self::new)
    }

    pub fn config(&self) -> DebounceConfig {
        self.config
    }

    /// Record a raw edge observed now.
    pub fn notify(&self) {
        self.notify_edge(EdgeEvent::now());
    }

    /// Record a raw edge. Ignored once the gate is closed.
    pub fn notify_edge(&self, edge: EdgeEvent) {
        if self.is_closed() {
            return;
        }
        let fired = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let fired = judge(&mut state.debouncer, edge);
            state.pending = state.pending.saturating_add(fired);
            fired
        });
        // Deferred edges move the deadline, so the loop is woken either way.
        if fired > 0 {
            debug!("Debounce: {} fire(s) queued", fired);
        }
        self.wake.signal(());
    }

    /// Close the gate: pending fires are cancelled and [`run`](Self::run)
    /// returns. Further edges are ignored.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            state.debouncer.reset();
            state.pending = 0;
        });
        self.close.signal(());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Fires decided but not yet run.
    pub fn pending(&self) -> u32 {
        self.state.lock(|state| state.borrow().pending)
    }

    /// Drive the gate until it is closed, awaiting `action` once for every
    /// accepted trigger, in the order they were decided.
    pub async fn run<F, Fut>(&self, mut action: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        while !self.is_closed() {
            let (fires, deadline) = self.state.lock(|state| {
                let mut state = state.borrow_mut();
                (core::mem::take(&mut state.pending), state.debouncer.deadline())
            });

            if fires > 0 {
                for _ in 0..fires {
                    if self.is_closed() {
                        break;
                    }
                    action().await;
                }
                continue;
            }

            match deadline {
                Some(deadline) => {
                    match select3(self.close.wait(), self.wake.wait(), Timer::at(deadline)).await {
                        Either3::First(()) => break,
                        Either3::Second(()) => {}
                        Either3::Third(()) => self.settle(Instant::now()),
                    }
                }
                None => {
                    if let Either::First(()) = select(self.close.wait(), self.wake.wait()).await {
                        break;
                    }
                }
            }
        }

        debug!("Debounce: gate closed");
    }

    /// Advance the state machine to `now`, queueing a fire that is due.
    fn settle(&self, now: Instant) {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.debouncer.on_deadline(now) {
                debug!("Debounce: quiet for {} ms, firing", self.config.window.as_millis());
                state.pending = state.pending.saturating_add(1);
            } else {
                trace!("Debounce: window elapsed, gate re-armed");
            }
        });
    }
}

/// Feed one edge; returns how many fires it decided (0, 1 or 2).
fn judge(debouncer: &mut Debouncer, edge: EdgeEvent) -> u32 {
    // A countdown that expired before this edge was observed fires first.
    let overdue = debouncer.on_deadline(edge.at);
    if overdue {
        debug!("Debounce: overdue fire before new edge");
    }
    let now = match debouncer.on_edge(edge.at) {
        EdgeOutcome::Fire => {
            debug!("Debounce: edge accepted, firing");
            true
        }
        EdgeOutcome::Suppressed => {
            trace!("Debounce: edge suppressed");
            false
        }
        EdgeOutcome::Deferred(_) => {
            trace!("Debounce: countdown restarted");
            false
        }
    };
    u32::from(overdue) + u32::from(now)
}
