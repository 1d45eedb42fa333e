//! Poll lifecycle: a pure state machine plus the cancellable loop driving it.
//!
//! # Design
//! - [`advance`] maps `(state, verdict)` to `(state, action)` with no timers,
//!   so lifecycle rules are testable on their own.
//! - A [`Poller`] owns one slot. `start` aborts whatever loop the slot held
//!   before installing a new one, so a slot never runs two timer chains.
//! - Each tick's fetch runs in its own spawned task which the loop awaits.
//!   Aborting the loop cancels the timer, never a request already in flight.
//! - A generation counter guards the slot: a loop that was replaced or stopped
//!   can no longer write the slot state.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

/// Lifecycle of one poll slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// Never started.
    #[default]
    Idle,
    /// A timer chain is installed.
    Polling,
    /// Stopped by the caller or by a terminal payload.
    Stopped,
}

impl PollState {
    /// Stable label for logs and CLI output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Polling => "polling",
            Self::Stopped => "stopped",
        }
    }
}

/// Outcome of one tick as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickVerdict {
    /// Fetch applied; keep polling.
    Continue,
    /// Fetch failed; the next tick is the retry.
    Failed,
    /// Payload reached a terminal state; polling ends.
    Terminal,
    /// The owning store is gone.
    Detached,
}

/// What the loop does after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Wait for the next interval and tick again.
    ScheduleNext,
    /// Leave the loop.
    Halt,
}

/// Why a tick runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOrigin {
    /// The immediate fetch performed by `start`; failures are shown.
    Initial,
    /// A timer-driven fetch; failures are only logged.
    Scheduled,
}

impl TickOrigin {
    /// Whether failures of this tick stay out of the notifier.
    #[must_use]
    pub const fn is_silent(self) -> bool {
        matches!(self, Self::Scheduled)
    }
}

/// Transition function of a poll slot.
#[must_use]
pub const fn advance(state: PollState, verdict: TickVerdict) -> (PollState, PollAction) {
    match (state, verdict) {
        (PollState::Polling, TickVerdict::Continue | TickVerdict::Failed) => {
            (PollState::Polling, PollAction::ScheduleNext)
        }
        (PollState::Polling, TickVerdict::Terminal | TickVerdict::Detached) => {
            (PollState::Stopped, PollAction::Halt)
        }
        (other, _) => (other, PollAction::Halt),
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    state: PollState,
    handle: Option<JoinHandle<()>>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One cancellable poll slot.
#[derive(Debug)]
pub struct Poller {
    name: &'static str,
    slot: Arc<Mutex<Slot>>,
}

impl Poller {
    /// Idle slot labelled `name` in logs.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PollState {
        lock(&self.slot).state
    }

    /// Whether a timer chain is installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == PollState::Polling
    }

    /// Replace any running loop with one that ticks now and then every `period`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F, Fut>(&self, period: Duration, tick: F)
    where
        F: Fn(TickOrigin) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TickVerdict> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.handle.take() {
            previous.abort();
            debug!(poller = self.name, "replaced running poll loop");
        }
        slot.generation += 1;
        slot.state = PollState::Polling;
        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let name = self.name;
        slot.handle = Some(tokio::spawn(run_loop(
            shared, generation, name, period, tick,
        )));
        debug!(poller = name, period_ms = period.as_millis(), "poll loop started");
    }

    /// Cancel the timer chain. Safe to call when nothing is running.
    pub fn stop(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
        if slot.state == PollState::Polling {
            slot.state = PollState::Stopped;
            debug!(poller = self.name, "poll loop stopped");
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.slot).handle.take() {
            handle.abort();
        }
    }
}

async fn run_loop<F, Fut>(
    slot: Arc<Mutex<Slot>>,
    generation: u64,
    name: &'static str,
    period: Duration,
    tick: F,
) where
    F: Fn(TickOrigin) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TickVerdict> + Send + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut origin = TickOrigin::Initial;

    loop {
        let verdict = match tokio::spawn(tick(origin)).await {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(poller = name, error = %err, "poll tick task failed");
                TickVerdict::Failed
            }
        };

        {
            let mut guard = lock(&slot);
            if guard.generation != generation {
                return;
            }
            let (next, action) = advance(guard.state, verdict);
            guard.state = next;
            if action == PollAction::Halt {
                guard.handle = None;
                debug!(poller = name, ?verdict, "poll loop halted");
                return;
            }
        }

        origin = TickOrigin::Scheduled;
        ticker.tick().await;
    }
}
