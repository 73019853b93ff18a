//! Tokio-backed session runtime.
//!
//! Wraps a [`SessionController`] and performs its effects: real timers,
//! announcer calls, and state publication. All control operations and
//! timer callbacks serialize behind one lock, so `tick()` and `advance()`
//! never run concurrently with each other or with a user command.
//!
//! Timer ownership is explicit: a single [`TimerHandle`] slot holds
//! either the per-second ticker task or the pending one-shot advance
//! task, never both. Installing a timer aborts whatever occupied the
//! slot, which rules out compounding tick rates. A callback that was
//! already in flight when its timer was cancelled finds a state that
//! forbids its transition and falls through as a no-op.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::controller::{Effect, SessionController, SessionSnapshot, Transition, INTER_PHASE_PAUSE};
use super::phase::PhaseSequence;
use crate::announce::Announcer;
use crate::error::Result;
use crate::events::Event;

/// Cadence of the countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// The one timer slot. Holding ticker and advance in a single place makes
/// "at most one outstanding timer" true by construction.
#[derive(Debug)]
enum TimerHandle {
    Idle,
    Ticker(JoinHandle<()>),
    AdvanceDelay(JoinHandle<()>),
}

impl TimerHandle {
    fn install(&mut self, next: TimerHandle) {
        self.clear();
        *self = next;
    }

    fn clear(&mut self) {
        match std::mem::replace(self, TimerHandle::Idle) {
            TimerHandle::Idle => {}
            TimerHandle::Ticker(handle) | TimerHandle::AdvanceDelay(handle) => handle.abort(),
        }
    }
}

struct Shared {
    controller: SessionController,
    timer: TimerHandle,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.timer.clear();
    }
}

struct Inner {
    /// Handed to timer tasks so they never keep the runtime alive.
    weak: Weak<Inner>,
    shared: Mutex<Shared>,
    announcer: Arc<dyn Announcer>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    event_tx: broadcast::Sender<Event>,
}

/// Handle to a running session. Cheap to clone; all clones drive the same
/// session. Must be used from within a tokio runtime, since starting or
/// resuming spawns the timer task.
#[derive(Clone)]
pub struct SessionRuntime {
    inner: Arc<Inner>,
}

impl SessionRuntime {
    pub fn new(sequence: PhaseSequence, announcer: Arc<dyn Announcer>) -> Self {
        let controller = SessionController::new(sequence);
        let (snapshot_tx, _) = watch::channel(controller.snapshot());
        let (event_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new_cyclic(|weak| Inner {
                weak: weak.clone(),
                shared: Mutex::new(Shared {
                    controller,
                    timer: TimerHandle::Idle,
                }),
                announcer,
                snapshot_tx,
                event_tx,
            }),
        }
    }

    /// Begin the first phase. Fails if a session is already in progress.
    pub fn start(&self) -> Result<()> {
        debug!("session start requested");
        let mut shared = self.inner.lock_shared();
        let transition = shared.controller.start()?;
        self.inner.apply(&mut shared, transition);
        Ok(())
    }

    /// Suspend the countdown. No-op when there is nothing to pause.
    pub fn pause(&self) {
        debug!("session pause requested");
        let mut shared = self.inner.lock_shared();
        if let Some(transition) = shared.controller.pause() {
            self.inner.apply(&mut shared, transition);
        }
    }

    /// Continue a paused countdown. Fails when idle, mid-gap, or paused
    /// with nothing left to count.
    pub fn resume(&self) -> Result<()> {
        debug!("session resume requested");
        let mut shared = self.inner.lock_shared();
        if let Some(transition) = shared.controller.resume()? {
            self.inner.apply(&mut shared, transition);
        }
        Ok(())
    }

    /// Return to idle, cancelling any outstanding timer (including a
    /// pending phase advance) and silencing the announcer.
    pub fn reset(&self) {
        debug!("session reset requested");
        let mut shared = self.inner.lock_shared();
        let transition = shared.controller.reset();
        self.inner.apply(&mut shared, transition);
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Watch channel that yields a fresh snapshot after every mutation,
    /// countdown decrements included.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Broadcast channel carrying semantic state-change events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.event_tx.subscribe()
    }
}

impl Inner {
    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Perform a transition's effects, then publish the new state.
    fn apply(&self, shared: &mut Shared, transition: Transition) {
        for effect in transition.effects {
            match effect {
                Effect::Announce(text) => self.announce(&text),
                Effect::Silence => {
                    if let Err(err) = self.announcer.interrupt() {
                        warn!(error = %err, "failed to silence announcer");
                    }
                }
                Effect::StartTicker => {
                    let handle = self.spawn_ticker();
                    shared.timer.install(TimerHandle::Ticker(handle));
                }
                Effect::StopTicker | Effect::CancelTimers => shared.timer.clear(),
                Effect::ScheduleAdvance => {
                    let handle = self.spawn_advance();
                    shared.timer.install(TimerHandle::AdvanceDelay(handle));
                }
            }
        }
        self.snapshot_tx.send_replace(shared.controller.snapshot());
        if let Some(event) = transition.event {
            let _ = self.event_tx.send(event);
        }
    }

    /// Interrupt whatever is being said, then speak. Failures are logged
    /// and swallowed; a mute announcer must not stall the timer.
    fn announce(&self, text: &str) {
        if let Err(err) = self.announcer.interrupt() {
            warn!(error = %err, "failed to interrupt announcer");
        }
        if let Err(err) = self.announcer.speak(text) {
            warn!(error = %err, text, "announcement failed");
        }
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let weak = self.weak.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + TICK_PERIOD;
            let mut interval = tokio::time::interval_at(start, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else { return };
                let mut shared = inner.lock_shared();
                if let Some(transition) = shared.controller.tick() {
                    inner.apply(&mut shared, transition);
                }
            }
        })
    }

    fn spawn_advance(&self) -> JoinHandle<()> {
        let weak = self.weak.clone();
        tokio::spawn(async move {
            tokio::time::sleep(INTER_PHASE_PAUSE).await;
            let Some(inner) = weak.upgrade() else { return };
            let mut shared = inner.lock_shared();
            if let Some(transition) = shared.controller.advance() {
                // The one-shot just fired; free its slot before the
                // transition installs a successor.
                shared.timer = TimerHandle::Idle;
                inner.apply(&mut shared, transition);
            }
        })
    }
}
