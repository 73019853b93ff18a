//! Session controller implementation.
//!
//! The controller is a pure state machine. It owns no timers and performs
//! no speech: every operation mutates state and returns a [`Transition`]
//! whose [`Effect`]s the runtime layer carries out. This keeps the
//! countdown and phase-transition rules testable without a scheduler or a
//! TTS engine.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Active(i, remaining, running) -> BetweenPhases(i) -> Active(i+1, ..) | Idle
//! ```
//!
//! `tick()` is driven once per second while running. A phase of duration
//! `d` decrements through `d-1 .. 0`, and the tick after that expires the
//! phase: the end message is announced and the advance is scheduled after
//! a fixed gap. During the gap the session still counts as running but no
//! ticking occurs.

use std::time::Duration;

use chrono::Utc;

use super::phase::PhaseSequence;
use crate::error::SessionError;
use crate::events::Event;

/// Gap between a phase's countdown expiring and the next phase (or the
/// completion announcement) beginning. Not part of any phase's duration.
pub const INTER_PHASE_PAUSE: Duration = Duration::from_millis(3500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Active {
        phase: usize,
        remaining: u64,
        running: bool,
    },
    /// Countdown expired, waiting out the inter-phase gap. The session is
    /// still running but the per-second ticker is suspended.
    BetweenPhases { phase: usize },
}

/// Side effect requested by a transition, performed by the runtime layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Interrupt any current utterance, then speak this text.
    Announce(String),
    /// Register the per-second tick source. At most one may exist.
    StartTicker,
    /// Cancel the per-second tick source.
    StopTicker,
    /// Register the one-shot advance after [`INTER_PHASE_PAUSE`].
    /// Mutually exclusive with the ticker.
    ScheduleAdvance,
    /// Cancel whichever timer is outstanding, ticker or pending advance.
    CancelTimers,
    /// Interrupt any current utterance without speaking a new one.
    Silence,
}

/// Result of a state mutation: the notification to publish (if the change
/// is more than a countdown decrement) and the side effects to perform.
#[derive(Debug)]
pub struct Transition {
    pub event: Option<Event>,
    pub effects: Vec<Effect>,
}

/// Where the session goes once a phase's gap has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Advance(usize),
    Complete,
}

/// The phase following `index` in a sequence of `count` phases, or
/// completion when `index` is the last.
pub fn next_after(index: usize, count: usize) -> PhaseOutcome {
    if index + 1 < count {
        PhaseOutcome::Advance(index + 1)
    } else {
        PhaseOutcome::Complete
    }
}

/// Read-only view of the session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionSnapshot {
    pub phase_index: Option<usize>,
    pub phase_name: Option<String>,
    pub remaining_secs: u64,
    /// Configured duration of the current phase, 0 when idle.
    pub total_secs: u64,
    pub is_running: bool,
}

impl SessionSnapshot {
    /// Current phase name, or "Ready" when no phase is active.
    pub fn display_name(&self) -> &str {
        self.phase_name.as_deref().unwrap_or("Ready")
    }

    /// Remaining time as zero-padded `MM:SS`.
    pub fn clock(&self) -> String {
        format!("{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}

/// Core session controller.
///
/// Not designed for concurrent callers; the runtime layer serializes all
/// access behind one lock.
#[derive(Debug, Clone)]
pub struct SessionController {
    sequence: PhaseSequence,
    state: SessionState,
}

impl SessionController {
    /// Create an idle controller over a validated sequence.
    pub fn new(sequence: PhaseSequence) -> Self {
        Self {
            sequence,
            state: SessionState::Idle,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn sequence(&self) -> &PhaseSequence {
        &self.sequence
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    pub fn is_running(&self) -> bool {
        match self.state {
            SessionState::Active { running, .. } => running,
            SessionState::BetweenPhases { .. } => true,
            SessionState::Idle => false,
        }
    }

    pub fn is_between_phases(&self) -> bool {
        matches!(self.state, SessionState::BetweenPhases { .. })
    }

    pub fn phase_index(&self) -> Option<usize> {
        match self.state {
            SessionState::Idle => None,
            SessionState::Active { phase, .. } | SessionState::BetweenPhases { phase } => {
                Some(phase)
            }
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        match self.state {
            SessionState::Active { remaining, .. } => remaining,
            _ => 0,
        }
    }

    /// Build a full state snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        let phase_index = self.phase_index();
        let phase = phase_index.map(|i| self.sequence.phase_at(i));
        SessionSnapshot {
            phase_index,
            phase_name: phase.map(|p| p.name.clone()),
            remaining_secs: self.remaining_secs(),
            total_secs: phase.map(|p| p.duration_secs).unwrap_or(0),
            is_running: self.is_running(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the first phase. Rejected unless the controller is idle:
    /// starting over an in-progress session would silently discard it.
    pub fn start(&mut self) -> Result<Transition, SessionError> {
        match self.state {
            SessionState::Idle => Ok(self.enter_phase(0)),
            _ => Err(SessionError::InvalidOperation {
                op: "start",
                reason: "a session is already in progress",
            }),
        }
    }

    /// Apply one elapsed second. Only mutates while actively counting
    /// down; a tick landing in any other state is a stray wakeup from an
    /// already-cancelled timer and is ignored.
    pub fn tick(&mut self) -> Option<Transition> {
        let SessionState::Active {
            phase,
            remaining,
            running: true,
        } = self.state
        else {
            return None;
        };

        if remaining > 0 {
            self.state = SessionState::Active {
                phase,
                remaining: remaining - 1,
                running: true,
            };
            return Some(Transition {
                event: None,
                effects: Vec::new(),
            });
        }

        // Phase expired: suspend ticking for the inter-phase gap.
        let def = self.sequence.phase_at(phase);
        self.state = SessionState::BetweenPhases { phase };
        Some(Transition {
            event: Some(Event::PhaseEnded {
                phase_index: phase,
                phase_name: def.name.clone(),
                at: Utc::now(),
            }),
            effects: vec![
                Effect::StopTicker,
                Effect::Announce(def.end_message.clone()),
                Effect::ScheduleAdvance,
            ],
        })
    }

    /// Move past an expired phase once its gap has elapsed: either into
    /// the next phase or, after the last one, back to idle with the
    /// completion announcement. Ignored outside the gap (a stray wakeup
    /// from a cancelled advance timer).
    pub fn advance(&mut self) -> Option<Transition> {
        let SessionState::BetweenPhases { phase } = self.state else {
            return None;
        };

        match next_after(phase, self.sequence.len()) {
            PhaseOutcome::Advance(next) => Some(self.enter_phase(next)),
            PhaseOutcome::Complete => {
                self.state = SessionState::Idle;
                Some(Transition {
                    event: Some(Event::SessionCompleted { at: Utc::now() }),
                    effects: vec![Effect::Announce(
                        self.sequence.completion_message().to_string(),
                    )],
                })
            }
        }
    }

    /// Suspend the countdown. No announcement. No-op when idle, already
    /// paused, or inside the inter-phase gap (the gap is not
    /// user-controllable).
    pub fn pause(&mut self) -> Option<Transition> {
        let SessionState::Active {
            phase,
            remaining,
            running: true,
        } = self.state
        else {
            return None;
        };

        self.state = SessionState::Active {
            phase,
            remaining,
            running: false,
        };
        Some(Transition {
            event: Some(Event::SessionPaused {
                phase_index: phase,
                remaining_secs: remaining,
                at: Utc::now(),
            }),
            effects: vec![Effect::StopTicker],
        })
    }

    /// Continue a paused countdown from where it stopped. No announcement.
    /// No-op when already running; rejected when idle, inside the
    /// inter-phase gap, or paused with nothing left to count.
    pub fn resume(&mut self) -> Result<Option<Transition>, SessionError> {
        match self.state {
            SessionState::Active { running: true, .. } => Ok(None),
            SessionState::Active {
                phase,
                remaining,
                running: false,
            } if remaining > 0 => {
                self.state = SessionState::Active {
                    phase,
                    remaining,
                    running: true,
                };
                Ok(Some(Transition {
                    event: Some(Event::SessionResumed {
                        phase_index: phase,
                        remaining_secs: remaining,
                        at: Utc::now(),
                    }),
                    effects: vec![Effect::StartTicker],
                }))
            }
            SessionState::Active { .. } => Err(SessionError::InvalidOperation {
                op: "resume",
                reason: "the phase has already elapsed",
            }),
            SessionState::BetweenPhases { .. } => Err(SessionError::InvalidOperation {
                op: "resume",
                reason: "the gap between phases is not pausable",
            }),
            SessionState::Idle => Err(SessionError::InvalidOperation {
                op: "resume",
                reason: "no session is in progress",
            }),
        }
    }

    /// Return to idle from any state. Cancels whichever timer is
    /// outstanding (including a pending advance) and interrupts any
    /// in-flight utterance. Issues no new announcement. Always legal.
    pub fn reset(&mut self) -> Transition {
        self.state = SessionState::Idle;
        Transition {
            event: Some(Event::SessionReset { at: Utc::now() }),
            effects: vec![Effect::CancelTimers, Effect::Silence],
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_phase(&mut self, phase: usize) -> Transition {
        let def = self.sequence.phase_at(phase);
        self.state = SessionState::Active {
            phase,
            remaining: def.duration_secs,
            running: true,
        };
        Transition {
            event: Some(Event::PhaseStarted {
                phase_index: phase,
                phase_name: def.name.clone(),
                duration_secs: def.duration_secs,
                at: Utc::now(),
            }),
            effects: vec![
                Effect::Announce(def.start_message.clone()),
                Effect::StartTicker,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::phase::PhaseDefinition;

    fn two_phase() -> PhaseSequence {
        PhaseSequence::new(
            vec![
                PhaseDefinition {
                    name: "Prep".into(),
                    duration_secs: 2,
                    start_message: "S1".into(),
                    end_message: "E1".into(),
                },
                PhaseDefinition {
                    name: "Med".into(),
                    duration_secs: 3,
                    start_message: "S2".into(),
                    end_message: "E2".into(),
                },
            ],
            "All done",
        )
        .unwrap()
    }

    fn controller() -> SessionController {
        SessionController::new(two_phase())
    }

    #[test]
    fn next_after_advances_until_last() {
        assert_eq!(next_after(0, 2), PhaseOutcome::Advance(1));
        assert_eq!(next_after(1, 2), PhaseOutcome::Complete);
        assert_eq!(next_after(0, 1), PhaseOutcome::Complete);
    }

    #[test]
    fn start_enters_first_phase() {
        let mut c = controller();
        let t = c.start().unwrap();
        assert_eq!(c.phase_index(), Some(0));
        assert_eq!(c.remaining_secs(), 2);
        assert!(c.is_running());
        assert_eq!(
            t.effects,
            vec![Effect::Announce("S1".into()), Effect::StartTicker]
        );
        assert!(matches!(t.event, Some(Event::PhaseStarted { phase_index: 0, .. })));
    }

    #[test]
    fn start_twice_is_rejected_without_losing_progress() {
        let mut c = controller();
        c.start().unwrap();
        c.tick().unwrap();
        let err = c.start().unwrap_err();
        assert!(matches!(err, SessionError::InvalidOperation { op: "start", .. }));
        assert_eq!(c.remaining_secs(), 1);
        assert!(c.is_running());
    }

    #[test]
    fn ticks_count_down_without_skipping() {
        let mut c = controller();
        c.start().unwrap();
        let t = c.tick().unwrap();
        assert!(t.event.is_none());
        assert!(t.effects.is_empty());
        assert_eq!(c.remaining_secs(), 1);
        c.tick().unwrap();
        assert_eq!(c.remaining_secs(), 0);
        assert!(c.is_running());
        assert!(!c.is_between_phases());
    }

    #[test]
    fn expiry_tick_stops_ticker_announces_end_and_schedules_advance() {
        let mut c = controller();
        c.start().unwrap();
        c.tick().unwrap();
        c.tick().unwrap();
        let t = c.tick().unwrap();
        assert_eq!(
            t.effects,
            vec![
                Effect::StopTicker,
                Effect::Announce("E1".into()),
                Effect::ScheduleAdvance,
            ]
        );
        assert!(matches!(t.event, Some(Event::PhaseEnded { phase_index: 0, .. })));
        assert!(c.is_between_phases());
        assert!(c.is_running());
        assert_eq!(c.remaining_secs(), 0);
    }

    #[test]
    fn ticks_inside_the_gap_are_ignored() {
        let mut c = controller();
        c.start().unwrap();
        for _ in 0..3 {
            c.tick().unwrap();
        }
        assert!(c.is_between_phases());
        assert!(c.tick().is_none());
        assert!(c.is_between_phases());
    }

    #[test]
    fn advance_enters_next_phase() {
        let mut c = controller();
        c.start().unwrap();
        for _ in 0..3 {
            c.tick().unwrap();
        }
        let t = c.advance().unwrap();
        assert_eq!(c.phase_index(), Some(1));
        assert_eq!(c.remaining_secs(), 3);
        assert!(c.is_running());
        assert_eq!(
            t.effects,
            vec![Effect::Announce("S2".into()), Effect::StartTicker]
        );
    }

    #[test]
    fn advance_after_last_phase_completes_the_session() {
        let mut c = controller();
        c.start().unwrap();
        for _ in 0..3 {
            c.tick().unwrap();
        }
        c.advance().unwrap();
        for _ in 0..4 {
            c.tick().unwrap();
        }
        assert!(c.is_between_phases());
        let t = c.advance().unwrap();
        assert!(c.is_idle());
        assert!(!c.is_running());
        assert_eq!(c.remaining_secs(), 0);
        assert_eq!(t.effects, vec![Effect::Announce("All done".into())]);
        assert!(matches!(t.event, Some(Event::SessionCompleted { .. })));
    }

    #[test]
    fn advance_outside_the_gap_is_ignored() {
        let mut c = controller();
        assert!(c.advance().is_none());
        c.start().unwrap();
        assert!(c.advance().is_none());
        assert_eq!(c.remaining_secs(), 2);
    }

    #[test]
    fn pause_stops_the_ticker_and_holds_remaining() {
        let mut c = controller();
        c.start().unwrap();
        c.tick().unwrap();
        let t = c.pause().unwrap();
        assert_eq!(t.effects, vec![Effect::StopTicker]);
        assert!(!c.is_running());
        assert_eq!(c.remaining_secs(), 1);
        // Stray ticks after the pause change nothing.
        assert!(c.tick().is_none());
        assert_eq!(c.remaining_secs(), 1);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut c = controller();
        c.start().unwrap();
        c.pause().unwrap();
        assert!(c.pause().is_none());
        assert!(!c.is_running());
        assert_eq!(c.remaining_secs(), 2);
    }

    #[test]
    fn pause_when_idle_or_mid_gap_is_a_noop() {
        let mut c = controller();
        assert!(c.pause().is_none());
        c.start().unwrap();
        for _ in 0..3 {
            c.tick().unwrap();
        }
        assert!(c.is_between_phases());
        assert!(c.pause().is_none());
        assert!(c.is_between_phases());
    }

    #[test]
    fn resume_continues_from_paused_value() {
        let mut c = controller();
        c.start().unwrap();
        c.tick().unwrap();
        c.pause().unwrap();
        let t = c.resume().unwrap().unwrap();
        assert_eq!(t.effects, vec![Effect::StartTicker]);
        assert!(c.is_running());
        c.tick().unwrap();
        assert_eq!(c.remaining_secs(), 0);
    }

    #[test]
    fn resume_while_running_is_a_noop() {
        let mut c = controller();
        c.start().unwrap();
        assert!(c.resume().unwrap().is_none());
        assert_eq!(c.remaining_secs(), 2);
    }

    #[test]
    fn resume_when_idle_is_rejected() {
        let mut c = controller();
        let err = c.resume().unwrap_err();
        assert!(matches!(err, SessionError::InvalidOperation { op: "resume", .. }));
    }

    #[test]
    fn resume_mid_gap_is_rejected() {
        let mut c = controller();
        c.start().unwrap();
        for _ in 0..3 {
            c.tick().unwrap();
        }
        assert!(c.is_between_phases());
        let err = c.resume().unwrap_err();
        assert!(matches!(err, SessionError::InvalidOperation { op: "resume", .. }));
        assert!(c.is_between_phases());
    }

    #[test]
    fn resume_paused_at_zero_is_rejected() {
        let mut c = controller();
        c.start().unwrap();
        c.tick().unwrap();
        c.tick().unwrap();
        assert_eq!(c.remaining_secs(), 0);
        c.pause().unwrap();
        let err = c.resume().unwrap_err();
        assert!(matches!(err, SessionError::InvalidOperation { op: "resume", .. }));
        // reset is the recovery path
        c.reset();
        assert!(c.is_idle());
    }

    #[test]
    fn reset_cancels_everything_from_any_state() {
        let mut c = controller();
        c.start().unwrap();
        for _ in 0..3 {
            c.tick().unwrap();
        }
        assert!(c.is_between_phases());
        let t = c.reset();
        assert_eq!(t.effects, vec![Effect::CancelTimers, Effect::Silence]);
        assert!(c.is_idle());
        assert!(!c.is_running());
        assert_eq!(c.remaining_secs(), 0);
        // Stray wakeups from the cancelled timers are ignored.
        assert!(c.tick().is_none());
        assert!(c.advance().is_none());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut c = controller();
        c.start().unwrap();
        c.reset();
        let t = c.reset();
        assert!(c.is_idle());
        assert_eq!(t.effects, vec![Effect::CancelTimers, Effect::Silence]);
    }

    #[test]
    fn snapshot_reflects_each_state() {
        let mut c = controller();
        let idle = c.snapshot();
        assert_eq!(idle.display_name(), "Ready");
        assert_eq!(idle.clock(), "00:00");
        assert!(!idle.is_running);

        c.start().unwrap();
        let active = c.snapshot();
        assert_eq!(active.display_name(), "Prep");
        assert_eq!(active.phase_index, Some(0));
        assert_eq!(active.total_secs, 2);
        assert_eq!(active.clock(), "00:02");

        for _ in 0..3 {
            c.tick().unwrap();
        }
        let gap = c.snapshot();
        assert_eq!(gap.phase_index, Some(0));
        assert_eq!(gap.remaining_secs, 0);
        assert!(gap.is_running);
    }

    #[test]
    fn clock_zero_pads_minutes_and_seconds() {
        let snap = SessionSnapshot {
            phase_index: Some(0),
            phase_name: Some("Dhyana".into()),
            remaining_secs: 600,
            total_secs: 600,
            is_running: true,
        };
        assert_eq!(snap.clock(), "10:00");
        let snap = SessionSnapshot { remaining_secs: 59, ..snap };
        assert_eq!(snap.clock(), "00:59");
        let snap = SessionSnapshot { remaining_secs: 61, ..snap };
        assert_eq!(snap.clock(), "01:01");
    }
}
