//! # Dhyana Core Library
//!
//! Core library for Dhyana, a guided meditation session timer. A session
//! is a fixed ordered list of timed phases; the library counts each phase
//! down, announces transitions through a pluggable voice capability, and
//! exposes pause/resume/reset controls. The embedding presentation layer
//! (GUI, TTS engine) stays outside this crate.
//!
//! ## Architecture
//!
//! - **Session Controller**: A pure state machine. Every operation
//!   returns the side effects to perform, so the countdown and
//!   phase-transition rules are testable without timers or speech.
//! - **Session Runtime**: A tokio-backed layer that owns the per-second
//!   ticker and the one-shot inter-phase delay, performs announcements,
//!   and publishes snapshots and events.
//! - **Announcer**: Trait boundary for the external voice output.
//!   Announcements are always interrupt-then-speak, so utterances never
//!   overlap.
//! - **Config**: TOML phase-list configuration loaded once at startup,
//!   defaulting to the guided meditation sequence.
//!
//! ## Key Components
//!
//! - [`SessionController`]: Core phase-sequencing state machine
//! - [`SessionRuntime`]: Timer ownership and effect execution
//! - [`PhaseSequence`]: Validated, immutable phase list
//! - [`Announcer`]: Voice-output capability trait

pub mod announce;
pub mod config;
pub mod error;
pub mod events;
pub mod session;

pub use announce::{Announcer, NullAnnouncer};
pub use config::SessionConfig;
pub use error::{AnnounceError, ConfigError, SequenceError, SessionError};
pub use events::Event;
pub use session::{
    PhaseDefinition, PhaseSequence, SessionController, SessionRuntime, SessionSnapshot,
};
