mod controller;
pub(crate) mod phase;
mod runtime;

pub use controller::{
    next_after, Effect, PhaseOutcome, SessionController, SessionSnapshot, Transition,
    INTER_PHASE_PAUSE,
};
pub use phase::{PhaseDefinition, PhaseSequence};
pub use runtime::{SessionRuntime, TICK_PERIOD};
