//! Voice-output capability.
//!
//! The session core treats speech as an opaque collaborator: it can stop
//! whatever is being said and begin saying something new. Announcements
//! are always delivered as interrupt-then-speak so utterances never
//! overlap in audio output. Implementations wrap a real TTS engine; the
//! crate ships [`NullAnnouncer`] for headless use and tests.

use crate::error::AnnounceError;

/// External speech capability.
///
/// Both operations are fire-and-forget from the session's perspective:
/// `speak` begins an utterance and returns, it does not wait for the
/// utterance to finish. Errors are reported so the runtime can log them,
/// but a failed announcement never blocks or corrupts the timer.
pub trait Announcer: Send + Sync {
    /// Stop any current utterance.
    fn interrupt(&self) -> Result<(), AnnounceError>;

    /// Begin announcing `text`.
    fn speak(&self, text: &str) -> Result<(), AnnounceError>;
}

/// Announcer that discards every utterance.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnnouncer;

impl Announcer for NullAnnouncer {
    fn interrupt(&self) -> Result<(), AnnounceError> {
        Ok(())
    }

    fn speak(&self, _text: &str) -> Result<(), AnnounceError> {
        Ok(())
    }
}
