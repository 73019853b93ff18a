use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in the session produces an Event.
/// The presentation layer subscribes to these; per-second countdown
/// updates are published as snapshots instead and have no event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A phase began counting down (the first phase or any later one).
    PhaseStarted {
        phase_index: usize,
        phase_name: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase's countdown expired; the inter-phase gap begins.
    PhaseEnded {
        phase_index: usize,
        phase_name: String,
        at: DateTime<Utc>,
    },
    SessionPaused {
        phase_index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        phase_index: usize,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The final phase's gap elapsed; the session is over.
    SessionCompleted { at: DateTime<Utc> },
    SessionReset { at: DateTime<Utc> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_with_variant_name() {
        let event = Event::PhaseStarted {
            phase_index: 0,
            phase_name: "Preparation".into(),
            duration_secs: 60,
            at: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "PhaseStarted");
        assert_eq!(value["phase_index"], 0);
        assert_eq!(value["duration_secs"], 60);
    }
}
