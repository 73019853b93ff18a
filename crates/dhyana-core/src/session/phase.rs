use serde::{Deserialize, Serialize};

use crate::error::SequenceError;

/// One named, timed segment of a session.
///
/// Ordering inside a [`PhaseSequence`] is significant: sequence order is
/// execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub name: String,
    /// Duration in seconds. Must be at least 1.
    pub duration_secs: u64,
    /// Spoken when the phase begins.
    pub start_message: String,
    /// Spoken when the phase's countdown expires.
    pub end_message: String,
}

/// Immutable ordered list of phase definitions, fixed at startup.
///
/// Validated once at construction: the list is non-empty and every
/// duration is at least one second. Lookups past `len()` are a caller
/// defect, not a runtime condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseSequence {
    phases: Vec<PhaseDefinition>,
    completion_message: String,
}

impl PhaseSequence {
    pub fn new(
        phases: Vec<PhaseDefinition>,
        completion_message: impl Into<String>,
    ) -> Result<Self, SequenceError> {
        if phases.is_empty() {
            return Err(SequenceError::Empty);
        }
        for (index, phase) in phases.iter().enumerate() {
            if phase.duration_secs == 0 {
                return Err(SequenceError::ZeroDuration {
                    index,
                    name: phase.name.clone(),
                });
            }
        }
        Ok(Self {
            phases,
            completion_message: completion_message.into(),
        })
    }

    /// The default guided meditation sequence.
    pub fn guided_meditation() -> Self {
        Self {
            phases: default_phases(),
            completion_message: DEFAULT_COMPLETION_MESSAGE.into(),
        }
    }

    pub fn phase_at(&self, index: usize) -> &PhaseDefinition {
        &self.phases[index]
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Spoken once when the whole session finishes. Distinct from any
    /// individual phase's end message.
    pub fn completion_message(&self) -> &str {
        &self.completion_message
    }

    pub fn total_secs(&self) -> u64 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }
}

impl Default for PhaseSequence {
    fn default() -> Self {
        Self::guided_meditation()
    }
}

pub(crate) const DEFAULT_COMPLETION_MESSAGE: &str = "Meditation session completed. Namaste.";

pub(crate) fn default_phases() -> Vec<PhaseDefinition> {
    vec![
        PhaseDefinition {
            name: "Preparation".into(),
            duration_secs: 60,
            start_message: "Preparation started".into(),
            end_message: "Preparation ended".into(),
        },
        PhaseDefinition {
            name: "Pranayama".into(),
            duration_secs: 300,
            start_message: "Pranayama started".into(),
            end_message: "Pranayama done".into(),
        },
        PhaseDefinition {
            name: "Dhyana".into(),
            duration_secs: 600,
            start_message: "Meditation started".into(),
            end_message: "Meditation done".into(),
        },
        PhaseDefinition {
            name: "Ending".into(),
            duration_secs: 180,
            start_message: "Session complete".into(),
            end_message: "Session complete".into(),
        },
    ]
}
