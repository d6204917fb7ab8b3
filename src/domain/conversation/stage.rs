//! Conversation stages and the stage transition machine.
//!
//! Stages advance strictly forward through
//! `Greeting -> Clarify -> Concern -> Recommendation`, with a single
//! override: a conclusively life-threatening triage level jumps straight to
//! `Recommendation`. The override never fires on the greeting turn - a
//! single alarming first utterance must not skip consent and safety framing
//! before any clarification has happened.
//!
//! Transitions are pure functions of the current stage and the fresh triage
//! decision; nothing is cached between turns.

use serde::{Deserialize, Serialize};

use crate::domain::triage::TriageLevel;

/// The current stage of a triage conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Opening turn: consent, safety disclaimer, and the timeline question.
    Greeting,

    /// Gathering detail: empathy plus red-flag screening questions.
    Clarify,

    /// Eliciting what worries the user most.
    Concern,

    /// Terminal stage: self-care steps or an escalation instruction.
    Recommendation,
}

impl Stage {
    /// Returns a short label for the stage, suitable for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Clarify => "clarify",
            Self::Concern => "concern",
            Self::Recommendation => "recommendation",
        }
    }

    /// Returns true if this stage produces a recommendation-format reply.
    pub fn is_recommendation(&self) -> bool {
        matches!(self, Self::Recommendation)
    }

    /// Returns true if replies in this stage must contain the
    /// acknowledgment phrase.
    pub fn requires_acknowledgment(&self) -> bool {
        !matches!(self, Self::Greeting)
    }

    /// True when the emergency override applies: the triage level is
    /// life-threatening, the conversation is already underway, and we are
    /// past the greeting turn.
    fn emergency_override(self, triage: TriageLevel, user_message_count: usize) -> bool {
        triage == TriageLevel::Emergency && user_message_count > 0 && self != Self::Greeting
    }

    /// The stage whose reply contract applies to the current turn.
    ///
    /// Identical to the requested stage except when the emergency override
    /// fires, in which case the turn is answered with the recommendation
    /// contract immediately.
    pub fn effective(self, triage: TriageLevel, user_message_count: usize) -> Stage {
        if self.emergency_override(triage, user_message_count) {
            Self::Recommendation
        } else {
            self
        }
    }

    /// The stage the caller should submit on the next turn.
    ///
    /// Emergency override jumps to `Recommendation`; otherwise the linear
    /// advance applies. `Recommendation` is terminal.
    pub fn next(self, triage: TriageLevel, user_message_count: usize) -> Stage {
        if self.emergency_override(triage, user_message_count) {
            return Self::Recommendation;
        }
        match self {
            Self::Greeting => Self::Clarify,
            Self::Clarify => Self::Concern,
            Self::Concern => Self::Recommendation,
            Self::Recommendation => Self::Recommendation,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Greeting
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
