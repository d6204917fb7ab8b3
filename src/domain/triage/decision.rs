//! Triage decision value objects.
//!
//! A `TriageDecision` is produced fresh on every turn from the accumulated
//! user text and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Coarse urgency classification of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageLevel {
    /// Self-care territory.
    Mild,
    /// Immediate danger.
    Emergency,
    /// Needs professional evaluation, not immediately life-threatening.
    Unclear,
}

impl TriageLevel {
    /// Returns true if this level requires an escalation-format reply.
    pub fn needs_escalation(&self) -> bool {
        !matches!(self, Self::Mild)
    }

    /// Returns a short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Emergency => "emergency",
            Self::Unclear => "unclear",
        }
    }
}

impl Default for TriageLevel {
    fn default() -> Self {
        Self::Mild
    }
}

impl std::fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Red flag id recorded when the critical-pattern safety net fires.
pub const CRITICAL_EMERGENCY_FLAG: &str = "critical_emergency_pattern";

/// The classifier's verdict for one turn.
///
/// # Invariants
///
/// - `level == Emergency` whenever any critical-pattern combination matched;
///   no other rule or external classifier can downgrade that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageDecision {
    /// Urgency classification.
    pub level: TriageLevel,
    /// Ids of matched compound red-flag rules, in rule-table order.
    pub red_flags: Vec<String>,
    /// Ids of matched high-risk patient factors.
    pub high_risk: Vec<String>,
    /// Ids of matched severity markers.
    pub severe_signals: Vec<String>,
    /// Optional human-readable rationale (semantic pass only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl TriageDecision {
    /// The non-overridable verdict for a critical-pattern match.
    pub fn critical_emergency() -> Self {
        Self {
            level: TriageLevel::Emergency,
            red_flags: vec![CRITICAL_EMERGENCY_FLAG.to_string()],
            high_risk: Vec::new(),
            severe_signals: Vec::new(),
            reasoning: Some(
                "Critical emergency pattern detected - immediate escalation required".to_string(),
            ),
        }
    }

    /// A mild decision with no matched signals.
    pub fn mild() -> Self {
        Self {
            level: TriageLevel::Mild,
            red_flags: Vec::new(),
            high_risk: Vec::new(),
            severe_signals: Vec::new(),
            reasoning: None,
        }
    }

    /// Returns true if the safety net produced this decision.
    pub fn is_critical(&self) -> bool {
        self.red_flags.iter().any(|f| f == CRITICAL_EMERGENCY_FLAG)
    }
}
