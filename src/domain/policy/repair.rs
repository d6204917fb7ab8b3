//! Deterministic repair templates.
//!
//! `repair_response` synthesizes a policy-compliant reply for any
//! (stage, triage level, message context) tuple. It is the sole reply
//! source for the early stages and the guaranteed fallback when generation
//! fails; it has no failure modes and no external dependencies, and its
//! output always passes the validator for the same context.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::Stage;
use crate::domain::policy::constraints::{
    worry_empathy, ACKNOWLEDGMENT, CHECK_IN, CLARIFY_DETAIL_PROMPT, COMFORT_LINE,
    CONCERN_QUESTION, DISCLAIMER, EMERGENCY_ASSESSMENT, EMERGENCY_LEAD_IN,
    EMERGENCY_TEMPLATE_ACTION, ESCALATION_PHRASE, FOLLOW_UP_SENTENCE, GREETING_OPENING,
    IMMEDIATE_DANGER_NOTICE, MILD_SELF_CARE_STEPS, PAIN_EMPATHY, RECOMMEND_PHRASE,
    TIMELINE_QUESTION, UNCLEAR_ASSESSMENT, UNCLEAR_TEMPLATE_ACTION,
};
use crate::domain::triage::patterns::{
    pain_indicated, screening_questions, symptom_label, worry_indicated,
};
use crate::domain::triage::TriageLevel;

/// Per-turn context for template synthesis and validation.
///
/// Ephemeral: constructed from the turn request, discarded with it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairContext {
    /// Stage whose reply contract applies.
    pub stage: Stage,
    /// Triage level; only meaningful at the recommendation stage.
    pub triage_level: Option<TriageLevel>,
    /// Content of the most recent user message.
    pub latest_user_message: Option<String>,
    /// Accumulated user text for symptom detection.
    pub symptom_context: Option<String>,
}

impl RepairContext {
    /// Creates a context for the given stage.
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            ..Default::default()
        }
    }

    /// Sets the triage level.
    pub fn with_triage_level(mut self, level: TriageLevel) -> Self {
        self.triage_level = Some(level);
        self
    }

    /// Sets the latest user message.
    pub fn with_latest_user_message(mut self, message: impl Into<String>) -> Self {
        self.latest_user_message = Some(message.into());
        self
    }

    /// Sets the accumulated symptom context.
    pub fn with_symptom_context(mut self, context: impl Into<String>) -> Self {
        self.symptom_context = Some(context.into());
        self
    }

    /// The text symptom detection should read: accumulated context first,
    /// latest message otherwise.
    fn symptom_text(&self) -> Option<&str> {
        self.symptom_context
            .as_deref()
            .or(self.latest_user_message.as_deref())
    }
}

/// Empathy sentences owed to the latest user message, in fixed order.
pub(crate) fn empathy_lines(context: &RepairContext) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(latest) = context.latest_user_message.as_deref() else {
        return lines;
    };
    if pain_indicated(latest) {
        lines.push(PAIN_EMPATHY.to_string());
    }
    if worry_indicated(latest) {
        let label = symptom_label(context.symptom_text());
        lines.push(worry_empathy(label));
    }
    lines
}

/// Acknowledgment sentence as emitted by the templates.
fn acknowledgment() -> String {
    format!("{}.", ACKNOWLEDGMENT)
}

/// Synthesizes a compliant reply for the given context.
pub fn repair_response(context: &RepairContext) -> String {
    match context.stage {
        Stage::Greeting => greeting_reply(),
        Stage::Clarify => clarify_reply(context),
        Stage::Concern => concern_reply(context),
        Stage::Recommendation => recommendation_reply(context),
    }
}

fn greeting_reply() -> String {
    [
        GREETING_OPENING.to_string(),
        format!("{}.", DISCLAIMER),
        IMMEDIATE_DANGER_NOTICE.to_string(),
        TIMELINE_QUESTION.to_string(),
    ]
    .join(" ")
}

fn clarify_reply(context: &RepairContext) -> String {
    let screening = screening_questions(context.symptom_text().unwrap_or(""));

    let mut parts = vec![acknowledgment()];
    parts.extend(empathy_lines(context));
    parts.push(CLARIFY_DETAIL_PROMPT.to_string());
    parts.extend(screening);
    parts.push(COMFORT_LINE.to_string());
    parts.join(" ")
}

fn concern_reply(context: &RepairContext) -> String {
    let mut parts = vec![acknowledgment()];
    parts.extend(empathy_lines(context));
    parts.push(CONCERN_QUESTION.to_string());
    parts.join(" ")
}

fn recommendation_reply(context: &RepairContext) -> String {
    let level = context.triage_level.unwrap_or(TriageLevel::Mild);
    match level {
        TriageLevel::Mild => mild_recommendation(context),
        TriageLevel::Unclear | TriageLevel::Emergency => escalation_recommendation(context, level),
    }
}

fn mild_recommendation(context: &RepairContext) -> String {
    let symptom = symptom_label(context.symptom_text());

    let mut lines = vec![acknowledgment()];
    lines.extend(empathy_lines(context));
    lines.push(format!("{}.", DISCLAIMER));
    lines.push(format!(
        "Based on what you shared about {}, here are some self-care steps:",
        symptom
    ));
    for (index, step) in MILD_SELF_CARE_STEPS.iter().enumerate() {
        lines.push(format!("{}. {} {}", index + 1, step, CHECK_IN));
    }
    lines.push(FOLLOW_UP_SENTENCE.to_string());
    lines.push(COMFORT_LINE.to_string());
    lines.join("\n")
}

/// Assembles the escalation reply from an assessment clause and an action
/// sentence. Shared with the orchestrator's structured sub-flow so a
/// sanitized generator assessment lands in the exact same frame.
pub(crate) fn assemble_escalation_reply(
    context: &RepairContext,
    assessment: &str,
    action: &str,
) -> String {
    let action_sentence = if action.ends_with(['.', '!', '?']) {
        action.to_string()
    } else {
        format!("{}.", action)
    };

    let mut parts = vec![format!("{}, {}.", EMERGENCY_LEAD_IN, assessment)];
    parts.push(acknowledgment());
    parts.extend(empathy_lines(context));
    parts.push(format!("{}.", ESCALATION_PHRASE));
    parts.push(format!("{}: {} {}", RECOMMEND_PHRASE, action_sentence, CHECK_IN));
    parts.push(FOLLOW_UP_SENTENCE.to_string());
    parts.push(format!("{}.", DISCLAIMER));
    parts.join(" ")
}

fn escalation_recommendation(context: &RepairContext, level: TriageLevel) -> String {
    let (assessment, action) = match level {
        TriageLevel::Unclear => (UNCLEAR_ASSESSMENT, UNCLEAR_TEMPLATE_ACTION),
        _ => (EMERGENCY_ASSESSMENT, EMERGENCY_TEMPLATE_ACTION),
    };
    assemble_escalation_reply(context, assessment, action)
}
