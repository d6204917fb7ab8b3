//! Turn orchestration.
//!
//! One turn: classify risk from the accumulated user text, compute the
//! effective stage, then produce a policy-compliant reply. Early stages are
//! answered straight from the repair templates; the recommendation stage
//! drives a bounded generate-validate-feedback loop and falls back to the
//! templates when attempts run out or the generator errors. The user always
//! receives a compliant message; generation trouble is telemetry, not a
//! failure.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::conversation::{latest_user_content, user_contents, Message, Stage};
use crate::domain::policy::constraints::{
    EMERGENCY_ACTION, EMERGENCY_ASSESSMENT, UNCLEAR_ACTION,
};
use crate::domain::policy::{
    assemble_escalation_reply, build_assessment_feedback, build_feedback, repair_response,
    sanitize_action, sanitize_assessment, validate_response, RepairContext, ValidationResult,
};
use crate::domain::triage::{TriageClassifier, TriageDecision, TriageLevel};
use crate::ports::{ChatMessage, GenerationRequest, Generator, ResponseFormat};

/// System prompt sent with every generation request.
const SYSTEM_PROMPT: &str = "You are a careful AI health assistant guiding a short triage \
conversation. You are not a clinician and you never diagnose. Use plain, calm, everyday \
language. Follow the stage instructions and required phrases exactly.";

/// One inbound turn: the full history plus the caller's current stage.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Conversation history, oldest first. The caller owns and resends it.
    pub messages: Vec<Message>,
    /// Stage the caller is currently on.
    pub stage: Stage,
}

/// Validation telemetry surfaced with each turn.
#[derive(Debug, Clone)]
pub struct TurnValidation {
    /// Whether the final reply passed validation.
    pub ok: bool,
    /// Rendered violation messages for the final reply.
    pub errors: Vec<String>,
    /// Rendered warnings for the final reply.
    pub warnings: Vec<String>,
    /// True when the deterministic fallback replaced generator output.
    pub repaired: bool,
    /// Present when the generator errored at any point during the turn.
    pub generator_error: Option<String>,
}

/// The outcome of one turn.
#[derive(Debug, Clone)]
pub struct TurnResponse {
    /// The policy-compliant reply to show the user.
    pub message: String,
    /// Stage the caller should submit next turn.
    pub next_stage: Stage,
    /// The triage decision for this turn.
    pub triage: TriageDecision,
    /// Validation telemetry.
    pub validation: TurnValidation,
    /// Deterministic action sentence; present only for escalation replies.
    pub emergency_action: Option<String>,
}

/// The outcome of reply production, before turn-level assembly.
#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    /// The reply text.
    pub text: String,
    /// Validation of the final text.
    pub validation: ValidationResult,
    /// True when the deterministic fallback produced the text.
    pub repaired: bool,
    /// Present when the generator errored.
    pub generator_error: Option<String>,
    /// Generation attempts consumed (0 for template-only stages).
    pub attempts: u32,
}

/// Explicit retry-loop state: the attempt counter, the last validation, and
/// the last generator error live here so the fallback trigger is a single
/// auditable predicate rather than control flow spread across recursion.
#[derive(Debug, Default)]
struct AttemptState {
    attempts: u32,
    last_validation: Option<ValidationResult>,
    generator_error: Option<String>,
}

impl AttemptState {
    /// True when generation must stop and the template fallback take over.
    fn must_fall_back(&self, max_attempts: u32) -> bool {
        self.generator_error.is_some() || self.attempts >= max_attempts
    }
}

#[derive(Debug, Deserialize)]
struct StructuredReply {
    assessment: Option<String>,
    action: Option<String>,
}

/// Deterministic action sentence for an escalation level.
fn emergency_action_for(level: TriageLevel) -> &'static str {
    match level {
        TriageLevel::Unclear => UNCLEAR_ACTION,
        _ => EMERGENCY_ACTION,
    }
}

/// Orchestrates one conversation turn.
pub struct TurnHandler {
    generator: Arc<dyn Generator>,
    classifier: TriageClassifier,
    max_attempts: u32,
}

impl TurnHandler {
    /// Creates a handler with the default attempt bound.
    pub fn new(generator: Arc<dyn Generator>, classifier: TriageClassifier) -> Self {
        Self {
            generator,
            classifier,
            max_attempts: 5,
        }
    }

    /// Sets the generation attempt bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Processes one turn end to end.
    pub async fn handle(&self, request: TurnRequest) -> TurnResponse {
        let user_messages = user_contents(&request.messages);
        let latest = latest_user_content(&request.messages);
        let symptom_context = user_messages.join(" ");

        let triage = self.classifier.classify(&user_messages).await;
        let user_count = user_messages.len();
        let effective = request.stage.effective(triage.level, user_count);
        let next_stage = effective.next(triage.level, user_count);

        if effective != request.stage {
            info!(
                requested = %request.stage,
                effective = %effective,
                triage = %triage.level,
                "emergency override engaged"
            );
        }

        let triage_level = effective.is_recommendation().then_some(triage.level);
        let mut context = RepairContext::new(effective);
        if let Some(level) = triage_level {
            context = context.with_triage_level(level);
        }
        if let Some(latest) = &latest {
            context = context.with_latest_user_message(latest.clone());
        }
        if !symptom_context.is_empty() {
            context = context.with_symptom_context(symptom_context);
        }

        let outcome = self.produce_reply(&context, &request.messages).await;

        let emergency_action = triage_level
            .filter(|level| level.needs_escalation())
            .map(|level| emergency_action_for(level).to_string());

        TurnResponse {
            message: outcome.text,
            next_stage,
            triage,
            validation: TurnValidation {
                ok: outcome.validation.ok(),
                errors: outcome.validation.error_messages(),
                warnings: outcome.validation.warning_messages(),
                repaired: outcome.repaired,
                generator_error: outcome.generator_error,
            },
            emergency_action,
        }
    }

    /// Produces a policy-compliant reply for the effective stage.
    ///
    /// Greeting, clarify, and concern are answered from the repair
    /// templates directly; the recommendation stage runs the bounded
    /// generation loop.
    pub async fn produce_reply(
        &self,
        context: &RepairContext,
        history: &[Message],
    ) -> ReplyOutcome {
        match context.stage {
            Stage::Greeting | Stage::Clarify | Stage::Concern => {
                let text = repair_response(context);
                let validation = validate_response(&text, context);
                ReplyOutcome {
                    text,
                    validation,
                    repaired: false,
                    generator_error: None,
                    attempts: 0,
                }
            }
            Stage::Recommendation => {
                let level = context.triage_level.unwrap_or(TriageLevel::Mild);
                if level.needs_escalation() {
                    self.escalation_loop(context, history, level).await
                } else {
                    self.free_text_loop(context, history).await
                }
            }
        }
    }

    fn base_request(&self, context: &RepairContext, history: &[Message]) -> GenerationRequest {
        let chat_history: Vec<ChatMessage> = history.iter().map(Into::into).collect();
        let mut request = GenerationRequest::new(context.stage)
            .with_system_prompt(SYSTEM_PROMPT)
            .with_history(chat_history);
        if let Some(level) = context.triage_level {
            request = request.with_triage_level(level);
        }
        if let Some(latest) = &context.latest_user_message {
            request = request.with_latest_user_message(latest.clone());
        }
        request
    }

    /// Generate-validate-feedback loop for mild recommendations.
    async fn free_text_loop(&self, context: &RepairContext, history: &[Message]) -> ReplyOutcome {
        let mut state = AttemptState::default();

        while !state.must_fall_back(self.max_attempts) {
            let mut request = self.base_request(context, history);
            if let Some(validation) = &state.last_validation {
                request = request.with_feedback(build_feedback(
                    &validation.errors,
                    context.stage,
                    context.triage_level,
                ));
            }
            state.attempts += 1;

            match self.generator.generate(request).await {
                Ok(text) => {
                    let validation = validate_response(&text, context);
                    if validation.ok() {
                        debug!(attempts = state.attempts, "generated reply accepted");
                        return ReplyOutcome {
                            text,
                            validation,
                            repaired: false,
                            generator_error: None,
                            attempts: state.attempts,
                        };
                    }
                    warn!(
                        attempt = state.attempts,
                        violations = validation.errors.len(),
                        "generated reply rejected"
                    );
                    state.last_validation = Some(validation);
                }
                Err(err) => {
                    warn!(error = %err, "generator failed, falling back to template");
                    state.generator_error = Some(err.to_string());
                }
            }
        }

        self.fall_back(context, state)
    }

    /// Structured assessment/action loop for escalation recommendations.
    ///
    /// Each attempt asks for `{assessment, action}` JSON, sanitizes both
    /// fields (substituting the deterministic default action when parsing
    /// fails or the action is empty), assembles the fixed escalation frame,
    /// and validates the assembled reply.
    async fn escalation_loop(
        &self,
        context: &RepairContext,
        history: &[Message],
        level: TriageLevel,
    ) -> ReplyOutcome {
        let default_action = sanitize_action(emergency_action_for(level));
        let mut state = AttemptState::default();

        while !state.must_fall_back(self.max_attempts) {
            let mut request = self
                .base_request(context, history)
                .with_response_format(ResponseFormat::AssessmentAction);
            if let Some(validation) = &state.last_validation {
                request = request.with_feedback(build_assessment_feedback(&validation.errors));
            }
            state.attempts += 1;

            let raw = match self.generator.generate(request).await {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(error = %err, "generator failed, falling back to template");
                    state.generator_error = Some(err.to_string());
                    continue;
                }
            };

            let (assessment, action) = match serde_json::from_str::<StructuredReply>(&raw) {
                Ok(parsed) => {
                    let assessment =
                        sanitize_assessment(parsed.assessment.as_deref().unwrap_or(&raw));
                    let action = parsed
                        .action
                        .as_deref()
                        .map(sanitize_action)
                        .filter(|a| !a.is_empty())
                        .unwrap_or_else(|| default_action.clone());
                    (assessment, action)
                }
                Err(err) => {
                    debug!(error = %err, "structured reply unparseable, sanitizing raw text");
                    (sanitize_assessment(&raw), default_action.clone())
                }
            };
            let assessment = if assessment.is_empty() {
                EMERGENCY_ASSESSMENT.to_string()
            } else {
                assessment
            };

            let text = assemble_escalation_reply(context, &assessment, &action);
            let validation = validate_response(&text, context);
            if validation.ok() {
                debug!(attempts = state.attempts, "assembled escalation reply accepted");
                return ReplyOutcome {
                    text,
                    validation,
                    repaired: false,
                    generator_error: None,
                    attempts: state.attempts,
                };
            }
            warn!(
                attempt = state.attempts,
                violations = validation.errors.len(),
                "assembled escalation reply rejected"
            );
            state.last_validation = Some(validation);
        }

        self.fall_back(context, state)
    }

    /// The terminal fallback: a template reply, flagged as repaired.
    fn fall_back(&self, context: &RepairContext, state: AttemptState) -> ReplyOutcome {
        let text = repair_response(context);
        let validation = validate_response(&text, context);
        ReplyOutcome {
            text,
            validation,
            repaired: true,
            generator_error: state.generator_error,
            attempts: state.attempts,
        }
    }
}
