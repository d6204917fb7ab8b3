//! Response validator: checks a candidate reply against the exact-phrase
//! and format contract for its stage and triage level.
//!
//! Violations are typed so the feedback builder can map each one to a
//! concrete corrective instruction without string matching; `Display`
//! renders the message surfaced to telemetry. Errors block acceptance,
//! warnings never do.

use std::fmt;

use crate::domain::policy::constraints::{
    worry_empathy, ACKNOWLEDGMENT, BANNED_PHRASES, CHECK_IN, COMFORT_LINE, CONCERN_QUESTION,
    DISCLAIMER, EMERGENCY_LEAD_IN, ESCALATION_PHRASE, FOLLOW_UP_RE, JARGON_TERMS,
    NUMBERED_LINE_RE, PAIN_EMPATHY, RECOMMEND_PHRASE, TIMELINE_QUESTION, WORRY_EMPATHY_PREFIX,
};
use crate::domain::policy::repair::RepairContext;
use crate::domain::conversation::Stage;
use crate::domain::triage::patterns::{
    pain_indicated, symptom_label, worry_indicated, DEFAULT_SYMPTOM_LABEL,
};
use crate::domain::triage::TriageLevel;

/// A single policy violation found in a candidate reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    BannedPhrase {
        phrase: &'static str,
        replacement: &'static str,
    },
    MedicalJargon {
        term: &'static str,
    },
    MissingAcknowledgment,
    MissingPainEmpathy,
    MissingWorryEmpathy {
        label: String,
    },
    WorrySymptomMismatch {
        label: String,
    },
    MissingTimelineQuestion,
    MissingConcernQuestion,
    MissingDisclaimer,
    MissingFollowUp,
    WrongRecommendationCount {
        found: usize,
    },
    RecommendationMissingCheckIn,
    MissingEmergencyLeadIn,
    MissingEscalationPhrase,
    MissingRecommendPhrase,
    CheckInCountNotOne {
        found: usize,
    },
    TooManyEmergencyRecommendations {
        found: usize,
    },
    MissingComfortLine,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BannedPhrase {
                phrase,
                replacement,
            } => write!(
                f,
                "Contains banned phrase \"{}\"; use \"{}\" instead",
                phrase, replacement
            ),
            Self::MedicalJargon { term } => {
                write!(f, "Contains medical jargon \"{}\"", term)
            }
            Self::MissingAcknowledgment => write!(
                f,
                "Missing required acknowledgment phrase \"{}\"",
                ACKNOWLEDGMENT
            ),
            Self::MissingPainEmpathy => write!(
                f,
                "Missing required pain empathy phrase \"{}\"",
                PAIN_EMPATHY
            ),
            Self::MissingWorryEmpathy { label } => write!(
                f,
                "Missing required worry empathy phrase \"{}\"",
                worry_empathy(label)
            ),
            Self::WorrySymptomMismatch { label } => write!(
                f,
                "Worry empathy phrase must reference the specific symptom \"{}\"",
                label
            ),
            Self::MissingTimelineQuestion => write!(
                f,
                "Missing exact timeline question \"{}\"",
                TIMELINE_QUESTION
            ),
            Self::MissingConcernQuestion => write!(
                f,
                "Missing exact \"{}\" question",
                CONCERN_QUESTION
            ),
            Self::MissingDisclaimer => {
                write!(f, "Missing in-person examination disclaimer")
            }
            Self::MissingFollowUp => {
                write!(f, "Missing exact follow-up timeframe sentence")
            }
            Self::WrongRecommendationCount { found } => write!(
                f,
                "Mild response must include exactly 3 numbered recommendations, found {}",
                found
            ),
            Self::RecommendationMissingCheckIn => write!(
                f,
                "Each numbered recommendation must end with the check-in phrase \"{}\"",
                CHECK_IN
            ),
            Self::MissingEmergencyLeadIn => write!(
                f,
                "Emergency response must start with \"{}\"",
                EMERGENCY_LEAD_IN
            ),
            Self::MissingEscalationPhrase => write!(
                f,
                "Emergency response missing escalation safety phrase \"{}\"",
                ESCALATION_PHRASE
            ),
            Self::MissingRecommendPhrase => write!(
                f,
                "Emergency response must include \"{}\"",
                RECOMMEND_PHRASE
            ),
            Self::CheckInCountNotOne { found } => write!(
                f,
                "Emergency response must include the check-in phrase exactly once, found {}",
                found
            ),
            Self::TooManyEmergencyRecommendations { found } => write!(
                f,
                "Emergency response must include at most one numbered recommendation, found {}",
                found
            ),
            Self::MissingComfortLine => write!(
                f,
                "Missing closing comfort line \"{}\"",
                COMFORT_LINE
            ),
        }
    }
}

/// Outcome of validating one candidate reply.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Blocking violations, in check order.
    pub errors: Vec<Violation>,
    /// Stylistic misses; never block acceptance.
    pub warnings: Vec<Violation>,
}

impl ValidationResult {
    /// True iff no blocking violation was found.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Rendered error messages, in check order.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|v| v.to_string()).collect()
    }

    /// Rendered warning messages, in check order.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|v| v.to_string()).collect()
    }
}

/// Validates a candidate reply against the policy contract.
pub fn validate_response(candidate: &str, context: &RepairContext) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_banned_phrases(candidate, &mut result);
    check_jargon(candidate, &mut result);

    if context.stage.requires_acknowledgment() && !candidate.contains(ACKNOWLEDGMENT) {
        result.errors.push(Violation::MissingAcknowledgment);
    }

    if context.stage != Stage::Greeting {
        check_empathy(candidate, context, &mut result);
    }

    match context.stage {
        Stage::Greeting => {
            if !candidate.contains(TIMELINE_QUESTION) {
                result.errors.push(Violation::MissingTimelineQuestion);
            }
            if !candidate.contains(DISCLAIMER) {
                result.errors.push(Violation::MissingDisclaimer);
            }
        }
        Stage::Clarify => {}
        Stage::Concern => {
            if !candidate.contains(CONCERN_QUESTION) {
                result.errors.push(Violation::MissingConcernQuestion);
            }
        }
        Stage::Recommendation => {
            check_recommendation(candidate, context, &mut result);
        }
    }

    result
}

fn check_banned_phrases(candidate: &str, result: &mut ValidationResult) {
    for banned in BANNED_PHRASES.iter() {
        if banned.matches(candidate) {
            result.errors.push(Violation::BannedPhrase {
                phrase: banned.phrase,
                replacement: banned.replacement,
            });
        }
    }
}

fn check_jargon(candidate: &str, result: &mut ValidationResult) {
    for jargon in JARGON_TERMS.iter() {
        if jargon.matches(candidate) {
            result.errors.push(Violation::MedicalJargon { term: jargon.term });
        }
    }
}

fn check_empathy(candidate: &str, context: &RepairContext, result: &mut ValidationResult) {
    let Some(latest) = context.latest_user_message.as_deref() else {
        return;
    };

    if pain_indicated(latest) && !candidate.contains(PAIN_EMPATHY) {
        result.errors.push(Violation::MissingPainEmpathy);
    }

    if worry_indicated(latest) {
        let label = symptom_label(context.symptom_context.as_deref().or(Some(latest)));
        let expected = worry_empathy(label);
        if !candidate.contains(&expected) {
            // A mis-labeled sentence is a distinct defect from a missing one:
            // the generator acknowledged worry but about the wrong thing.
            if candidate.contains(WORRY_EMPATHY_PREFIX) && label != DEFAULT_SYMPTOM_LABEL {
                result.errors.push(Violation::WorrySymptomMismatch {
                    label: label.to_string(),
                });
            } else {
                result.errors.push(Violation::MissingWorryEmpathy {
                    label: label.to_string(),
                });
            }
        }
    }
}

fn check_recommendation(
    candidate: &str,
    context: &RepairContext,
    result: &mut ValidationResult,
) {
    if !candidate.contains(DISCLAIMER) {
        result.errors.push(Violation::MissingDisclaimer);
    }
    if !FOLLOW_UP_RE.is_match(candidate) {
        result.errors.push(Violation::MissingFollowUp);
    }

    let numbered: Vec<&str> = candidate
        .lines()
        .filter(|line| NUMBERED_LINE_RE.is_match(line))
        .collect();

    let level = context.triage_level.unwrap_or(TriageLevel::Mild);
    if level == TriageLevel::Mild {
        if numbered.len() != 3 {
            result.errors.push(Violation::WrongRecommendationCount {
                found: numbered.len(),
            });
        }
        if !numbered
            .iter()
            .all(|line| line.trim_end().ends_with(CHECK_IN))
        {
            result.errors.push(Violation::RecommendationMissingCheckIn);
        }
        if !candidate.contains(COMFORT_LINE) {
            result.warnings.push(Violation::MissingComfortLine);
        }
    } else {
        if !candidate.trim_start().starts_with(EMERGENCY_LEAD_IN) {
            result.errors.push(Violation::MissingEmergencyLeadIn);
        }
        if !candidate.contains(ESCALATION_PHRASE) {
            result.errors.push(Violation::MissingEscalationPhrase);
        }
        if !candidate.contains(RECOMMEND_PHRASE) {
            result.errors.push(Violation::MissingRecommendPhrase);
        }
        let check_ins = candidate.matches(CHECK_IN).count();
        if check_ins != 1 {
            result
                .errors
                .push(Violation::CheckInCountNotOne { found: check_ins });
        }
        if numbered.len() > 1 {
            result.errors.push(Violation::TooManyEmergencyRecommendations {
                found: numbered.len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(stage: Stage) -> RepairContext {
        RepairContext::new(stage)
    }

    fn recommendation_ctx(level: TriageLevel) -> RepairContext {
        RepairContext::new(Stage::Recommendation).with_triage_level(level)
    }

    mod universal_checks {
        use super::*;

        #[test]
        fn banned_phrase_is_a_hard_error_naming_the_replacement() {
            let result = validate_response("I see. What concerns you most about this?", &ctx(Stage::Concern));
            assert!(!result.ok());
            let messages = result.error_messages();
            assert!(messages
                .iter()
                .any(|m| m.contains("banned phrase \"I see\"") && m.contains("\"I understand\"")));
        }

        #[test]
        fn jargon_is_a_hard_error() {
            let text = "I understand. Possible dyspnea. What concerns you most about this?";
            let result = validate_response(text, &ctx(Stage::Concern));
            assert!(result
                .errors
                .contains(&Violation::MedicalJargon { term: "dyspnea" }));
        }

        #[test]
        fn acknowledgment_required_after_greeting() {
            let result = validate_response("What concerns you most about this?", &ctx(Stage::Concern));
            assert!(result.errors.contains(&Violation::MissingAcknowledgment));
        }

        #[test]
        fn greeting_does_not_require_acknowledgment() {
            let text = format!(
                "Hello. {}. {}",
                "I can provide guidance, but I cannot replace an in-person examination",
                "When did this first start, and has it been getting better, worse, or staying the same?"
            );
            let result = validate_response(&text, &ctx(Stage::Greeting));
            assert!(result.ok(), "errors: {:?}", result.errors);
        }
    }

    mod empathy_checks {
        use super::*;

        #[test]
        fn pain_mention_requires_pain_empathy() {
            let context = ctx(Stage::Concern)
                .with_latest_user_message("my head hurts a lot");
            let result =
                validate_response("I understand. What concerns you most about this?", &context);
            assert!(result.errors.contains(&Violation::MissingPainEmpathy));
        }

        #[test]
        fn worry_mention_requires_labelled_empathy() {
            let context = ctx(Stage::Concern)
                .with_latest_user_message("I'm worried")
                .with_symptom_context("a pounding headache");
            let text = "I understand. It's completely understandable that you're concerned about your headache. What concerns you most about this?";
            assert!(validate_response(text, &context).ok());
        }

        #[test]
        fn wrong_symptom_label_is_a_mismatch_not_a_miss() {
            let context = ctx(Stage::Concern)
                .with_latest_user_message("I'm worried")
                .with_symptom_context("a pounding headache");
            let text = "I understand. It's completely understandable that you're concerned about your symptoms. What concerns you most about this?";
            let result = validate_response(text, &context);
            assert!(result.errors.contains(&Violation::WorrySymptomMismatch {
                label: "your headache".to_string()
            }));
        }
    }

    mod greeting_stage {
        use super::*;

        #[test]
        fn missing_timeline_question_fails() {
            let result = validate_response("Hello there.", &ctx(Stage::Greeting));
            assert!(result.errors.contains(&Violation::MissingTimelineQuestion));
            assert!(result.errors.contains(&Violation::MissingDisclaimer));
        }
    }

    mod mild_recommendation {
        use super::*;

        #[test]
        fn accepts_mild_response_with_three_numbered_recs() {
            let text = [
                "I understand.",
                "I can provide guidance, but I cannot replace an in-person examination.",
                "1. Rest and drink water. How does this sound to you?",
                "2. Use a cool compress. How does this sound to you?",
                "3. Use pain relief you have used before. How does this sound to you?",
                "If this isn't improving in 3 days, please contact a local clinic or urgent care.",
                "Let's work through this together.",
            ]
            .join("\n");
            let result = validate_response(&text, &recommendation_ctx(TriageLevel::Mild));
            assert!(result.ok(), "errors: {:?}", result.errors);
        }

        #[test]
        fn wrong_count_of_numbered_lines_fails() {
            let text = [
                "I understand.",
                "I can provide guidance, but I cannot replace an in-person examination.",
                "1. Rest. How does this sound to you?",
                "2. Hydrate. How does this sound to you?",
                "If this isn't improving in 3 days, please contact a local clinic or urgent care.",
            ]
            .join("\n");
            let result = validate_response(&text, &recommendation_ctx(TriageLevel::Mild));
            assert!(result
                .errors
                .contains(&Violation::WrongRecommendationCount { found: 2 }));
        }

        #[test]
        fn numbered_line_without_check_in_fails() {
            let text = [
                "I understand.",
                "I can provide guidance, but I cannot replace an in-person examination.",
                "1. Rest and drink water.",
                "2. Use a cool compress. How does this sound to you?",
                "3. Use pain relief. How does this sound to you?",
                "If this isn't improving in 3 days, please contact a local clinic or urgent care.",
            ]
            .join("\n");
            let result = validate_response(&text, &recommendation_ctx(TriageLevel::Mild));
            assert!(result
                .errors
                .contains(&Violation::RecommendationMissingCheckIn));
        }

        #[test]
        fn missing_comfort_line_is_only_a_warning() {
            let text = [
                "I understand.",
                "I can provide guidance, but I cannot replace an in-person examination.",
                "1. Rest. How does this sound to you?",
                "2. Hydrate. How does this sound to you?",
                "3. Keep meals light. How does this sound to you?",
                "If this isn't improving in 3 days, please contact a local clinic or urgent care.",
            ]
            .join("\n");
            let result = validate_response(&text, &recommendation_ctx(TriageLevel::Mild));
            assert!(result.ok());
            assert!(result.warnings.contains(&Violation::MissingComfortLine));
        }
    }

    mod escalation_recommendation {
        use super::*;

        fn valid_emergency_text() -> String {
            [
                "Based on what you've told me, these symptoms could be serious and need urgent evaluation.",
                "I understand.",
                "This is beyond what I can safely assess remotely.",
                "Here's what I recommend: Please call 911 now. How does this sound to you?",
                "If this isn't improving in 3 days, please contact a local clinic or urgent care.",
                "I can provide guidance, but I cannot replace an in-person examination.",
            ]
            .join(" ")
        }

        #[test]
        fn accepts_emergency_response_with_required_format() {
            let result = validate_response(
                &valid_emergency_text(),
                &recommendation_ctx(TriageLevel::Emergency),
            );
            assert!(result.ok(), "errors: {:?}", result.errors);
        }

        #[test]
        fn unclear_uses_the_same_contract() {
            let result = validate_response(
                &valid_emergency_text(),
                &recommendation_ctx(TriageLevel::Unclear),
            );
            assert!(result.ok(), "errors: {:?}", result.errors);
        }

        #[test]
        fn missing_recommend_phrase_is_named() {
            let text = valid_emergency_text().replace("Here's what I recommend: ", "");
            let result =
                validate_response(&text, &recommendation_ctx(TriageLevel::Emergency));
            assert!(result.errors.contains(&Violation::MissingRecommendPhrase));
            assert!(result
                .error_messages()
                .iter()
                .any(|m| m.contains("Here's what I recommend")));
        }

        #[test]
        fn missing_lead_in_fails() {
            let text = valid_emergency_text().replace("Based on what you've told me, ", "");
            let result =
                validate_response(&text, &recommendation_ctx(TriageLevel::Emergency));
            assert!(result.errors.contains(&Violation::MissingEmergencyLeadIn));
        }

        #[test]
        fn duplicate_check_in_fails() {
            let text = format!("{} How does this sound to you?", valid_emergency_text());
            let result =
                validate_response(&text, &recommendation_ctx(TriageLevel::Emergency));
            assert!(result
                .errors
                .contains(&Violation::CheckInCountNotOne { found: 2 }));
        }

        #[test]
        fn multiple_numbered_recommendations_fail() {
            let text = format!(
                "{}\n1. Go now. How does this sound to you?\n2. Call someone.",
                valid_emergency_text().replace(" How does this sound to you?", "")
            );
            let result =
                validate_response(&text, &recommendation_ctx(TriageLevel::Emergency));
            assert!(result
                .errors
                .contains(&Violation::TooManyEmergencyRecommendations { found: 2 }));
        }
    }
}
