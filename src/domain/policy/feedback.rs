//! Corrective feedback for the retry loop.
//!
//! Each validator violation maps to a concrete instruction plus the exact
//! verbatim phrase(s) the next attempt must reproduce. Verbatim phrases are
//! deduplicated and the whole block ends with an explicit do-not-paraphrase
//! directive, so a generator cannot "improve" the required wording.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::conversation::Stage;
use crate::domain::policy::constraints::{
    worry_empathy, CHECK_IN, CONCERN_QUESTION, DISCLAIMER, EMERGENCY_LEAD_IN, ESCALATION_PHRASE,
    FOLLOW_UP_SENTENCE, RECOMMEND_PHRASE, TIMELINE_QUESTION,
};
use crate::domain::policy::validator::Violation;
use crate::domain::triage::TriageLevel;

/// Builds the corrective feedback block for the next generation attempt.
pub fn build_feedback(
    errors: &[Violation],
    stage: Stage,
    triage_level: Option<TriageLevel>,
) -> String {
    let mut fixes: Vec<String> = Vec::new();
    let mut verbatim: Vec<String> = Vec::new();

    for error in errors {
        match error {
            Violation::MissingAcknowledgment => {
                fixes.push("Include the exact phrase \"I understand\".".to_string());
                verbatim.push("I understand.".to_string());
            }
            Violation::MissingPainEmpathy => {
                fixes.push(
                    "Include the exact sentence \"That sounds really uncomfortable.\"".to_string(),
                );
                verbatim.push("That sounds really uncomfortable.".to_string());
            }
            Violation::MissingWorryEmpathy { label } => {
                let sentence = worry_empathy(label);
                fixes.push(format!("Include the exact sentence \"{}\"", sentence));
                verbatim.push(sentence);
            }
            Violation::WorrySymptomMismatch { label } => {
                let sentence = worry_empathy(label);
                fixes.push(format!(
                    "Reference the specific symptom in: \"{}\"",
                    sentence
                ));
                verbatim.push(sentence);
            }
            Violation::MissingTimelineQuestion => {
                fixes.push(format!("Ask exactly: \"{}\"", TIMELINE_QUESTION));
                verbatim.push(TIMELINE_QUESTION.to_string());
            }
            Violation::MissingConcernQuestion => {
                fixes.push(format!("Ask exactly: \"{}\"", CONCERN_QUESTION));
                verbatim.push(CONCERN_QUESTION.to_string());
            }
            Violation::MissingDisclaimer => {
                fixes.push(format!("Include: \"{}\"", DISCLAIMER));
                verbatim.push(DISCLAIMER.to_string());
            }
            Violation::MissingFollowUp => {
                fixes.push(format!("Include: \"{}\"", FOLLOW_UP_SENTENCE));
                verbatim.push(FOLLOW_UP_SENTENCE.to_string());
            }
            Violation::WrongRecommendationCount { .. } => {
                fixes.push("Provide exactly 3 numbered recommendations (1-3).".to_string());
            }
            Violation::RecommendationMissingCheckIn => {
                fixes.push(format!(
                    "End each numbered recommendation with \"{}\"",
                    CHECK_IN
                ));
                verbatim.push(CHECK_IN.to_string());
            }
            Violation::MissingEmergencyLeadIn => {
                fixes.push(format!("Start with: \"{}...\"", EMERGENCY_LEAD_IN));
                verbatim.push(EMERGENCY_LEAD_IN.to_string());
            }
            Violation::MissingEscalationPhrase => {
                fixes.push(format!("Include: \"{}\".", ESCALATION_PHRASE));
                verbatim.push(ESCALATION_PHRASE.to_string());
            }
            Violation::MissingRecommendPhrase => {
                fixes.push(format!("Include: \"{}...\"", RECOMMEND_PHRASE));
                verbatim.push(RECOMMEND_PHRASE.to_string());
            }
            Violation::CheckInCountNotOne { .. } => {
                fixes.push(format!("Include \"{}\" exactly once.", CHECK_IN));
                verbatim.push(CHECK_IN.to_string());
            }
            Violation::TooManyEmergencyRecommendations { .. } => {
                fixes.push("Provide at most one numbered recommendation.".to_string());
            }
            Violation::BannedPhrase {
                phrase,
                replacement,
            } => {
                fixes.push(format!(
                    "Remove the banned phrase \"{}\"; say \"{}\" instead.",
                    phrase, replacement
                ));
            }
            Violation::MedicalJargon { term } => {
                fixes.push(format!(
                    "Remove the medical jargon \"{}\"; use simple everyday words.",
                    term
                ));
            }
            Violation::MissingComfortLine => {
                // Warning-class; never fed back as a hard fix.
            }
        }
    }

    match triage_level {
        Some(TriageLevel::Mild) => {
            fixes.push(
                "Keep the response in the mild format with exactly 3 self-care items.".to_string(),
            );
        }
        Some(_) => {
            fixes.push(format!(
                "Keep the emergency format: {}... {}... {}...",
                EMERGENCY_LEAD_IN, ESCALATION_PHRASE, RECOMMEND_PHRASE
            ));
        }
        None => {}
    }
    if matches!(stage, Stage::Clarify | Stage::Concern) {
        fixes.push("Do not provide recommendations at this stage.".to_string());
    }
    if stage != Stage::Greeting {
        verbatim.push("I understand.".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    let verbatim_unique: Vec<String> = verbatim
        .into_iter()
        .filter(|phrase| seen.insert(phrase.clone()))
        .collect();

    let mut parts = vec![fixes.join(" ")];
    if !verbatim_unique.is_empty() {
        parts.push(format!(
            "You MUST include these exact phrases verbatim: {}",
            verbatim_unique.join(" | ")
        ));
    }
    parts.push("Do not paraphrase the verbatim phrases.".to_string());
    parts.retain(|p| !p.is_empty());
    parts.join(" ")
}

/// Feedback for the structured assessment sub-flow.
pub fn build_assessment_feedback(errors: &[Violation]) -> String {
    let mut fixes: Vec<String> = Vec::new();
    for error in errors {
        match error {
            Violation::MedicalJargon { .. } => {
                fixes.push("Remove all medical jargon; use simple everyday words.".to_string());
            }
            Violation::BannedPhrase {
                phrase,
                replacement,
            } => {
                fixes.push(format!(
                    "Do not use \"{}\"; say \"{}\" instead.",
                    phrase, replacement
                ));
            }
            _ => {}
        }
    }
    fixes.push("Keep assessment under 20 words.".to_string());
    fixes.join(" ")
}

static SURROUNDING_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^"+|"+$"#).expect("invalid quote pattern"));
static CHECK_IN_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)How does this sound to you\??").expect("invalid pattern"));
static ACKNOWLEDGMENT_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)I understand\.?").expect("invalid pattern"));
static LEAD_IN_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Based on what you've told me,?").expect("invalid pattern"));
static ESCALATION_FRAGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)This is beyond what I can safely assess remotely\.?")
        .expect("invalid pattern")
});
static RECOMMEND_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Here's what I recommend:?.*").expect("invalid pattern"));
static RECOMMEND_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Here's what I recommend:\s*").expect("invalid pattern"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid pattern"));

fn collapse(text: &str) -> String {
    WHITESPACE_RUN
        .replace_all(text, " ")
        .trim()
        .trim_end_matches('.')
        .trim()
        .to_string()
}

/// Strips quoting and template boilerplate from a generated assessment,
/// leaving only the bare clause that slots into the escalation frame.
pub fn sanitize_assessment(text: &str) -> String {
    let mut cleaned = SURROUNDING_QUOTES.replace_all(text.trim(), "").to_string();
    cleaned = CHECK_IN_FRAGMENT.replace_all(&cleaned, "").to_string();
    cleaned = ACKNOWLEDGMENT_FRAGMENT.replace_all(&cleaned, "").to_string();
    cleaned = LEAD_IN_FRAGMENT.replace(cleaned.trim(), "").to_string();
    cleaned = ESCALATION_FRAGMENT.replace_all(&cleaned, "").to_string();
    cleaned = RECOMMEND_TAIL.replace(&cleaned, "").to_string();
    collapse(&cleaned)
}

/// Strips quoting and boilerplate from a generated action sentence.
pub fn sanitize_action(text: &str) -> String {
    let mut cleaned = SURROUNDING_QUOTES.replace_all(text.trim(), "").to_string();
    cleaned = RECOMMEND_HEAD.replace(cleaned.trim(), "").to_string();
    cleaned = CHECK_IN_FRAGMENT.replace_all(&cleaned, "").to_string();
    collapse(&cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod feedback_building {
        use super::*;

        #[test]
        fn missing_recommend_phrase_carries_the_verbatim_string() {
            let feedback = build_feedback(
                &[Violation::MissingRecommendPhrase],
                Stage::Recommendation,
                Some(TriageLevel::Emergency),
            );
            assert!(feedback.contains("Here's what I recommend"));
            assert!(feedback.contains("Do not paraphrase the verbatim phrases."));
        }

        #[test]
        fn verbatim_phrases_are_deduplicated() {
            let feedback = build_feedback(
                &[
                    Violation::RecommendationMissingCheckIn,
                    Violation::CheckInCountNotOne { found: 0 },
                ],
                Stage::Recommendation,
                Some(TriageLevel::Mild),
            );
            // Twice in the fix instructions is expected; the verbatim list
            // must carry it exactly once.
            let verbatim_section = feedback
                .split("You MUST include these exact phrases verbatim:")
                .nth(1)
                .unwrap();
            assert_eq!(
                verbatim_section
                    .matches("How does this sound to you?")
                    .count(),
                1
            );
        }

        #[test]
        fn non_greeting_stages_always_require_the_acknowledgment_verbatim() {
            let feedback = build_feedback(&[], Stage::Concern, None);
            assert!(feedback.contains("I understand."));
            assert!(feedback.contains("Do not provide recommendations at this stage."));
        }

        #[test]
        fn mild_and_emergency_get_format_reminders() {
            let mild = build_feedback(&[], Stage::Recommendation, Some(TriageLevel::Mild));
            assert!(mild.contains("exactly 3 self-care items"));

            let emergency =
                build_feedback(&[], Stage::Recommendation, Some(TriageLevel::Emergency));
            assert!(emergency.contains("Keep the emergency format"));
        }

        #[test]
        fn worry_feedback_names_the_detected_symptom() {
            let feedback = build_feedback(
                &[Violation::MissingWorryEmpathy {
                    label: "your headache".to_string(),
                }],
                Stage::Clarify,
                None,
            );
            assert!(feedback.contains("concerned about your headache."));
        }
    }

    mod assessment_feedback {
        use super::*;

        #[test]
        fn always_bounds_assessment_length() {
            let feedback = build_assessment_feedback(&[]);
            assert!(feedback.contains("Keep assessment under 20 words."));
        }

        #[test]
        fn names_banned_phrase_replacements() {
            let feedback = build_assessment_feedback(&[Violation::BannedPhrase {
                phrase: "I see",
                replacement: "I understand",
            }]);
            assert!(feedback.contains("\"I see\""));
        }
    }

    mod sanitizers {
        use super::*;

        #[test]
        fn assessment_sheds_quotes_and_boilerplate() {
            let raw = "\"Based on what you've told me, this looks like strained muscles. How does this sound to you?\"";
            assert_eq!(sanitize_assessment(raw), "this looks like strained muscles");
        }

        #[test]
        fn assessment_drops_recommendation_tail() {
            let raw = "chest strain likely. Here's what I recommend: rest today.";
            assert_eq!(sanitize_assessment(raw), "chest strain likely");
        }

        #[test]
        fn action_sheds_recommend_head_and_check_in() {
            let raw = "Here's what I recommend: call 911 now. How does this sound to you?";
            assert_eq!(sanitize_action(raw), "call 911 now");
        }

        #[test]
        fn action_keeps_plain_text_unchanged() {
            assert_eq!(sanitize_action("go to urgent care today"), "go to urgent care today");
        }
    }
}
