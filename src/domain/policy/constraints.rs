//! Policy constraints: the single source of truth for every exact phrase
//! the validator checks and the repair templates emit.
//!
//! Process-wide, immutable, initialized once. Nothing outside this file may
//! restate one of these strings.

use once_cell::sync::Lazy;
use regex::Regex;

/// Acknowledgment phrase required in every stage after the greeting.
pub const ACKNOWLEDGMENT: &str = "I understand";

/// Exact timeline question asked in the greeting.
pub const TIMELINE_QUESTION: &str =
    "When did this first start, and has it been getting better, worse, or staying the same?";

/// Exact question asked in the concern stage.
pub const CONCERN_QUESTION: &str = "What concerns you most about this?";

/// In-person examination disclaimer.
pub const DISCLAIMER: &str =
    "I can provide guidance, but I cannot replace an in-person examination";

/// Check-in question closing each recommendation.
pub const CHECK_IN: &str = "How does this sound to you?";

/// Empathy sentence required when the user mentions pain.
pub const PAIN_EMPATHY: &str = "That sounds really uncomfortable.";

/// Opening of the worry-empathy sentence; completed with a symptom label.
pub const WORRY_EMPATHY_PREFIX: &str =
    "It's completely understandable that you're concerned about ";

/// Builds the full worry-empathy sentence for a symptom label.
pub fn worry_empathy(symptom_label: &str) -> String {
    format!("{}{}.", WORRY_EMPATHY_PREFIX, symptom_label)
}

/// Required lead-in for escalation replies.
pub const EMERGENCY_LEAD_IN: &str = "Based on what you've told me";

/// Escalation safety phrase.
pub const ESCALATION_PHRASE: &str = "This is beyond what I can safely assess remotely";

/// Recommendation hand-off phrase for escalation replies.
pub const RECOMMEND_PHRASE: &str = "Here's what I recommend";

/// Follow-up timeframe sentence emitted by the templates.
pub const FOLLOW_UP_SENTENCE: &str =
    "If this isn't improving in 3 days, please contact a local clinic or urgent care.";

/// Closing comfort line.
pub const COMFORT_LINE: &str = "Let's work through this together.";

/// Immediate-danger notice in the greeting.
pub const IMMEDIATE_DANGER_NOTICE: &str =
    "If you think you are in immediate danger, please call 911 now.";

/// Greeting opening sentence.
pub const GREETING_OPENING: &str = "Hi, I'm an AI health assistant.";

/// Clarify-stage prompt for additional detail.
pub const CLARIFY_DETAIL_PROMPT: &str =
    "Please share any other details that feel important.";

/// The three mild self-care recommendations, before numbering and the
/// check-in suffix are applied.
pub const MILD_SELF_CARE_STEPS: [&str; 3] = [
    "Rest, drink water, and keep meals light as you can.",
    "Use comfort measures like a cool or warm compress, depending on what feels better.",
    "Use a pain relief medicine you have used before, like Tylenol or Advil, if it is safe for you.",
];

/// Assessment clause for unclear-triage escalations.
pub const UNCLEAR_ASSESSMENT: &str =
    "I'm concerned because of your risk factors and I can't safely sort this out remotely";

/// Assessment clause for emergency-triage escalations. Also the default
/// when a structured generator reply yields no usable assessment.
pub const EMERGENCY_ASSESSMENT: &str =
    "these symptoms could be serious and need urgent evaluation";

/// Action sentence in unclear-triage template replies.
pub const UNCLEAR_TEMPLATE_ACTION: &str =
    "Please go to an urgent care or emergency department today.";

/// Action sentence in emergency-triage template replies.
pub const EMERGENCY_TEMPLATE_ACTION: &str =
    "Please call 911 now or go to the nearest emergency department right away.";

/// Deterministic action surfaced to the caller for unclear triage.
pub const UNCLEAR_ACTION: &str = "Go to urgent care or an emergency department today.";

/// Deterministic action surfaced to the caller for emergency triage.
pub const EMERGENCY_ACTION: &str = "Call 911 now or go to the nearest emergency department.";

/// A banned phrase and the wording that must replace it.
pub struct BannedPhrase {
    pub phrase: &'static str,
    pub replacement: &'static str,
    matcher: Regex,
}

impl BannedPhrase {
    fn new(phrase: &'static str, replacement: &'static str) -> Self {
        Self {
            phrase,
            replacement,
            matcher: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase)))
                .expect("invalid banned phrase"),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Phrases that must never appear in a reply, with required replacements.
pub static BANNED_PHRASES: Lazy<Vec<BannedPhrase>> = Lazy::new(|| {
    vec![
        BannedPhrase::new("I see", "I understand"),
        BannedPhrase::new("I hear", "I understand"),
        BannedPhrase::new(
            "don't worry",
            "It's completely understandable that you're concerned",
        ),
    ]
});

/// A clinical term and its matcher.
pub struct JargonTerm {
    pub term: &'static str,
    matcher: Regex,
}

impl JargonTerm {
    fn new(term: &'static str) -> Self {
        Self {
            term,
            matcher: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))
                .expect("invalid jargon term"),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Clinical jargon that must never reach the user.
pub static JARGON_TERMS: Lazy<Vec<JargonTerm>> = Lazy::new(|| {
    [
        "myocardial infarction",
        "cerebrovascular accident",
        "dyspnea",
        "syncope",
        "pyrexia",
        "tachycardia",
        "hypotension",
        "edema",
        "emesis",
        "cephalalgia",
        "idiopathic",
        "etiology",
        "contraindicated",
        "analgesic",
        "febrile",
        "auscultation",
    ]
    .into_iter()
    .map(JargonTerm::new)
    .collect()
});

/// Follow-up timeframe sentence, any integer day count.
pub static FOLLOW_UP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)if this isn't improving in \d+ days?, please contact")
        .expect("invalid follow-up pattern")
});

/// A numbered recommendation line: `<integer>. <text>`.
pub static NUMBERED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\d+\.\s").expect("invalid numbered-line pattern"));
