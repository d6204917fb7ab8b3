//! The triage pattern library.
//!
//! Canonical detection rules held as data so they can be audited and tested
//! independently of the classifier that evaluates them. All matching is
//! case-insensitive over the lowercase-normalized conversation text; bare
//! words carry word boundaries so "head" never matches inside "ahead".

use once_cell::sync::Lazy;
use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).expect("invalid triage pattern")
}

/// A named compound rule: every pattern in `all_of` must match.
pub struct RedFlagRule {
    pub id: &'static str,
    all_of: Vec<Regex>,
}

impl RedFlagRule {
    fn new(id: &'static str, all_of: &[&str]) -> Self {
        Self {
            id,
            all_of: all_of.iter().map(|p| re(p)).collect(),
        }
    }

    /// Returns true if every sub-pattern matches the text.
    pub fn matches(&self, text: &str) -> bool {
        self.all_of.iter().all(|p| p.is_match(text))
    }
}

/// A named single-pattern signal.
pub struct SignalPattern {
    pub id: &'static str,
    pattern: Regex,
}

impl SignalPattern {
    fn new(id: &'static str, pattern: &str) -> Self {
        Self {
            id,
            pattern: re(pattern),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Combinations that are an absolute, non-overridable emergency trigger.
///
/// Checked before anything else on every turn; a match here can never be
/// downgraded by the semantic pass or the rule fallback.
pub static CRITICAL_EMERGENCY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"chest (pain|pressure|tightness).*(shortness of breath|trouble breathing|can't breathe|sweating|faint|passed out)"),
        re(r"(difficulty breathing|trouble breathing|can't breathe).*(blue lips|lips are blue)"),
        re(r"(new confusion|confused suddenly|sudden confusion).*(trouble speaking|slurred speech|one[- ]sided weakness)"),
        re(r"swollen (face|tongue).*(trouble breathing|can't breathe)"),
        re(r"severe bleeding|bleeding heavily|won't stop bleeding"),
        re(r"seizure|convulsions"),
        re(r"(worst headache of (my|your) life|worst headache ever).*(neck stiffness|stiff neck|confused|confusion)"),
    ]
});

/// Named conjunctions strongly associated with emergent risk.
pub static RED_FLAG_RULES: Lazy<Vec<RedFlagRule>> = Lazy::new(|| {
    vec![
        RedFlagRule::new(
            "breathing_distress",
            &[
                r"difficulty breathing|trouble breathing|can't breathe|breathing is hard",
                r"blue lips|lips are blue",
                r"severe wheezing|wheezing a lot|wheezing badly",
            ],
        ),
        RedFlagRule::new(
            "stroke_like",
            &[
                r"new confusion|confused suddenly|sudden confusion",
                r"trouble speaking|slurred speech|can't speak clearly",
                r"one[- ]sided weakness|face drooping|arm weakness",
            ],
        ),
        RedFlagRule::new(
            "severe_allergic_reaction",
            &[
                r"swollen face|face swelling|swelling of face",
                r"swollen tongue|tongue swelling",
                r"trouble breathing|difficulty breathing|can't breathe",
            ],
        ),
        RedFlagRule::new(
            "severe_bleeding_or_seizure",
            &[
                r"severe bleeding|bleeding heavily|won't stop bleeding",
                r"passing out|passed out|fainted",
                r"seizure|convulsions",
            ],
        ),
        RedFlagRule::new(
            "worst_headache_with_neck",
            &[
                r"worst headache of (my|your) life|worst headache ever",
                r"neck stiffness|stiff neck|neck feels stiff|neck is stiff|confused|confusion",
            ],
        ),
    ]
});

/// Patient characteristics that lower the threshold for caution.
pub static HIGH_RISK_PATTERNS: Lazy<Vec<SignalPattern>> = Lazy::new(|| {
    vec![
        SignalPattern::new("pregnant", r"\b(pregnant|pregnancy)\b"),
        SignalPattern::new(
            "infant",
            r"\b(newborn|infant|baby|two month|2 month|three month|3 month)\b",
        ),
        SignalPattern::new(
            "immunocompromised",
            r"\b(immunocompromised|chemo|transplant|hiv)\b",
        ),
    ]
});

/// Single-pattern markers of acute severity.
pub static SEVERE_SIGNAL_PATTERNS: Lazy<Vec<SignalPattern>> = Lazy::new(|| {
    vec![
        SignalPattern::new("severe", r"\bsevere\b"),
        SignalPattern::new(
            "rapid_worsening",
            r"\b(rapidly worsening|getting worse fast|worse quickly)\b",
        ),
        SignalPattern::new("sudden_worse", r"\b(sudden|suddenly worse)\b"),
        SignalPattern::new(
            "can_not_function",
            r"\b(can't function|can't move|can't stay awake)\b",
        ),
        SignalPattern::new(
            "broken_bone",
            r"\b(broke|broken|fracture|fractured|dislocated)\b",
        ),
    ]
});

/// Severe-signal id tracked separately from the rest: a broken bone needs
/// evaluation, not a 911 call.
pub const BROKEN_BONE_SIGNAL: &str = "broken_bone";

/// Sub-patterns for the compound chest-pain rule evaluated explicitly by
/// the classifier: chest symptom AND any distress companion.
pub static CHEST_SYMPTOM: Lazy<Regex> = Lazy::new(|| re(r"chest (pain|pressure|tightness)"));
pub static BREATHING_TROUBLE: Lazy<Regex> =
    Lazy::new(|| re(r"shortness of breath|trouble breathing|difficulty breathing|can't breathe"));
pub static SWEATING: Lazy<Regex> = Lazy::new(|| re(r"sweating|cold sweat|clammy"));
pub static FAINTING: Lazy<Regex> = Lazy::new(|| re(r"faint|passed out|blackout"));

/// Broken-bone wording, used for the semantic-pass clamp as well as the
/// rule fallback.
pub static BROKEN_BONE: Lazy<Regex> =
    Lazy::new(|| re(r"\b(broke|broken|fracture|fractured|dislocat(ed|ion))\b"));

/// Pain wording in a user message that obligates the pain-empathy sentence.
static PAIN_INDICATOR: Lazy<Regex> =
    Lazy::new(|| re(r"\b(pain|ache|hurts|hurting|sore|headache|head pain)\b"));

/// Worry wording that obligates the worry-empathy sentence.
static WORRY_INDICATOR: Lazy<Regex> =
    Lazy::new(|| re(r"\b(worried|concerned|scared|anxious|nervous)\b"));

/// Ordered keyword -> label hints used to personalize empathy and
/// self-care text. First match wins.
struct SymptomHint {
    keyword: Regex,
    label: &'static str,
}

static SYMPTOM_HINTS: Lazy<Vec<SymptomHint>> = Lazy::new(|| {
    let hint = |keyword: &str, label: &'static str| SymptomHint {
        keyword: re(keyword),
        label,
    };
    vec![
        hint(r"\b(headache|head pain)\b", "your headache"),
        hint(r"\b(fatigue|tired|exhausted)\b", "your fatigue"),
        hint(
            r"\b(cough|cold|congestion|runny nose|sore throat)\b",
            "your cold symptoms",
        ),
        hint(
            r"chest (pain|pressure|tightness)",
            "your chest discomfort",
        ),
        hint(
            r"trouble breathing|difficulty breathing|shortness of breath",
            "your breathing trouble",
        ),
        hint(r"\b(dizzy|lightheaded)\b", "your dizziness"),
        hint(r"\b(stomach|nausea|vomit)\b", "your stomach symptoms"),
    ]
});

/// Label used when no symptom hint matches.
pub const DEFAULT_SYMPTOM_LABEL: &str = "your symptoms";

/// A clarify-stage screening category: when the trigger matches the
/// symptom context, its questions are asked.
struct ScreeningCategory {
    trigger: Regex,
    questions: &'static [&'static str],
}

static SCREENING_CATEGORIES: Lazy<Vec<ScreeningCategory>> = Lazy::new(|| {
    let cat = |trigger: &str, questions: &'static [&'static str]| ScreeningCategory {
        trigger: re(trigger),
        questions,
    };
    vec![
        cat(
            r"\b(headache|head pain|migraine)\b",
            &[
                "Is this the worst headache you've ever had?",
                "Do you have any neck stiffness or pain?",
                "Have you noticed any vision changes, confusion, or trouble speaking?",
            ],
        ),
        cat(
            r"chest|breathing|breath|wheezing|cough",
            &[
                "Are you having any chest pain, pressure, or tightness?",
                "Have you noticed any blue lips or difficulty catching your breath?",
                "Are you feeling lightheaded, dizzy, or like you might pass out?",
            ],
        ),
        cat(
            r"stomach|nausea|vomit|vomiting|diarrhea|abdominal|belly",
            &[
                "Are you vomiting blood or seeing blood in your stool?",
                "Is the pain severe or getting worse quickly?",
                "Are you able to keep fluids down?",
            ],
        ),
        cat(
            r"dizzy|dizziness|lightheaded|faint|confusion|weakness|numb",
            &[
                "Have you noticed any one-sided weakness or numbness?",
                "Are you having trouble speaking or seeing clearly?",
                "Have you fainted or lost consciousness?",
            ],
        ),
        cat(
            r"swelling|swollen|rash|hives|allergic|tongue|face",
            &[
                "Is your face, tongue, or throat swelling?",
                "Are you having trouble breathing or swallowing?",
                "Did this start after eating something or taking a medication?",
            ],
        ),
    ]
});

/// Generic pain trigger, used only when no category matched.
static GENERIC_PAIN: Lazy<Regex> = Lazy::new(|| re(r"pain|ache|hurts|hurting|sore"));

const GENERIC_PAIN_QUESTIONS: &[&str] = &[
    "Is the pain severe or getting worse quickly?",
    "Are you able to function normally, or is it interfering with daily activities?",
];

const GENERAL_COVERAGE_QUESTION: &str =
    "Are you having any chest pain, trouble breathing, or feeling like you might pass out?";

const UNIVERSAL_SCREENING_QUESTION: &str =
    "Are you experiencing severe bleeding that won't stop, or do your symptoms seem to be getting much worse very quickly?";

/// Returns true if any critical emergency combination matches.
pub fn matches_critical_emergency(text: &str) -> bool {
    CRITICAL_EMERGENCY_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Evaluates every red-flag conjunction, returning matched rule ids in
/// table order.
pub fn matched_red_flags(text: &str) -> Vec<&'static str> {
    RED_FLAG_RULES
        .iter()
        .filter(|rule| rule.matches(text))
        .map(|rule| rule.id)
        .collect()
}

/// Returns matched high-risk factor ids in table order.
pub fn matched_high_risk(text: &str) -> Vec<&'static str> {
    HIGH_RISK_PATTERNS
        .iter()
        .filter(|signal| signal.matches(text))
        .map(|signal| signal.id)
        .collect()
}

/// Returns matched severe-signal ids in table order.
pub fn matched_severe_signals(text: &str) -> Vec<&'static str> {
    SEVERE_SIGNAL_PATTERNS
        .iter()
        .filter(|signal| signal.matches(text))
        .map(|signal| signal.id)
        .collect()
}

/// Returns true if the text mentions pain.
pub fn pain_indicated(text: &str) -> bool {
    PAIN_INDICATOR.is_match(text)
}

/// Returns true if the text expresses worry.
pub fn worry_indicated(text: &str) -> bool {
    WORRY_INDICATOR.is_match(text)
}

/// Maps free text to a symptom label; first hint wins, generic default
/// otherwise.
pub fn symptom_label(text: Option<&str>) -> &'static str {
    let Some(text) = text else {
        return DEFAULT_SYMPTOM_LABEL;
    };
    SYMPTOM_HINTS
        .iter()
        .find(|hint| hint.keyword.is_match(text))
        .map(|hint| hint.label)
        .unwrap_or(DEFAULT_SYMPTOM_LABEL)
}

/// Selects red-flag screening questions for the clarify stage.
///
/// Categories matching the symptom context each contribute their targeted
/// questions; a generic-pain pair applies when nothing else matched, a
/// general coverage question is added when no question already screens the
/// cardinal signals, and the universal severe-bleeding question always
/// closes the list. Every question ends with exactly one `?`.
pub fn screening_questions(symptom_context: &str) -> Vec<String> {
    let mut questions: Vec<String> = Vec::new();

    for category in SCREENING_CATEGORIES.iter() {
        if category.trigger.is_match(symptom_context) {
            questions.extend(category.questions.iter().map(|q| q.to_string()));
        }
    }

    if questions.is_empty() && GENERIC_PAIN.is_match(symptom_context) {
        questions.extend(GENERIC_PAIN_QUESTIONS.iter().map(|q| q.to_string()));
    }

    let covers_cardinal_signals = questions.iter().any(|q| {
        q.contains("chest pain")
            || q.contains("trouble breathing")
            || q.contains("fainted")
            || q.contains("confusion")
            || q.contains("weakness")
    });
    if !covers_cardinal_signals {
        questions.push(GENERAL_COVERAGE_QUESTION.to_string());
    }

    questions.push(UNIVERSAL_SCREENING_QUESTION.to_string());

    questions
        .into_iter()
        .map(|q| {
            let trimmed = q.trim_end_matches('?').to_string();
            format!("{}?", trimmed)
        })
        .collect()
}
