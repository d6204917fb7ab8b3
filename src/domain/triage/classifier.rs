//! The triage classifier pipeline.
//!
//! Order is load-bearing: the critical-pattern safety net runs first and
//! short-circuits everything else, so a life-threatening combination is
//! caught even if the semantic analyzer and the rule tables were both
//! wrong. The semantic pass is best-effort; the rule fallback always
//! produces a decision. The classifier never fails a turn.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::triage::decision::{TriageDecision, TriageLevel};
use crate::domain::triage::patterns::{
    matched_high_risk, matched_red_flags, matched_severe_signals, matches_critical_emergency,
    BREATHING_TROUBLE, BROKEN_BONE, BROKEN_BONE_SIGNAL, CHEST_SYMPTOM, FAINTING, SWEATING,
};
use crate::ports::{AnalyzerVerdict, TriageAnalyzer};

/// Red flag id for the explicit chest-pain-with-distress conjunction.
const CHEST_PAIN_RED_FLAG: &str = "chest_pain_with_red_flags";

/// Classifies accumulated user text into a triage decision.
pub struct TriageClassifier {
    analyzer: Option<Arc<dyn TriageAnalyzer>>,
}

impl TriageClassifier {
    /// A classifier using only the deterministic rule tables.
    pub fn rule_based() -> Self {
        Self { analyzer: None }
    }

    /// A classifier that defers to a semantic analyzer when it succeeds.
    pub fn with_analyzer(analyzer: Arc<dyn TriageAnalyzer>) -> Self {
        Self {
            analyzer: Some(analyzer),
        }
    }

    /// Produces a triage decision for the conversation.
    ///
    /// Total: absorbs every analyzer failure and always returns a decision.
    pub async fn classify(&self, user_messages: &[String]) -> TriageDecision {
        let text = normalize(user_messages);

        // Safety net first; nothing can override it.
        if matches_critical_emergency(&text) {
            return TriageDecision::critical_emergency();
        }

        if let Some(analyzer) = &self.analyzer {
            match analyzer.analyze(&text).await {
                Ok(verdict) => return clamp_verdict(verdict, &text),
                Err(err) => {
                    warn!(error = %err, "semantic triage failed, using rule fallback");
                }
            }
        } else {
            debug!("no semantic analyzer configured, using rule tables");
        }

        rule_based_triage(&text)
    }

    /// The deterministic rule path, exposed for direct testing.
    pub fn classify_rules(user_messages: &[String]) -> TriageDecision {
        let text = normalize(user_messages);
        if matches_critical_emergency(&text) {
            return TriageDecision::critical_emergency();
        }
        rule_based_triage(&text)
    }
}

fn normalize(user_messages: &[String]) -> String {
    user_messages.join(" ").to_lowercase()
}

/// Post-processes a semantic verdict: a broken-bone presentation needs
/// evaluation, not a 911 call, so an emergency verdict is downgraded to
/// unclear when one is present. The safety net already ran, so this can
/// never suppress a critical-pattern emergency.
fn clamp_verdict(verdict: AnalyzerVerdict, conversation_text: &str) -> TriageDecision {
    let broken_bone_reported = verdict
        .severe_signals
        .iter()
        .any(|signal| BROKEN_BONE.is_match(signal))
        || BROKEN_BONE.is_match(conversation_text);

    let level = if broken_bone_reported && verdict.level == TriageLevel::Emergency {
        TriageLevel::Unclear
    } else {
        verdict.level
    };

    TriageDecision {
        level,
        red_flags: verdict.red_flags,
        high_risk: verdict.high_risk,
        severe_signals: verdict.severe_signals,
        reasoning: verdict
            .reasoning
            .or_else(|| Some("Semantic triage analysis".to_string())),
    }
}

/// The deterministic rule fallback.
fn rule_based_triage(text: &str) -> TriageDecision {
    let mut red_flags: Vec<String> = Vec::new();

    let has_chest = CHEST_SYMPTOM.is_match(text);
    let has_distress =
        BREATHING_TROUBLE.is_match(text) || SWEATING.is_match(text) || FAINTING.is_match(text);
    if has_chest && has_distress {
        red_flags.push(CHEST_PAIN_RED_FLAG.to_string());
    }

    red_flags.extend(matched_red_flags(text).into_iter().map(String::from));
    let high_risk: Vec<String> = matched_high_risk(text).into_iter().map(String::from).collect();
    let severe_signals: Vec<String> = matched_severe_signals(text)
        .into_iter()
        .map(String::from)
        .collect();

    // Broken bones need medical attention but are not life-threatening.
    let has_broken_bone = severe_signals.iter().any(|s| s == BROKEN_BONE_SIGNAL);
    let other_severe = severe_signals.iter().any(|s| s != BROKEN_BONE_SIGNAL);

    let level = if !red_flags.is_empty() || other_severe {
        TriageLevel::Emergency
    } else if has_broken_bone || !high_risk.is_empty() {
        TriageLevel::Unclear
    } else {
        TriageLevel::Mild
    };

    TriageDecision {
        level,
        red_flags,
        high_risk,
        severe_signals,
        reasoning: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::AnalysisError;
    use async_trait::async_trait;

    /// Analyzer stub returning a fixed verdict or error.
    struct FixedAnalyzer(Result<AnalyzerVerdict, &'static str>);

    #[async_trait]
    impl TriageAnalyzer for FixedAnalyzer {
        async fn analyze(&self, _text: &str) -> Result<AnalyzerVerdict, AnalysisError> {
            match &self.0 {
                Ok(verdict) => Ok(verdict.clone()),
                Err(message) => Err(AnalysisError::unavailable(*message)),
            }
        }
    }

    fn messages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    mod safety_net {
        use super::*;

        #[tokio::test]
        async fn critical_pattern_wins_even_when_analyzer_says_mild() {
            let analyzer = Arc::new(FixedAnalyzer(Ok(AnalyzerVerdict::with_level(
                TriageLevel::Mild,
            ))));
            let classifier = TriageClassifier::with_analyzer(analyzer);

            let decision = classifier
                .classify(&messages(&[
                    "I have chest pain and I'm having trouble breathing.",
                ]))
                .await;

            assert_eq!(decision.level, TriageLevel::Emergency);
            assert!(decision.is_critical());
        }

        #[test]
        fn chest_pain_with_breathing_trouble_is_emergency() {
            let decision = TriageClassifier::classify_rules(&messages(&[
                "I have chest pain and I'm having trouble breathing.",
            ]));
            assert_eq!(decision.level, TriageLevel::Emergency);
            assert!(!decision.red_flags.is_empty());
        }
    }

    mod semantic_pass {
        use super::*;

        #[tokio::test]
        async fn analyzer_verdict_is_used_when_it_succeeds() {
            let verdict = AnalyzerVerdict {
                level: TriageLevel::Unclear,
                red_flags: vec![],
                high_risk: vec!["pregnant".to_string()],
                severe_signals: vec![],
                reasoning: Some("pregnancy with symptoms".to_string()),
            };
            let classifier = TriageClassifier::with_analyzer(Arc::new(FixedAnalyzer(Ok(verdict))));

            let decision = classifier
                .classify(&messages(&["I am pregnant and feeling off."]))
                .await;

            assert_eq!(decision.level, TriageLevel::Unclear);
            assert_eq!(decision.high_risk, vec!["pregnant"]);
            assert_eq!(decision.reasoning.as_deref(), Some("pregnancy with symptoms"));
        }

        #[tokio::test]
        async fn analyzer_failure_falls_back_to_rules() {
            let classifier =
                TriageClassifier::with_analyzer(Arc::new(FixedAnalyzer(Err("service down"))));

            let decision = classifier
                .classify(&messages(&["I am pregnant and feeling lightheaded."]))
                .await;

            assert_eq!(decision.level, TriageLevel::Unclear);
            assert_eq!(decision.high_risk, vec!["pregnant"]);
        }

        #[tokio::test]
        async fn broken_bone_clamps_analyzer_emergency_to_unclear() {
            let analyzer = Arc::new(FixedAnalyzer(Ok(AnalyzerVerdict::with_level(
                TriageLevel::Emergency,
            ))));
            let classifier = TriageClassifier::with_analyzer(analyzer);

            let decision = classifier
                .classify(&messages(&["I think I fractured my ankle skating."]))
                .await;

            assert_eq!(decision.level, TriageLevel::Unclear);
        }

        #[tokio::test]
        async fn clamp_leaves_non_emergency_verdicts_alone() {
            let analyzer = Arc::new(FixedAnalyzer(Ok(AnalyzerVerdict::with_level(
                TriageLevel::Mild,
            ))));
            let classifier = TriageClassifier::with_analyzer(analyzer);

            let decision = classifier
                .classify(&messages(&["I bruised my arm, nothing broken"]))
                .await;

            assert_eq!(decision.level, TriageLevel::Mild);
        }
    }

    mod rule_fallback {
        use super::*;

        #[test]
        fn mild_fatigue_is_mild() {
            let decision = TriageClassifier::classify_rules(&messages(&[
                "I've been tired and a bit fatigued for two days.",
            ]));
            assert_eq!(decision.level, TriageLevel::Mild);
            assert!(decision.red_flags.is_empty());
        }

        #[test]
        fn pregnancy_without_severe_signals_is_unclear() {
            let decision = TriageClassifier::classify_rules(&messages(&[
                "I am pregnant and feeling lightheaded.",
            ]));
            assert_eq!(decision.level, TriageLevel::Unclear);
            assert_eq!(decision.high_risk, vec!["pregnant"]);
            assert!(decision.red_flags.is_empty());
        }

        #[test]
        fn broken_bone_alone_is_unclear_not_emergency() {
            let decision = TriageClassifier::classify_rules(&messages(&[
                "I fell and I think my wrist is broken.",
            ]));
            assert_eq!(decision.level, TriageLevel::Unclear);
            assert_eq!(decision.severe_signals, vec!["broken_bone"]);
        }

        #[test]
        fn severe_signal_beyond_broken_bone_is_emergency() {
            let decision = TriageClassifier::classify_rules(&messages(&[
                "The stomach pain is severe and I broke out in a cold sweat.",
            ]));
            assert_eq!(decision.level, TriageLevel::Emergency);
        }

        #[test]
        fn worst_headache_with_stiff_neck_is_emergency() {
            let decision = TriageClassifier::classify_rules(&messages(&[
                "This is the worst headache of my life and my neck feels stiff.",
            ]));
            assert_eq!(decision.level, TriageLevel::Emergency);
        }

        #[test]
        fn classification_is_idempotent() {
            let input = messages(&["I am pregnant and my head hurts"]);
            let first = TriageClassifier::classify_rules(&input);
            let second = TriageClassifier::classify_rules(&input);
            assert_eq!(first, second);
        }

        #[test]
        fn multiple_messages_are_accumulated() {
            // The conjunction spans two turns; "clammy" is a distress
            // companion only the rule table knows, so the safety net stays
            // quiet and the compound chest rule does the work.
            let decision = TriageClassifier::classify_rules(&messages(&[
                "My chest feels tight, chest pressure really",
                "and now I feel clammy and shaky",
            ]));
            assert_eq!(decision.level, TriageLevel::Emergency);
            assert!(decision
                .red_flags
                .contains(&"chest_pain_with_red_flags".to_string()));
        }
    }
}
