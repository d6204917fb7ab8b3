//! Property tests for the policy core: classifier totality and idempotence,
//! and the repair-generator-is-a-fixed-point-of-the-validator guarantee.

use proptest::prelude::*;

use care_compass::domain::conversation::Stage;
use care_compass::domain::policy::{repair_response, validate_response, RepairContext};
use care_compass::domain::triage::{TriageClassifier, TriageLevel};

const STAGES: [Stage; 4] = [
    Stage::Greeting,
    Stage::Clarify,
    Stage::Concern,
    Stage::Recommendation,
];
const LEVELS: [TriageLevel; 3] = [
    TriageLevel::Mild,
    TriageLevel::Emergency,
    TriageLevel::Unclear,
];

proptest! {
    /// The rule-based classifier is total: any input produces a decision.
    #[test]
    fn classifier_never_panics(messages in proptest::collection::vec(".*", 0..5)) {
        let _ = TriageClassifier::classify_rules(&messages);
    }

    /// The rule path has no hidden randomness.
    #[test]
    fn classifier_is_idempotent(messages in proptest::collection::vec(".{0,120}", 0..5)) {
        let first = TriageClassifier::classify_rules(&messages);
        let second = TriageClassifier::classify_rules(&messages);
        prop_assert_eq!(first, second);
    }

    /// Repair output passes validation for every stage/level pair, for
    /// arbitrary user text feeding the empathy and symptom machinery.
    #[test]
    fn repair_is_fixed_point_for_arbitrary_context(
        latest in ".{0,120}",
        symptoms in ".{0,200}",
        stage_index in 0usize..4,
        level_index in 0usize..3,
    ) {
        let context = RepairContext::new(STAGES[stage_index])
            .with_triage_level(LEVELS[level_index])
            .with_latest_user_message(latest)
            .with_symptom_context(symptoms);

        let reply = repair_response(&context);
        let result = validate_response(&reply, &context);
        prop_assert!(result.ok(), "violations: {:?}", result.errors);
    }
}
