//! Instruction framing for generation backends.
//!
//! Builds the per-request developer prompt: stage directive, the MUST-output
//! template lines for formatted stages, and any corrective feedback from a
//! failed attempt. The generator has no memory, so the full framing is
//! rebuilt and resent on every call.

use crate::domain::conversation::Stage;
use crate::domain::triage::TriageLevel;
use crate::ports::{GenerationRequest, ResponseFormat};

/// Builds the developer prompt for a generation request.
pub fn developer_prompt(request: &GenerationRequest) -> String {
    if request.response_format == ResponseFormat::AssessmentAction {
        return assessment_action_prompt(request.feedback.as_deref());
    }

    let mut lines = vec![
        format!("Stage: {}.", request.stage),
        format!(
            "Triage: {}.",
            request
                .triage_level
                .map(|l| l.label())
                .unwrap_or("unknown")
        ),
        stage_guidance(request.stage).to_string(),
        "Follow all system constraints exactly. Respond with only the assistant message."
            .to_string(),
        "If feedback is provided, you MUST follow it verbatim.".to_string(),
    ];

    match request.stage {
        Stage::Greeting => {
            lines.push(
                [
                    "You MUST output exactly these lines in this order:",
                    "Hi, I'm an AI health assistant.",
                    "I can provide guidance, but I cannot replace an in-person examination.",
                    "If you think you are in immediate danger, please call 911 now.",
                    "When did this first start, and has it been getting better, worse, or staying the same?",
                    "Do NOT add any extra sentences.",
                ]
                .join(" "),
            );
        }
        Stage::Concern => {
            lines.push(
                [
                    "You MUST output exactly these lines in this order and only fill in bracketed parts:",
                    "I understand.",
                    "[Optional empathy sentences if needed.]",
                    "What concerns you most about this?",
                    "Do NOT add any extra sentences.",
                ]
                .join(" "),
            );
        }
        Stage::Recommendation => {
            lines.push(recommendation_template(request.triage_level));
            lines.push("Do NOT use markdown, bullets, or bold formatting.".to_string());
            lines.push("Do NOT add any extra sentences beyond the template lines.".to_string());
        }
        Stage::Clarify => {}
    }

    if let Some(feedback) = &request.feedback {
        lines.push(format!("Validation errors to fix: {}", feedback));
    }

    lines.join(" ")
}

fn stage_guidance(stage: Stage) -> &'static str {
    match stage {
        Stage::Greeting => {
            "Provide greeting, consent, and safety disclaimer. Ask the timeline question exactly."
        }
        Stage::Clarify => {
            "Acknowledge, show empathy, and ask clarifying questions plus red-flag screening. \
             Do not provide recommendations."
        }
        Stage::Concern => {
            "Ask exactly: \"What concerns you most about this?\" Do not provide recommendations."
        }
        Stage::Recommendation => {
            "Provide recommendations using the required format for mild or emergency."
        }
    }
}

fn recommendation_template(triage_level: Option<TriageLevel>) -> String {
    if triage_level == Some(TriageLevel::Mild) {
        [
            "You MUST output exactly these lines in this order and only fill in bracketed parts:",
            "I understand.",
            "[Optional empathy sentences if needed.]",
            "Based on what you shared about [specific symptom], here are some self-care steps:",
            "1. [Self-care recommendation sentence]. How does this sound to you?",
            "2. [Self-care recommendation sentence]. How does this sound to you?",
            "3. [Self-care recommendation sentence]. How does this sound to you?",
            "If this isn't improving in 3 days, please contact a local clinic or urgent care.",
            "I can provide guidance, but I cannot replace an in-person examination.",
            "Let's work through this together.",
        ]
        .join(" ")
    } else {
        [
            "You MUST output exactly these lines in this order and only fill in bracketed parts:",
            "Based on what you've told me, [assessment].",
            "I understand.",
            "[Optional empathy sentences if needed.]",
            "This is beyond what I can safely assess remotely.",
            "Here's what I recommend: [specific emergency action]. How does this sound to you?",
            "If this isn't improving in 3 days, please contact a local clinic or urgent care.",
            "I can provide guidance, but I cannot replace an in-person examination.",
        ]
        .join(" ")
    }
}

fn assessment_action_prompt(feedback: Option<&str>) -> String {
    let mut lines = vec![
        "Return ONLY valid JSON with keys assessment and action.".to_string(),
        "assessment: a short lay-language assessment sentence fragment, no period, no medical \
         jargon."
            .to_string(),
        "action: a specific next step in plain language (e.g., \"call 911 now\").".to_string(),
        "Do not include any extra text.".to_string(),
    ];
    if let Some(feedback) = feedback {
        lines.push(format!("Feedback to fix: {}", feedback));
    }
    lines.join(" ")
}
