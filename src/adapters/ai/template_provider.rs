//! Template generator - the offline backend.
//!
//! Serves every request straight from the deterministic repair templates,
//! so the service runs end-to-end with no API key and no network. Also the
//! default mode for local development.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::policy::constraints::{
    EMERGENCY_ACTION, EMERGENCY_ASSESSMENT, UNCLEAR_ACTION, UNCLEAR_ASSESSMENT,
};
use crate::domain::policy::{repair_response, RepairContext};
use crate::domain::triage::TriageLevel;
use crate::ports::{
    GenerationError, GenerationRequest, Generator, GeneratorInfo, ResponseFormat,
};

/// Generator backed by the repair templates. Total: never errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    /// Creates a new template generator.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Generator for TemplateGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        if request.response_format == ResponseFormat::AssessmentAction {
            let (assessment, action) = match request.triage_level {
                Some(TriageLevel::Unclear) => (UNCLEAR_ASSESSMENT, UNCLEAR_ACTION),
                _ => (EMERGENCY_ASSESSMENT, EMERGENCY_ACTION),
            };
            return Ok(json!({ "assessment": assessment, "action": action }).to_string());
        }

        let mut context = RepairContext::new(request.stage);
        if let Some(level) = request.triage_level {
            context = context.with_triage_level(level);
        }
        if let Some(latest) = &request.latest_user_message {
            context = context.with_latest_user_message(latest.clone());
        }
        Ok(repair_response(&context))
    }

    fn generator_info(&self) -> GeneratorInfo {
        GeneratorInfo::new("template", "deterministic")
    }
}
