//! HTTP DTOs for the chat endpoint.
//!
//! These types decouple the wire format from domain types; the caller owns
//! the conversation history and resends it in full each turn.

use serde::{Deserialize, Serialize};

use crate::application::{TurnResponse, TurnValidation};
use crate::domain::conversation::Stage;
use crate::domain::triage::{TriageDecision, TriageLevel};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// One message in wire form.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageDto {
    pub role: MessageRoleDto,
    pub content: String,
}

/// Wire message roles.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRoleDto {
    User,
    Assistant,
}

/// Request for one conversation turn.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Conversation history, oldest first.
    #[serde(default)]
    pub messages: Vec<MessageDto>,
    /// Stage the caller is currently on.
    #[serde(default)]
    pub stage: Stage,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Triage telemetry for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TriageDto {
    pub level: TriageLevel,
    pub red_flags: Vec<String>,
    pub high_risk: Vec<String>,
    pub severe_signals: Vec<String>,
}

impl From<TriageDecision> for TriageDto {
    fn from(decision: TriageDecision) -> Self {
        Self {
            level: decision.level,
            red_flags: decision.red_flags,
            high_risk: decision.high_risk,
            severe_signals: decision.severe_signals,
        }
    }
}

/// Validation telemetry for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDto {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub repaired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_error: Option<String>,
}

impl From<TurnValidation> for ValidationDto {
    fn from(validation: TurnValidation) -> Self {
        Self {
            ok: validation.ok,
            errors: validation.errors,
            warnings: validation.warnings,
            repaired: validation.repaired,
            generator_error: validation.generator_error,
        }
    }
}

/// Response for one conversation turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub next_stage: Stage,
    pub triage: TriageDto,
    pub validation: ValidationDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_action: Option<String>,
}

impl From<TurnResponse> for ChatResponse {
    fn from(response: TurnResponse) -> Self {
        Self {
            message: response.message,
            next_stage: response.next_stage,
            triage: response.triage.into(),
            validation: response.validation.into(),
            emergency_action: response.emergency_action,
        }
    }
}

/// Structured error body; never a chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error body with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
