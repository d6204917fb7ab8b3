//! Generator port - interface to the free-form text generator.
//!
//! The core only requires that a generator accepts the turn context plus an
//! optional corrective-feedback block and returns free text (or a two-field
//! JSON object in the `assessment_action` format). It may fail at any time
//! and has no memory between calls; the history is resent on every attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Message, Role, Stage};
use crate::domain::triage::TriageLevel;

/// Port for text generation backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates one candidate reply for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;

    /// Backend identification for logging.
    fn generator_info(&self) -> GeneratorInfo;
}

/// A message in generator wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message.
    pub role: ChatRole,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Creates a new chat message.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role() {
            Role::User => ChatRole::User,
            Role::Assistant => ChatRole::Assistant,
        };
        Self::new(role, message.content())
    }
}

/// Role of a message sender in generator wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions that guide generator behavior.
    System,
    /// User input.
    User,
    /// Generator output.
    Assistant,
}

/// Output shape requested from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain assistant text.
    #[default]
    FreeText,
    /// A JSON object `{"assessment": ..., "action": ...}`.
    AssessmentAction,
}

/// One generation request.
///
/// Carries the full turn context so backends can build their own
/// instruction framing; the generator keeps no state between calls.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System prompt guiding overall behavior.
    pub system_prompt: String,
    /// Full conversation history, oldest first.
    pub history: Vec<ChatMessage>,
    /// Stage whose reply contract applies.
    pub stage: Stage,
    /// Triage level, when the stage needs one.
    pub triage_level: Option<TriageLevel>,
    /// Content of the most recent user message.
    pub latest_user_message: Option<String>,
    /// Corrective feedback from the previous failed attempt.
    pub feedback: Option<String>,
    /// Requested output shape.
    pub response_format: ResponseFormat,
}

impl GenerationRequest {
    /// Creates a request for the given stage with empty context.
    pub fn new(stage: Stage) -> Self {
        Self {
            system_prompt: String::new(),
            history: Vec::new(),
            stage,
            triage_level: None,
            latest_user_message: None,
            feedback: None,
            response_format: ResponseFormat::FreeText,
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the conversation history.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    /// Sets the triage level.
    pub fn with_triage_level(mut self, level: TriageLevel) -> Self {
        self.triage_level = Some(level);
        self
    }

    /// Sets the latest user message.
    pub fn with_latest_user_message(mut self, message: impl Into<String>) -> Self {
        self.latest_user_message = Some(message.into());
        self
    }

    /// Sets corrective feedback for a retry attempt.
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    /// Sets the requested output shape.
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Backend identification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorInfo {
    /// Backend name (e.g., "openai", "template").
    pub name: String,
    /// Model identifier, if the backend has one.
    pub model: String,
}

impl GeneratorInfo {
    /// Creates new generator info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Generator errors.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Rate limited by the backend.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Backend is unavailable.
    #[error("generator unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out (including externally-triggered aborts).
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Failed to parse the backend response envelope.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if a later identical request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited { .. }
                | GenerationError::Unavailable { .. }
                | GenerationError::Network(_)
                | GenerationError::Timeout { .. }
        )
    }
}
