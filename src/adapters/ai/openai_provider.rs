//! OpenAI adapters - Generator and TriageAnalyzer against the
//! chat-completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com");
//!
//! let generator = OpenAiGenerator::new(config.clone());
//! let analyzer = OpenAiTriageAnalyzer::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::adapters::ai::prompts::developer_prompt;
use crate::ports::{
    AnalysisError, AnalyzerVerdict, ChatRole, GenerationError, GenerationRequest, Generator,
    GeneratorInfo, ResponseFormat, TriageAnalyzer,
};
use crate::domain::triage::TriageLevel;

/// Configuration shared by the OpenAI generator and analyzer.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use (e.g., "gpt-4o-mini").
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<WireResponseFormat>,
}

#[derive(Debug, Serialize)]
struct WireResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

/// OpenAI generator implementation.
pub struct OpenAiGenerator {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiGenerator {
    /// Creates a new generator with the given configuration.
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout {
                timeout_secs: self.config.timeout.as_secs() as u32,
            }
        } else if err.is_connect() {
            GenerationError::network(format!("Connection failed: {}", err))
        } else {
            GenerationError::network(err.to_string())
        }
    }

    fn map_status_error(status: StatusCode, body: &str) -> GenerationError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                GenerationError::AuthenticationFailed
            }
            StatusCode::TOO_MANY_REQUESTS => GenerationError::rate_limited(30),
            _ => GenerationError::unavailable(format!("{}: {}", status, body)),
        }
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let instructions = developer_prompt(&request);

        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if !request.system_prompt.is_empty() {
            messages.push(WireMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        messages.push(WireMessage {
            role: "system",
            content: &instructions,
        });
        for message in &request.history {
            messages.push(WireMessage {
                role: wire_role(message.role),
                content: &message.content,
            });
        }

        let body = CompletionBody {
            model: &self.config.model,
            messages,
            temperature: 0.2,
            response_format: (request.response_format == ResponseFormat::AssessmentAction)
                .then_some(WireResponseFormat {
                    kind: "json_object",
                }),
        };

        let response = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, &body));
        }

        let envelope: CompletionEnvelope = response
            .json()
            .await
            .map_err(|e| GenerationError::parse(e.to_string()))?;

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| GenerationError::parse("completion had no content"))
    }

    fn generator_info(&self) -> GeneratorInfo {
        GeneratorInfo::new("openai", &self.config.model)
    }
}

/// Instruction block sent to the semantic triage model.
const TRIAGE_SYSTEM_PROMPT: &str =
    "You are a medical triage assistant. Return ONLY valid JSON, no other text.";

fn triage_user_prompt(conversation_text: &str) -> String {
    format!(
        "You are a medical triage assistant. Analyze the following patient conversation and \
         determine the appropriate triage level.\n\nConversation:\n{}\n\nReturn ONLY valid JSON \
         with this exact structure:\n{{\n  \"level\": \"mild\" | \"emergency\" | \"unclear\",\n  \
         \"red_flags\": [\"detected\", \"red\", \"flags\"],\n  \"high_risk\": [\"high\", \"risk\", \
         \"factors\"],\n  \"severe_signals\": [\"severe\", \"signals\"],\n  \"reasoning\": \"brief \
         explanation of your decision\"\n}}\n\nTriage guidelines:\n- \"emergency\": \
         Life-threatening symptoms or severe distress: chest pain with breathing trouble, \
         stroke-like symptoms, severe allergic reactions, severe bleeding, seizures.\n- \
         \"unclear\": High-risk patients (pregnant, very young infants, immunocompromised) with \
         symptoms that need professional evaluation but aren't immediately life-threatening. \
         Broken bones, fractures, and dislocations always need medical evaluation.\n- \"mild\": \
         Common, non-urgent symptoms manageable with self-care.\n\nBe conservative - when in \
         doubt, err on the side of caution and escalate.",
        conversation_text
    )
}

/// Raw verdict payload; `level` stays a string so unknown values can be
/// normalized instead of failing the pass.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    level: Option<String>,
    #[serde(default)]
    red_flags: Vec<String>,
    #[serde(default)]
    high_risk: Vec<String>,
    #[serde(default)]
    severe_signals: Vec<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

fn normalize_level(level: Option<&str>) -> TriageLevel {
    match level {
        Some("emergency") => TriageLevel::Emergency,
        Some("unclear") => TriageLevel::Unclear,
        _ => TriageLevel::Mild,
    }
}

fn parse_verdict(content: &str) -> Result<AnalyzerVerdict, AnalysisError> {
    let raw: RawVerdict =
        serde_json::from_str(content).map_err(|e| AnalysisError::malformed(e.to_string()))?;
    Ok(AnalyzerVerdict {
        level: normalize_level(raw.level.as_deref()),
        red_flags: raw.red_flags,
        high_risk: raw.high_risk,
        severe_signals: raw.severe_signals,
        reasoning: raw.reasoning,
    })
}

/// OpenAI semantic triage analyzer.
pub struct OpenAiTriageAnalyzer {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiTriageAnalyzer {
    /// Creates a new analyzer with the given configuration.
    pub fn new(config: OpenAiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> AnalysisError {
        if err.is_timeout() {
            AnalysisError::Timeout {
                timeout_secs: self.config.timeout.as_secs() as u32,
            }
        } else {
            AnalysisError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl TriageAnalyzer for OpenAiTriageAnalyzer {
    async fn analyze(&self, conversation_text: &str) -> Result<AnalyzerVerdict, AnalysisError> {
        let prompt = triage_user_prompt(conversation_text);
        let body = CompletionBody {
            model: &self.config.model,
            messages: vec![
                WireMessage {
                    role: "system",
                    content: TRIAGE_SYSTEM_PROMPT,
                },
                WireMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.1,
            response_format: Some(WireResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .client
            .post(self.config.chat_completions_url())
            .bearer_auth(self.config.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::unavailable(format!("{}: {}", status, body)));
        }

        let envelope: CompletionEnvelope = response
            .json()
            .await
            .map_err(|e| AnalysisError::malformed(e.to_string()))?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AnalysisError::malformed("completion had no content"))?;

        parse_verdict(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_parses_well_formed_payload() {
        let verdict = parse_verdict(
            r#"{"level": "unclear", "high_risk": ["pregnant"], "reasoning": "pregnancy"}"#,
        )
        .unwrap();
        assert_eq!(verdict.level, TriageLevel::Unclear);
        assert_eq!(verdict.high_risk, vec!["pregnant"]);
        assert_eq!(verdict.reasoning.as_deref(), Some("pregnancy"));
    }

    #[test]
    fn unknown_level_normalizes_to_mild() {
        let verdict = parse_verdict(r#"{"level": "catastrophic"}"#).unwrap();
        assert_eq!(verdict.level, TriageLevel::Mild);

        let verdict = parse_verdict(r#"{}"#).unwrap();
        assert_eq!(verdict.level, TriageLevel::Mild);
    }

    #[test]
    fn non_json_payload_is_malformed() {
        assert!(matches!(
            parse_verdict("I think this is an emergency"),
            Err(AnalysisError::Malformed(_))
        ));
    }

    #[test]
    fn status_errors_map_to_generation_errors() {
        assert!(matches!(
            OpenAiGenerator::map_status_error(StatusCode::UNAUTHORIZED, ""),
            GenerationError::AuthenticationFailed
        ));
        assert!(matches!(
            OpenAiGenerator::map_status_error(StatusCode::TOO_MANY_REQUESTS, ""),
            GenerationError::RateLimited { .. }
        ));
        assert!(matches!(
            OpenAiGenerator::map_status_error(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            GenerationError::Unavailable { .. }
        ));
    }

    #[test]
    fn triage_prompt_embeds_the_conversation() {
        let prompt = triage_user_prompt("chest pain since lunch");
        assert!(prompt.contains("chest pain since lunch"));
        assert!(prompt.contains("ONLY valid JSON"));
    }
}
