//! Generator and semantic classifier configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Generator / semantic classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Which generator backend to use
    #[serde(default)]
    pub mode: GeneratorMode,

    /// OpenAI API key (required in `openai` mode)
    pub openai_api_key: Option<String>,

    /// Model identifier for the OpenAI backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds for generator/classifier calls
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum generation attempts per turn before the deterministic
    /// template fallback takes over
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Generator backend selection.
///
/// `template` serves every turn from the deterministic repair templates
/// (no network calls); `openai` uses the chat-completions API with the
/// template generator as the guaranteed fallback.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorMode {
    #[default]
    Template,
    OpenAi,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an OpenAI key is configured
    pub fn has_openai_key(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate generator configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mode == GeneratorMode::OpenAi && !self.has_openai_key() {
            return Err(ValidationError::MissingRequired(
                "CARE_COMPASS__AI__OPENAI_API_KEY",
            ));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(ValidationError::InvalidAttemptLimit);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            mode: GeneratorMode::default(),
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_config_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.mode, GeneratorMode::Template);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn test_timeout_duration() {
        let config = AiConfig {
            timeout_secs: 45,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(45));
    }

    #[test]
    fn test_template_mode_needs_no_key() {
        let config = AiConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_openai_mode_requires_key() {
        let config = AiConfig {
            mode: GeneratorMode::OpenAi,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AiConfig {
            mode: GeneratorMode::OpenAi,
            openai_api_key: Some("sk-xxx".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_attempt_limit_bounds() {
        let config = AiConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AiConfig {
            max_attempts: 11,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
