//! Semantic triage analyzer port.
//!
//! An optional, best-effort external classifier. Any failure - transport,
//! auth, malformed payload - is absorbed by the triage classifier, which
//! falls through to its deterministic rule tables; an analyzer can refine
//! a triage decision but can never be required for one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::triage::TriageLevel;

/// Port for semantic triage backends.
#[async_trait]
pub trait TriageAnalyzer: Send + Sync {
    /// Analyzes the accumulated conversation text.
    async fn analyze(&self, conversation_text: &str) -> Result<AnalyzerVerdict, AnalysisError>;
}

/// A semantic analyzer's verdict, already normalized: an unrecognized
/// level collapses to `mild` at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerVerdict {
    /// Urgency classification.
    pub level: TriageLevel,
    /// Red flags the analyzer reported.
    #[serde(default)]
    pub red_flags: Vec<String>,
    /// High-risk factors the analyzer reported.
    #[serde(default)]
    pub high_risk: Vec<String>,
    /// Severe signals the analyzer reported.
    #[serde(default)]
    pub severe_signals: Vec<String>,
    /// Brief rationale for the verdict.
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl AnalyzerVerdict {
    /// Creates a verdict with just a level.
    pub fn with_level(level: TriageLevel) -> Self {
        Self {
            level,
            red_flags: Vec::new(),
            high_risk: Vec::new(),
            severe_signals: Vec::new(),
            reasoning: None,
        }
    }
}

/// Semantic analyzer errors. All variants are absorbed by the classifier.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Backend is unavailable.
    #[error("analyzer unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Network error during the request.
    #[error("network error: {0}")]
    Network(String),

    /// The analyzer returned an unusable payload.
    #[error("malformed analyzer payload: {0}")]
    Malformed(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },
}

impl AnalysisError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a malformed-payload error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}
