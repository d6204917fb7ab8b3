//! Mock adapters for testing.
//!
//! Configurable implementations of the Generator and TriageAnalyzer ports:
//! pre-queued responses, error injection, and call tracking, so the
//! orchestrator can be exercised without any live backend.
//!
//! # Example
//!
//! ```ignore
//! let generator = MockGenerator::new()
//!     .with_response("I understand. ...")
//!     .with_error(GenerationError::unavailable("down"));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{
    AnalysisError, AnalyzerVerdict, GenerationError, GenerationRequest, Generator, GeneratorInfo,
    TriageAnalyzer,
};

/// Mock generator with queued responses (consumed in order).
#[derive(Clone, Default)]
pub struct MockGenerator {
    responses: Arc<Mutex<VecDeque<Result<String, GenerationError>>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerator {
    /// Creates a new mock generator with no queued responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(content.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: GenerationError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Returns the number of calls made to this generator.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded requests.
    pub fn recorded_calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()))
    }

    fn generator_info(&self) -> GeneratorInfo {
        GeneratorInfo::new("mock", "mock-model-1")
    }
}

/// Mock semantic analyzer with queued verdicts (consumed in order).
#[derive(Clone, Default)]
pub struct MockTriageAnalyzer {
    verdicts: Arc<Mutex<VecDeque<Result<AnalyzerVerdict, AnalysisError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockTriageAnalyzer {
    /// Creates a new mock analyzer with no queued verdicts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful verdict.
    pub fn with_verdict(self, verdict: AnalyzerVerdict) -> Self {
        self.verdicts.lock().unwrap().push_back(Ok(verdict));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: AnalysisError) -> Self {
        self.verdicts.lock().unwrap().push_back(Err(error));
        self
    }

    /// Returns the number of calls made to this analyzer.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TriageAnalyzer for MockTriageAnalyzer {
    async fn analyze(&self, conversation_text: &str) -> Result<AnalyzerVerdict, AnalysisError> {
        self.calls
            .lock()
            .unwrap()
            .push(conversation_text.to_string());
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AnalysisError::unavailable("no verdict queued")))
    }
}
