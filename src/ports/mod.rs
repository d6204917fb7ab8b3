//! Ports - capability traits the policy core depends on.
//!
//! Adapters implement these traits; the core only sees the trait objects,
//! so it can be tested with deterministic fakes and swapped between
//! template and live backends without branching inside the core.

mod generator;
mod triage_analyzer;

pub use generator::{
    ChatMessage, ChatRole, GenerationError, GenerationRequest, Generator, GeneratorInfo,
    ResponseFormat,
};
pub use triage_analyzer::{AnalysisError, AnalyzerVerdict, TriageAnalyzer};
