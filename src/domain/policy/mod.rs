//! The response policy: the exact-phrase contract, its validator, the
//! deterministic repair templates, and the corrective-feedback builder.

pub mod constraints;
mod feedback;
mod repair;
mod validator;

pub use feedback::{build_assessment_feedback, build_feedback, sanitize_action, sanitize_assessment};
pub use repair::{repair_response, RepairContext};
pub(crate) use repair::assemble_escalation_reply;
pub use validator::{validate_response, ValidationResult, Violation};
