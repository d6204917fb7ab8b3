//! Application layer - the per-turn orchestration.

mod turn;

pub use turn::{ReplyOutcome, TurnHandler, TurnRequest, TurnResponse, TurnValidation};
