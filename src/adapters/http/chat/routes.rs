//! HTTP routes for the chat endpoint.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{health, post_chat, ChatState};

/// Creates the chat router.
pub fn chat_routes(state: ChatState) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .route("/health", get(health))
        .with_state(state)
}
