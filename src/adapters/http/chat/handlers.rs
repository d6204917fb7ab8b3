//! HTTP handlers for the chat endpoint.

use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::application::{TurnHandler, TurnRequest};
use crate::domain::conversation::Message;

use super::dto::{ChatRequest, ChatResponse, ErrorResponse, MessageRoleDto};

/// Shared handler state.
#[derive(Clone)]
pub struct ChatState {
    turn_handler: Arc<TurnHandler>,
}

impl ChatState {
    pub fn new(turn_handler: Arc<TurnHandler>) -> Self {
        Self { turn_handler }
    }
}

/// POST /api/chat - Process one conversation turn.
///
/// A malformed body is the one fatal failure class: it produces a
/// structured error response, never a chat message. Everything downstream
/// (generation, classification, validation) recovers internally.
pub async fn post_chat(
    State(state): State<ChatState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection, "rejecting malformed chat request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("invalid_request", rejection.body_text())),
            )
                .into_response();
        }
    };

    let mut messages = Vec::with_capacity(request.messages.len());
    for dto in request.messages {
        let message = match dto.role {
            MessageRoleDto::User => Message::user(dto.content),
            MessageRoleDto::Assistant => Message::assistant(dto.content),
        };
        match message {
            Ok(message) => messages.push(message),
            Err(err) => {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ErrorResponse::new("invalid_message", err.to_string())),
                )
                    .into_response();
            }
        }
    }

    let response = state
        .turn_handler
        .handle(TurnRequest {
            messages,
            stage: request.stage,
        })
        .await;

    (StatusCode::OK, Json(ChatResponse::from(response))).into_response()
}

/// GET /health - Liveness probe.
pub async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}
