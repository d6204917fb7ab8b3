//! End-to-end turn pipeline tests over the HTTP router with mock adapters.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use care_compass::adapters::ai::{MockGenerator, TemplateGenerator};
use care_compass::adapters::http::chat::{chat_routes, handlers::ChatState};
use care_compass::application::TurnHandler;
use care_compass::domain::triage::TriageClassifier;
use care_compass::ports::{GenerationError, Generator};

fn app_with(generator: Arc<dyn Generator>) -> Router {
    let handler = TurnHandler::new(generator, TriageClassifier::rule_based());
    chat_routes(ChatState::new(Arc::new(handler)))
}

fn template_app() -> Router {
    app_with(Arc::new(TemplateGenerator::new()))
}

async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[tokio::test]
async fn greeting_turn_returns_compliant_opening() {
    let (status, body) = post_chat(
        template_app(),
        json!({ "messages": [], "stage": "greeting" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next_stage"], "clarify");
    assert_eq!(body["validation"]["ok"], true);
    assert_eq!(body["validation"]["repaired"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains(
        "When did this first start, and has it been getting better, worse, or staying the same?"
    ));
    assert!(message.contains("I can provide guidance, but I cannot replace an in-person examination"));
    assert!(body.get("emergency_action").is_none());
}

#[tokio::test]
async fn critical_symptoms_surface_the_emergency_action() {
    let (status, body) = post_chat(
        template_app(),
        json!({
            "messages": [
                { "role": "user", "content": "I have chest pain and I'm having trouble breathing." }
            ],
            "stage": "clarify"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triage"]["level"], "emergency");
    assert_eq!(body["triage"]["red_flags"][0], "critical_emergency_pattern");
    assert_eq!(body["next_stage"], "recommendation");
    assert_eq!(
        body["emergency_action"],
        "Call 911 now or go to the nearest emergency department."
    );
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Based on what you've told me"));
    assert!(message.contains("This is beyond what I can safely assess remotely"));
}

#[tokio::test]
async fn generator_failure_still_yields_a_compliant_reply() {
    let generator =
        MockGenerator::new().with_error(GenerationError::unavailable("backend down"));
    let (status, body) = post_chat(
        app_with(Arc::new(generator)),
        json!({
            "messages": [
                { "role": "user", "content": "I've been tired and a bit fatigued for two days." }
            ],
            "stage": "recommendation"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triage"]["level"], "mild");
    assert_eq!(body["validation"]["ok"], true);
    assert_eq!(body["validation"]["repaired"], true);
    assert!(body["validation"]["generator_error"]
        .as_str()
        .unwrap()
        .contains("backend down"));

    let message = body["message"].as_str().unwrap();
    let numbered = message
        .lines()
        .filter(|line| line.chars().next().is_some_and(|c| c.is_ascii_digit()))
        .count();
    assert_eq!(numbered, 3);
}

#[tokio::test]
async fn malformed_body_gets_a_structured_error_not_a_chat_message() {
    let response = template_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not valid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "invalid_request");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn empty_message_content_is_rejected() {
    let (status, body) = post_chat(
        template_app(),
        json!({
            "messages": [{ "role": "user", "content": "   " }],
            "stage": "clarify"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "invalid_message");
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let response = template_app()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn pregnant_lightheaded_is_unclear_with_high_risk() {
    let (status, body) = post_chat(
        template_app(),
        json!({
            "messages": [
                { "role": "user", "content": "I am pregnant and feeling lightheaded." }
            ],
            "stage": "concern"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["triage"]["level"], "unclear");
    assert_eq!(body["triage"]["high_risk"][0], "pregnant");
    assert_eq!(body["triage"]["red_flags"].as_array().unwrap().len(), 0);
    // Unclear triage does not override the stage flow.
    assert_eq!(body["next_stage"], "recommendation");
    assert_eq!(body["validation"]["ok"], true);
}
