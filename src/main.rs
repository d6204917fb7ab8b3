//! Care Compass service entry point.

use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use care_compass::adapters::ai::{
    OpenAiConfig, OpenAiGenerator, OpenAiTriageAnalyzer, TemplateGenerator,
};
use care_compass::adapters::http::chat::{chat_routes, handlers::ChatState};
use care_compass::application::TurnHandler;
use care_compass::config::{AppConfig, GeneratorMode};
use care_compass::domain::triage::TriageClassifier;
use care_compass::ports::Generator;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.server.log_level)
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = config.validate() {
        error!(error = %err, "invalid configuration");
        std::process::exit(1);
    }

    let (generator, classifier): (Arc<dyn Generator>, TriageClassifier) = match config.ai.mode {
        GeneratorMode::Template => (
            Arc::new(TemplateGenerator::new()),
            TriageClassifier::rule_based(),
        ),
        GeneratorMode::OpenAi => {
            let key = config
                .ai
                .openai_api_key
                .clone()
                .expect("validated configuration has a key in openai mode");
            let provider_config = OpenAiConfig::new(key)
                .with_model(config.ai.model.clone())
                .with_base_url(config.ai.base_url.clone())
                .with_timeout(config.ai.timeout());
            (
                Arc::new(OpenAiGenerator::new(provider_config.clone())),
                TriageClassifier::with_analyzer(Arc::new(OpenAiTriageAnalyzer::new(
                    provider_config,
                ))),
            )
        }
    };

    let generator_info = generator.generator_info();
    info!(
        backend = %generator_info.name,
        model = %generator_info.model,
        max_attempts = config.ai.max_attempts,
        "generator ready"
    );

    let turn_handler = Arc::new(
        TurnHandler::new(generator, classifier).with_max_attempts(config.ai.max_attempts),
    );

    let cors = {
        let origins: Vec<HeaderValue> = config
            .server
            .cors_origins_list()
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        if origins.is_empty() {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    let app = chat_routes(ChatState::new(turn_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(std::time::Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors);

    let addr = config.server.socket_addr();
    info!(%addr, "care-compass listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, %addr, "failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        error!(error = %err, "server error");
        std::process::exit(1);
    }
}
