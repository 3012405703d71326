//! Companion Chat - single-session chat backend
//!
//! Serves a chat session over HTTP/SSE and a Gemini-backed completion
//! endpoint the session can call through.

mod api;
mod config;
mod gateway;
mod llm;
mod runtime;
mod session;
mod state_machine;

use api::{create_router, AppState};
use config::ChatConfig;
use gateway::{CompletionGateway, HttpGateway, ProviderGateway};
use llm::ModelRegistry;
use runtime::{spawn_session, SessionOptions};
use session::ConfigurationState;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "companion_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ChatConfig::from_env();

    // Initialize provider registry
    let registry = Arc::new(ModelRegistry::new(&config.llm));
    if registry.has_credential() {
        tracing::info!(
            models = ?registry.available_models(),
            default = %registry.default_model_id(),
            "Provider registry initialized"
        );
    } else {
        tracing::warn!("GEMINI_API_KEY is not set; completions will fail until it is.");
    }

    // Pick the session's gateway
    let gateway: Arc<dyn CompletionGateway> = match &config.gateway_url {
        Some(url) => {
            let http = HttpGateway::new(url.clone())?;
            tracing::info!(endpoint = %http.endpoint(), "Session uses HTTP completion gateway");
            Arc::new(http)
        }
        None => {
            tracing::info!("Session calls the provider in-process");
            Arc::new(ProviderGateway::new(registry.clone()))
        }
    };

    let session_config =
        ConfigurationState::new(registry.default_model_id(), registry.available_models())?;
    let session = spawn_session(
        gateway,
        session_config,
        SessionOptions {
            request_timeout: config.request_timeout,
        },
    );

    let state = AppState::new(session, registry);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Companion chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
