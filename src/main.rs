//! Mindful Echo - supportive well-being chat companion
//!
//! Serves a single-page chat UI and relays each session's conversation to a
//! hosted chat model, keeping history in memory for the browser session only.

mod api;
mod config;
mod conversation;
mod llm;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::AppConfig;
use conversation::persona::SYSTEM_INSTRUCTION;
use conversation::PromptAssembler;
use llm::{LlmService, LoggingService, OpenAIService};
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindful_echo=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration; a missing credential stops us before we accept input
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let gateway = OpenAIService::new(config.api_key, &config.model, &config.base_url)?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gateway)));

    tracing::info!(
        model = %config.model,
        base_url = %config.base_url,
        temperature = config.settings.temperature,
        context_policy = %config.context_policy,
        "Inference gateway configured"
    );

    let sessions = Arc::new(SessionManager::new(
        llm,
        Arc::from(SYSTEM_INSTRUCTION),
        PromptAssembler::new(config.context_policy),
        config.settings,
    ));

    // Expire sessions whose browser has gone away
    let sweeper = sessions.clone();
    let max_idle = config.session_idle;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let expired = sweeper.sweep_idle(max_idle).await;
            if expired > 0 {
                let remaining = sweeper.session_count().await;
                tracing::info!(expired, remaining, "Expired idle sessions");
            }
        }
    });

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

    let app = create_router(AppState::new(sessions))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Mindful Echo listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
