mod config;
mod errors;
mod extraction;
mod llm_client;
mod matching;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::matching::evaluator::CandidateEvaluator;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed numeric settings)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV Matcher v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Provider: {} | Model/Deployment: {}",
        config.provider().as_str(),
        config.deployment_label()
    );

    // Initialize LLM client (absent without credentials)
    let completion = config.completion_client()?;
    match &completion {
        Some(client) => info!("LLM client initialized (model: {})", client.model()),
        None => warn!("API key not set. Only parsing and keyword analysis will be available."),
    }
    let evaluator = CandidateEvaluator::new(completion);

    let state = AppState {
        config: config.clone(),
        evaluator,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
