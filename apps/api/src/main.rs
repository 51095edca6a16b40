mod artifacts;
mod config;
mod errors;
mod llm_client;
mod matching;
mod models;
mod pipeline;
mod providers;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::backoff::RetryPolicy;
use crate::providers::llm::{LlmMatchScorer, LlmResumeParser};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Shortlist API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client and the collaborators built on it
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize artifact store rooted at the configured data dir
    let artifacts = ArtifactStore::new(&config.data_dir);
    info!("Artifact store rooted at {}", config.data_dir.display());

    // Build app state
    let state = AppState {
        parser: Arc::new(LlmResumeParser::new(llm.clone())),
        scorer: Arc::new(LlmMatchScorer::new(llm)),
        artifacts,
        retry: RetryPolicy::default(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
