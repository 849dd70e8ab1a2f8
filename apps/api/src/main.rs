mod analysis;
mod announcements;
mod catalog;
mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod state;
mod submissions;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, TextGenerator};
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

    info!("Starting Feedback API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client (optional: analyzer and chat return a configuration error without it)
    let llm: Option<Arc<dyn TextGenerator>> = match &config.gemini_api_key {
        Some(key) => {
            let mut client =
                LlmClient::new(key.clone(), Duration::from_secs(config.llm_timeout_secs))?;
            if let Some(base) = &config.gemini_api_base {
                client = client.with_base_url(base);
            }
            info!(
                "LLM client initialized (model: {}, timeout: {}s)",
                llm_client::MODEL,
                config.llm_timeout_secs
            );
            Some(Arc::new(client))
        }
        None => {
            warn!("GEMINI_API_KEY not set; analyzer and chat endpoints will return 500");
            None
        }
    };

    // Build app state
    let state = AppState { db, llm };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS to the portal front-end origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
