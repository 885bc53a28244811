//! vetlens dashboard server
//!
//! Run with: cargo run -p vetlens-web

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use vetlens_sentiment::ScorerSet;
use vetlens_web::config::ServerConfig;
use vetlens_web::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting vetlens dashboard...");

    let config = ServerConfig::load()?;

    // Model loading can take minutes on first run (hub download); each
    // checkpoint that fails falls back to the lexicon scorer.
    let scorers = ScorerSet::load(&config.scorer).await;

    let state = Arc::new(AppState::new(scorers, &config));
    let app = vetlens_web::router::build_router(state, &config.static_dir);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Dashboard listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
