mod handlers;
mod judge_client;
mod language_config;
mod metrics;
mod orchestrator;
mod routes;
#[cfg(test)]
mod testing;

use anyhow::Context;
use axum::Router;
use forge_common::config::Config;
use forge_common::redis::RedisSubmissionStore;
use judge_client::HttpJudgeClient;
use language_config::LanguageRegistry;
use orchestrator::Orchestrator;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Forge API booting...");

    let config = Config::from_env()?;

    let languages = LanguageRegistry::load_or_default(&config.languages_config)
        .map_err(anyhow::Error::msg)?;
    info!(path = %config.languages_config.display(), "Loaded language runtimes");

    // Connect to Redis
    let client = redis::Client::open(config.redis_url.as_str())
        .context("Failed to create Redis client")?;
    let redis_conn = ConnectionManager::new(client)
        .await
        .context("Failed to connect to Redis")?;

    info!("Connected to Redis: {}", config.redis_url);

    let judge = HttpJudgeClient::new(
        &config.judge_url,
        Duration::from_secs(config.judge_timeout_seconds),
        languages,
    )
    .context("Failed to build judge client")?;
    info!(judge_url = %config.judge_url, "Judge client ready");

    let store = RedisSubmissionStore::new(redis_conn, config.submission_ttl_seconds);

    let state = Arc::new(AppState {
        orchestrator: Orchestrator::new(Arc::new(judge), Arc::new(store)),
    });

    // Build router
    let app = Router::new()
        .merge(routes::routes())
        .with_state(state);

    // Start server
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    info!("HTTP server listening on {}", config.bind_addr);
    info!("Ready to accept submissions");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Forge API shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    warn!("Received shutdown signal, draining connections...");
}
