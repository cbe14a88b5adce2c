use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ticket_analyzer::{
    api::{self, AppState},
    config::AppConfig,
    manager::ModelManager,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // -----------------------------
    // Logging
    // -----------------------------
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting support ticket analyzer...");

    let cfg = AppConfig::from_env()?;

    // -----------------------------
    // Models
    // -----------------------------
    let load_cfg = cfg.clone();
    let models = tokio::task::spawn_blocking(move || ModelManager::load(&load_cfg))
        .await
        .context("model loading task failed")??;

    let state = AppState {
        analyzer: Arc::new(models.analyzer()),
    };

    // -----------------------------
    // Routers
    // -----------------------------
    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        // CORS for browser clients
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .with_state(state);

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;

    info!("🌐 HTTP listening on http://{}", cfg.bind_addr);
    info!("🛠 Analyze endpoint at http://{}/analyze", cfg.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
