mod config;
mod errors;
mod models;
mod pagination;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pagewright v{}", env!("CARGO_PKG_VERSION"));

    let defaults = &config.page_defaults;
    info!(
        "Page defaults: {:?} paper, {:?} margins, {:?} type, usable height {}px",
        defaults.paper,
        defaults.margin,
        defaults.font,
        defaults.usable_height()
    );

    let state = AppState::new(config.clone());
    state
        .previews
        .clone()
        .spawn_idle_sweeper(config.preview_idle_timeout);
    info!(
        "Preview sessions expire after {}s idle",
        config.preview_idle_timeout.as_secs()
    );

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the editor frontend

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
