// Dashboard API server entry point
//
// Usage: cargo run --features api --bin dashboard_server

use std::net::SocketAddr;
use taxa_dashboard::{create_router, AppState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "taxa_dashboard=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dashboard server...");

    // PORT, SESSION_TTL_SECS, MAX_SESSIONS, MAX_UPLOAD_BYTES
    let config = ServerConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  PORT: {}", config.port);
    tracing::info!("  SESSION_TTL_SECS: {}", config.session_ttl.as_secs());
    tracing::info!("  MAX_SESSIONS: {}", config.max_sessions);
    tracing::info!("  MAX_UPLOAD_BYTES: {}", config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
