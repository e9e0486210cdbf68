//! Car Service - Main Application Entry Point
//!
//! This is a REST API server for managing a catalogue of cars. It exposes list, create, update and soft-delete endpoints over a MySQL `cars` table.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: MySQL with sqlx (async queries, pooled connections)
//! - **Connections**: one pooled connection per request, configured and released by middleware
//! - **Format**: JSON requests, `{ success, message, data }` responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Build HTTP router with routes and middleware
//! 4. Start server on configured port, shut down gracefully on Ctrl+C / SIGTERM

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;

use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!(
        host = %config.db_host,
        database = %config.db_database,
        "Configuration loaded"
    );

    // Create database pool
    let pool = db::create_pool(&config).await?;
    tracing::info!(
        max_connections = config.db_max_connections,
        "Database pool created"
    );

    let app = routes::build_router(pool, config.session());

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::warn!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::warn!("Received SIGTERM, shutting down");
        }
    }
}
