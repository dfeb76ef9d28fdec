//! Tasks API - A multi-tenant task-list REST API
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Connect to the store and apply migrations
//! 4. Start the expiry sweeper and the rate-limiter cleanup task
//! 5. Create the Axum router with all endpoints
//! 6. Start the HTTP server on the configured port
//! 7. Handle graceful shutdown on SIGINT/SIGTERM

mod api;
mod auth;
mod config;
mod error;
mod limiter;
mod models;
mod store;
mod sweeper;
mod tasks;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{create_router, AppState};
use config::Config;
use store::Store;
use sweeper::{parse_cron_pattern, spawn_expiry_sweeper};

const LIMITER_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasks_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tasks API");

    // Load configuration from environment variables
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: max_sessions={}, max_tasks={}, max_tasks_per_session={}, session_ttl={}s, port={}",
        config.max_session_count,
        config.max_tasks_count,
        config.max_tasks_per_session,
        config.session_ttl,
        config.server_port
    );

    let schedule = parse_cron_pattern(&config.cron_pattern)
        .with_context(|| format!("invalid CRON_PATTERN '{}'", config.cron_pattern))?;

    // Connect to the store and bring the schema up to date
    let store = Store::connect(&config.database_url)
        .await
        .context("failed to connect to the task store")?;
    store
        .migrate()
        .await
        .context("failed to apply store migrations")?;
    info!("Store ready at {}", config.database_url);

    // Create application state
    let state = AppState::new(store.clone(), &config);

    // Start background tasks
    let sweeper_handle = spawn_expiry_sweeper(
        store,
        schedule,
        Duration::from_secs(config.session_ttl),
    );
    let limiter_handle = state
        .limiter
        .clone()
        .start_cleanup_task(LIMITER_CLEANUP_INTERVAL);
    info!("Expiry sweeper started with pattern '{}'", config.cron_pattern);

    // Create router with all endpoints
    let app = create_router(state);

    // Bind to configured port
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // Start server with graceful shutdown; connect info feeds the
    // per-client rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(vec![sweeper_handle, limiter_handle]))
    .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the background tasks and allows graceful
/// shutdown.
async fn shutdown_signal(background_handles: Vec<JoinHandle<()>>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    for handle in background_handles {
        handle.abort();
    }
    warn!("Background tasks aborted");
}
