//! Sports Central Service
//!
//! Main entry point for the Sports Central event engine. This service:
//! - applies database migrations
//! - keeps the live board in sync with the events table
//! - shuts down cleanly on Ctrl+C

use anyhow::Context;
use sports_central::config::LogFormat;
use sports_central::database::{create_pool, run_migrations};
use sports_central::repositories::EventStore;
use sports_central::views::Tab;
use sports_central::{AppConfig, AppError, AppState};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("sports_central={},sqlx=warn", config.log_level).into()
    });

    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(AppError::Config)
        .context("Failed to load configuration")?;

    init_tracing(&config);

    info!("Sports Central service starting");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!(
        "Subscription buffer: {} snapshots",
        config.store.subscription_buffer
    );

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool, None)
        .await
        .context("Database migration failed")?;
    info!("Database migrations completed successfully");

    // =========================================================================
    // LIVE BOARD
    // =========================================================================
    let app_state = Arc::new(AppState::new(pool, config.store.clone()));
    app_state
        .database
        .ping()
        .await
        .context("Database health check failed")?;

    let board = app_state.live_board.clone();
    let subscription = app_state.event_store.subscribe();
    let mut board_handle = tokio::spawn(async move { board.run(subscription).await });

    let mut snapshots = app_state.live_board.watch();
    let reporter_board = app_state.live_board.clone();
    let reporter_handle = tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let counts = reporter_board.counts();
            info!(
                "Board updated: {} upcoming, {} live, {} completed, {} total",
                counts.get(Tab::Upcoming),
                counts.get(Tab::Live),
                counts.get(Tab::Completed),
                counts.get(Tab::All)
            );
        }
    });

    info!("Sports Central service ready. Press Ctrl+C to shut down");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    let interrupted = tokio::select! {
        _ = tokio::signal::ctrl_c() => true,
        result = &mut board_handle => {
            match result {
                Ok(applied) => error!("Live board exited unexpectedly after {} snapshots", applied),
                Err(e) => error!("Live board task failed: {}", e),
            }
            false
        }
    };

    if interrupted {
        info!("Shutdown signal received, shutting down gracefully...");
        app_state.live_board.shutdown();
        if let Err(e) = board_handle.await {
            error!("Live board task failed: {}", e);
        }
    }

    reporter_handle.abort();
    app_state.database.close().await;

    info!("Sports Central service shutdown complete");
    Ok(())
}
