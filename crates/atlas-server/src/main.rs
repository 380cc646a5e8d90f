//! Atlas Server - Main entry point

use anyhow::Result;
use atlas_common::logging::{init_logging, LogConfig};
use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, routing::get, Json, Router};
use serde_json::json;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;

use atlas_server::{
    config::Config,
    etl::{scheduler::EtlScheduler, EtlPipeline},
    features::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("atlas-server".to_string())
        .filter_directives("atlas_server=debug,tower_http=debug,sqlx=info".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting Atlas Server");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    // Initialize database connection pool; production requires TLS
    let connect_options = PgConnectOptions::from_str(&config.database.url)?.ssl_mode(
        if config.environment.is_production() {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        },
    );

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
        .connect_with(connect_options)
        .await?;

    info!("Database connection pool established");

    // Run migrations
    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    // Build the ETL pipeline
    let pipeline = Arc::new(EtlPipeline::new(&config.etl, db_pool.clone())?);

    // Start the recurring refresh scheduler if enabled
    let _scheduler_handle = if config.etl.schedule_enabled {
        let scheduler = EtlScheduler::new(pipeline.clone(), config.etl.refresh_cron.clone());
        let handle = scheduler.start();
        info!("ETL scheduler started");
        Some(handle)
    } else {
        info!("ETL scheduling is disabled (ETL_SCHEDULE_ENABLED=false)");
        None
    };

    // Create application state
    let state = AppState {
        db: db_pool,
        pipeline,
    };

    // Build the application router
    let app = create_router(state);

    // Create socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state.clone())
        .merge(features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Health check handler
async fn health_check(State(state): State<AppState>) -> Result<Response, StatusCode> {
    // Check database connectivity
    match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
