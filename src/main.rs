use anyhow::{Context, Result};
use axum::serve;
use geo_backend::core::config::Config;
use geo_backend::core::routes::build_router;
use geo_backend::core::startup::{build_credential_store, prepare_upload_dir, spawn_sweep_task};
use geo_backend::core::state::AppState;
use geo_backend::core::tracing_init::init_tracing;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    // Load and validate configuration
    let config = Config::load(&config_path).context(format!(
        "Failed to load configuration from '{}'. \
        Copy config.example.toml to config.toml or set JWT_SECRET in the environment.",
        config_path.display()
    ))?;

    init_tracing(&config.logging)?;

    // Build Tokio runtime with configured number of threads
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.num_threads)
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async_main(config, config_path))
}

async fn async_main(config: Config, config_path: PathBuf) -> Result<()> {
    info!(
        config_path = %config_path.display(),
        port = config.server.port,
        num_threads = config.server.num_threads,
        database = config.database.url.is_some(),
        upload_dir = %config.uploads.dir.display(),
        strict_geojson = config.uploads.strict_geojson,
        log_level = %config.logging.level,
        log_format = %config.logging.format,
        "GeoBackend starting"
    );

    let credentials = build_credential_store(&config.database).await?;
    let state = AppState::new(config.clone(), credentials)
        .context("Failed to build application state")?;

    prepare_upload_dir(&state.uploads).await?;

    if config.uploads.has_retention() {
        spawn_sweep_task(Arc::clone(&state.uploads), &config.uploads);
        info!(
            sweep_interval_seconds = config.uploads.sweep_interval_secs,
            retention_seconds = ?config.uploads.retention_secs,
            max_total_bytes = ?config.uploads.max_total_bytes,
            "Upload sweep task started"
        );
    }

    // Build the router with middleware
    let app = build_router(Arc::new(state)).layer(
        ServiceBuilder::new().layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        ),
    );

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind TCP listener to {}", addr))?;

    info!(address = %addr, "Server is running");

    if let Err(e) = serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %e, "Server error");
        return Err(e).context("HTTP server error");
    }

    info!("Shutting down gracefully");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
