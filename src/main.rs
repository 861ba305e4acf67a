//! Thumbcache - An image resize proxy with a bounded, expiring result cache

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thumbcache::{create_router, AppState, Config, JpegTransformer, Limits, ResultCache};

/// Main entry point for the resize server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the result cache and the transform pipeline
/// 4. Create Axum router with all endpoints and middleware
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thumbcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Thumbcache Server");

    let config = Config::from_env();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    let cache =
        ResultCache::new(config.cache_config()).context("failed to create result cache")?;
    info!(
        max_size = cache.max_size(),
        max_age_secs = cache.max_age().as_secs(),
        "Result cache initialized"
    );

    let transformer = JpegTransformer::new(Duration::from_secs(config.fetch_timeout))
        .context("failed to build HTTP client")?;

    let state = AppState::new(cache, Arc::new(transformer), Limits::from(&config));
    info!(
        max_width = config.max_image_width,
        max_height = config.max_image_height,
        max_image_size = config.max_image_size,
        "Request limits configured"
    );

    let app = create_router(
        state,
        Duration::from_secs(config.request_timeout),
        config.max_concurrent_requests,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
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
}
