// src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use simple_rest_proxy::{
    config,
    metrics::MetricsRegistry,
    server::{build_service, Route, ServerBuilder},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;

    // Initialize tracing
    let level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("simple_rest_proxy={level}").parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    match config.backend_url() {
        Some(url) => info!("Backend URL configured: {}", url),
        None => warn!("BACKEND environment variable not set. Set it before starting the service."),
    }

    info!("Available routes:");
    for route in Route::ALL {
        info!("  {} -> {}", route.path(), route.endpoint());
    }

    let metrics = Arc::new(MetricsRegistry::new()?);
    let state = AppState::new(&config, metrics)?;

    ServerBuilder::new(config.listen_addr())
        .with_handler(build_service(state))
        .serve_with_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
