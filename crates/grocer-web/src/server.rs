//! Server startup and lifecycle

use crate::{routes, AppState, ServerConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Run the web server until Ctrl-C
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    run_server_with_shutdown(config, ctrl_c()).await
}

/// Run server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: ServerConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    // Create application state
    let state = Arc::new(AppState::new(config.clone()).await?);

    // Create router
    let app = routes::create_router(state);

    // Bind to address
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("🚀 {} listening on http://{}", config.app_name, addr);
    if config.environment.is_development() {
        info!("Development mode: error pages include diagnostic detail");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // Without a signal handler, keep serving until the process is killed
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_signal_stops_server() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            session_secret: "test-secret".to_string(),
            use_memory_backend: true,
            ..Default::default()
        };

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run_server_with_shutdown(config, async {}),
        )
        .await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_startup_fails_without_secret() {
        let result = run_server_with_shutdown(ServerConfig::default(), async {}).await;
        assert!(result.is_err());
    }
}
