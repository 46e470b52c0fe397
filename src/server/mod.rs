//! HTTP surface.

pub mod health;
pub mod providers;
pub mod router;
pub mod state;
pub mod streaming;

use crate::error::{GatewayError, Result};

pub use state::AppState;

/// Serve until Ctrl-C or SIGTERM, then stop every provider process.
pub async fn serve(state: AppState) -> Result<()> {
    let bind_addr = state.config.bind_address.clone();
    let registry = state.registry.clone();
    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| GatewayError::Configuration(format!("failed to bind to {bind_addr}: {e}")))?;
    tracing::info!("Server listening on {bind_addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tracing::info!("shutting down tool providers");
    registry.shutdown().await;
    served.map_err(GatewayError::Io)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
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
}
