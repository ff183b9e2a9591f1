//! HTTP gateway server.

use anyhow::{Context, Result};
use cachipfs::StoreClient;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::web::{router, WebState};

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn run(store: StoreClient, addr: &str, shutdown: CancellationToken) -> Result<()> {
    info!("CachIPFS gateway starting");
    info!("   IPFS binary: {}", store.config().binary);
    info!("   IPFS repo: {}", store.config().repo.display());
    info!("   Ephemeral dir: {}", store.config().ephemeral_dir.display());

    let app = router(WebState::new(store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    let local = listener
        .local_addr()
        .context("Failed to read bound address")?;

    info!("CachIPFS ready!");
    info!("   Content: POST/GET/HEAD http://{}/", local);
    info!("   Health: GET http://{}/health", local);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Cancel `token` on the first SIGINT or SIGTERM.
pub fn spawn_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        token.cancel();
    });
}

async fn shutdown_signal() {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
