pub mod routes;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;

use crate::cli::ServeOpts;
use crate::config::Config;
use crate::providers;
use crate::sessions::SessionStore;

/// Shared state for the HTTP service.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub start_time: std::time::Instant,
    pub version: String,
}

/// Start the service and run until a shutdown signal is received.
pub async fn serve(config: Config, opts: ServeOpts) -> Result<()> {
    let services = providers::create_services(&config)?;
    let store = Arc::new(SessionStore::new(&config, services)?);

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    // Background TTL sweep; first pass runs immediately.
    let sweeper = store.clone().spawn_sweeper(
        Duration::from_secs(config.storage.sweep_interval_seconds),
        shutdown_tx.subscribe(),
    );

    let state = AppState {
        store,
        shutdown_tx: shutdown_tx.clone(),
        start_time: std::time::Instant::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let app = routes::build_routes(state);

    let host = opts.bind.as_deref().unwrap_or(&config.server.host);
    let port = opts.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("askpdf listening on http://{addr}");
    info!("  Upload: POST http://{addr}/upload_pdfs?session_id=<id>");
    info!("  Ask:    POST http://{addr}/ask");
    info!("  Health: GET  http://{addr}/api/health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    // The shutdown broadcast also stops the sweep task; wait for it so
    // no timer outlives the process teardown.
    let _ = sweeper.await;

    info!("askpdf shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }

    let _ = shutdown_tx.send(());
}
