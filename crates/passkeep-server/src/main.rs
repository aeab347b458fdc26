//! `PassKeep` server binary.
//!
//! Starts the HTTP server with configuration from environment variables.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use passkeep_server::config::{ServerConfig, StorageBackendType};
use passkeep_server::hardening;
use passkeep_server::routes::build_router;
use passkeep_server::state::AppState;
use passkeep_server::sweeper::session_sweeper;
use passkeep_storage::{MemoryBackend, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // Runs before logging is initialized.
    apply_hardening(&config);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(storage = ?config.storage_backend, "PassKeep starting");

    let storage = open_storage(&config.storage_backend)?;
    let session_ttl = i64::try_from(config.session_ttl_secs)
        .ok()
        .and_then(chrono::TimeDelta::try_seconds)
        .context("session TTL out of range")?;
    let state = Arc::new(AppState::new(storage, session_ttl));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_handle = tokio::spawn(session_sweeper(
        Arc::clone(&state.sessions),
        shutdown_rx,
        Duration::from_secs(config.session_scan_interval_secs),
    ));

    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "PassKeep server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    info!("waiting for background workers to stop");
    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper_handle).await;

    info!("PassKeep server stopped");
    Ok(())
}

/// Open the configured storage backend.
fn open_storage(backend: &StorageBackendType) -> anyhow::Result<Arc<dyn StorageBackend>> {
    match backend {
        StorageBackendType::Memory => {
            tracing::warn!("using in-memory storage, all data is lost on restart");
            Ok(Arc::new(MemoryBackend::new()))
        }
        #[cfg(feature = "redb-backend")]
        StorageBackendType::Redb { path } => {
            let db = passkeep_storage::RedbBackend::open(path)
                .with_context(|| format!("failed to open redb at {path}"))?;
            Ok(Arc::new(db))
        }
        #[cfg(feature = "rocksdb-backend")]
        StorageBackendType::RocksDb { path } => {
            let db = passkeep_storage::RocksDbBackend::open(path)
                .with_context(|| format!("failed to open rocksdb at {path}"))?;
            Ok(Arc::new(db))
        }
        #[allow(unreachable_patterns)]
        other => anyhow::bail!("storage backend {other:?} is not compiled into this binary"),
    }
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}

/// Uses `eprintln` because structured logging is not yet available.
#[allow(clippy::print_stderr)]
fn apply_hardening(config: &ServerConfig) {
    if config.allow_core_dumps {
        eprintln!("WARNING: core dumps left enabled via PASSKEEP_ALLOW_CORE_DUMPS");
    } else if let Err(e) = hardening::disable_core_dumps() {
        eprintln!("WARNING: failed to disable core dumps: {e}");
    }
}
