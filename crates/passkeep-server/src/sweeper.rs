//! Background worker that deletes expired sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use passkeep_core::session::SessionStore;

/// Consecutive failed sweeps before the log level escalates to `error`.
const ESCALATE_AFTER: u32 = 5;

/// Sweep expired sessions every `interval` until `shutdown` flips.
///
/// A failed sweep is logged and retried on the next tick. Persistent
/// failures escalate from `warn` to `error` so a dead backend is visible
/// without flooding the log on transient blips.
pub async fn session_sweeper(
    sessions: Arc<SessionStore>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut consecutive_failures: u32 = 0;
    info!(interval_secs = interval.as_secs(), "session sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match sessions.purge_expired(Utc::now()).await {
                    Ok(0) => consecutive_failures = 0,
                    Ok(removed) => {
                        consecutive_failures = 0;
                        info!(removed, "expired sessions purged");
                    }
                    Err(e) => {
                        consecutive_failures = consecutive_failures.saturating_add(1);
                        if consecutive_failures >= ESCALATE_AFTER {
                            tracing::error!(
                                error = %e,
                                consecutive_failures,
                                "session sweep persistently failing, storage may be down"
                            );
                        } else {
                            warn!(error = %e, consecutive_failures, "session sweep failed");
                        }
                    }
                }
            }
            _ = shutdown.changed() => {
                debug!("session sweeper shutting down");
                return;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passkeep_storage::MemoryBackend;

    #[tokio::test]
    async fn purges_expired_sessions_and_stops_on_shutdown() {
        let backend = MemoryBackend::new();
        let sessions = Arc::new(SessionStore::new(
            Arc::new(backend.clone()),
            chrono::Duration::zero(),
        ));
        sessions.create("alice").await.unwrap();
        assert_eq!(backend.len().await, 1);

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(session_sweeper(
            Arc::clone(&sessions),
            rx,
            Duration::from_millis(10),
        ));

        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(backend.is_empty().await);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
