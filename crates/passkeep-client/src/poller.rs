//! Background inbox polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::api::PasswordApi;
use crate::view::{fetch_inbox, ViewState};
use crate::DEFAULT_POLL_INTERVAL;

/// A cancellable task that refreshes [`ViewState::messages`] on a fixed
/// interval.
///
/// The first poll happens one interval after [`start`](Self::start). A poll
/// that is still in flight when [`stop`](Self::stop) is called finishes
/// before the task exits. Dropping the poller aborts the task.
#[derive(Debug)]
pub struct InboxPoller {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl InboxPoller {
    /// Spawn the poll task on the current Tokio runtime.
    #[must_use]
    pub fn start(
        api: Arc<dyn PasswordApi>,
        username: String,
        state: Arc<RwLock<ViewState>>,
        interval: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            interval
        };
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(api, username, state, rx, interval));
        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the task and wait for it to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for InboxPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.shutdown.send(true);
            handle.abort();
        }
    }
}

async fn poll_loop(
    api: Arc<dyn PasswordApi>,
    username: String,
    state: Arc<RwLock<ViewState>>,
    mut shutdown: watch::Receiver<bool>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    debug!(username, interval_ms = interval.as_millis(), "inbox poller started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = fetch_inbox(api.as_ref(), &username, &state).await {
                    warn!(username, error = %e, "inbox poll failed");
                }
            }
            _ = shutdown.changed() => {
                debug!(username, "inbox poller stopped");
                return;
            }
        }
    }
}
