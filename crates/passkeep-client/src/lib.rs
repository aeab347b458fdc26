//! `PassKeep` client.
//!
//! - [`generator`]: random password generation.
//! - [`HttpClient`]: typed access to the `PassKeep` REST API, with retries
//!   for idempotent reads.
//! - [`PasswordManagerView`]: the password manager view-controller, owning
//!   the form state, the credential list, and the share inbox, which an
//!   [`InboxPoller`] refreshes in the background.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use passkeep_client::{ClientConfig, HttpClient, PasswordManagerView};
//!
//! # async fn example() -> Result<(), passkeep_client::ClientError> {
//! let mut client = HttpClient::new(ClientConfig::default())?;
//! let login = client.login("alice", "correct horse").await?;
//! client.set_token(login.token);
//!
//! let mut view = PasswordManagerView::new(Arc::new(client), login.username);
//! view.refresh().await?;
//! view.attach();
//! # Ok(())
//! # }
//! ```

mod api;
mod error;
pub mod generator;
mod http;
mod poller;
mod types;
mod view;

#[cfg(test)]
mod testing;

pub use api::PasswordApi;
pub use error::ClientError;
pub use http::HttpClient;
pub use poller::InboxPoller;
pub use types::{CredentialEntry, HealthStatus, LoginResponse, ShareMessage, UserSummary};
pub use view::{PasswordManagerView, SubmitOutcome, ViewState};

use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8300";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Interval between inbox polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration for [`HttpClient`].
///
/// Empty fields fall back to `PASSKEEP_URL` / `PASSKEEP_TOKEN`, then to the
/// built-in defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL. Default: `http://127.0.0.1:8300`.
    pub base_url: String,
    /// Session token from a previous login. Optional.
    pub token: String,
    /// Request timeout. Default: 10 seconds.
    pub timeout: Duration,
    /// Retry attempts for GET requests. Writes are never retried.
    pub max_retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
