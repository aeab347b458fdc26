//! The password manager view-controller.
//!
//! [`PasswordManagerView`] owns the form inputs, the displayed credential
//! list, and the share inbox for one logged-in user. All persistence goes
//! through an injected [`PasswordApi`]. Every failed action leaves a
//! user-facing notice in [`ViewState::notice`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::PasswordApi;
use crate::error::ClientError;
use crate::generator::{self, GeneratorOptions};
use crate::poller::InboxPoller;
use crate::types::{CredentialEntry, ShareMessage};
use crate::DEFAULT_POLL_INTERVAL;

/// Everything the password manager screen shows or edits.
#[derive(Clone, Default)]
pub struct ViewState {
    /// URL input.
    pub url: String,
    /// Password input. Filled by the generator when submitted empty.
    pub password: String,
    /// Show stored passwords in clear text instead of masked.
    pub show_password: bool,
    /// Generator length and class checkboxes.
    pub options: GeneratorOptions,
    /// The context user's stored entries.
    pub passwords: Vec<CredentialEntry>,
    /// Pending share requests addressed to the context user.
    pub messages: Vec<ShareMessage>,
    /// Share-with username input.
    pub shared_username: String,
    /// Set when a share request failed validation.
    pub share_error: bool,
    pub sharing_request_sent: bool,
    pub submit_success: bool,
    /// Last user-facing message, cleared by the next successful action.
    pub notice: Option<String>,
}

impl fmt::Debug for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewState")
            .field("url", &self.url)
            .field("password", &"[REDACTED]")
            .field("options", &self.options)
            .field("passwords", &self.passwords.len())
            .field("messages", &self.messages)
            .field("shared_username", &self.shared_username)
            .field("share_error", &self.share_error)
            .field("sharing_request_sent", &self.sharing_request_sent)
            .field("submit_success", &self.submit_success)
            .field("notice", &self.notice)
            .finish_non_exhaustive()
    }
}

impl ViewState {
    /// `password` as it should be displayed: clear text when
    /// [`show_password`](Self::show_password) is set, otherwise masked.
    #[must_use]
    pub fn display_password(&self, password: &str) -> String {
        if self.show_password {
            password.to_owned()
        } else {
            "•".repeat(password.chars().count().min(12))
        }
    }
}

/// Result of [`PasswordManagerView::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The password input was empty; a password was generated into it and
    /// nothing was sent.
    Generated(String),
    /// The entry was stored.
    Stored(CredentialEntry),
}

/// View-controller for one logged-in user.
pub struct PasswordManagerView {
    api: Arc<dyn PasswordApi>,
    username: String,
    state: Arc<RwLock<ViewState>>,
    poll_interval: Duration,
    poller: Option<InboxPoller>,
}

impl fmt::Debug for PasswordManagerView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordManagerView")
            .field("username", &self.username)
            .field("poll_interval", &self.poll_interval)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

impl PasswordManagerView {
    pub fn new(api: Arc<dyn PasswordApi>, username: impl Into<String>) -> Self {
        Self {
            api,
            username: username.into(),
            state: Arc::new(RwLock::new(ViewState::default())),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poller: None,
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// A snapshot of the current state.
    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Change form inputs.
    pub async fn edit(&self, f: impl FnOnce(&mut ViewState)) {
        f(&mut *self.state.write().await);
    }

    /// Submit the form.
    ///
    /// The URL is checked first. With an empty password input a password is
    /// generated into the form and nothing is sent; otherwise the entry is
    /// stored, the inputs are cleared, and the list is refreshed once.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank URL or unusable generator
    /// options, or whatever the API returned. Inputs are kept on failure.
    pub async fn submit(&self) -> Result<SubmitOutcome, ClientError> {
        let (url, password, options) = {
            let s = self.state.read().await;
            (s.url.clone(), s.password.clone(), s.options.clone())
        };

        if url.trim().is_empty() {
            return Err(self.fail(ClientError::Validation("Please enter a URL".to_owned())).await);
        }

        if password.trim().is_empty() {
            let generated = match generator::generate(&options) {
                Ok(p) => p,
                Err(e) => return Err(self.fail(e.into()).await),
            };
            let mut s = self.state.write().await;
            s.password.clone_from(&generated);
            s.notice = None;
            return Ok(SubmitOutcome::Generated(generated));
        }

        let entry = CredentialEntry {
            url,
            password,
            last_updated: display_timestamp(),
        };
        let stored = match self.api.add_password(&entry).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(url = %entry.url, error = %e, "failed to add password");
                return Err(self.fail(e).await);
            }
        };

        {
            let mut s = self.state.write().await;
            s.url.clear();
            s.password.clear();
            s.submit_success = true;
            s.notice = None;
        }
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "stored password but could not refresh the list");
        }
        Ok(SubmitOutcome::Stored(stored))
    }

    /// Reload the credential list.
    ///
    /// # Errors
    ///
    /// Whatever the API returned; the current list is kept.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        match self.api.list_passwords().await {
            Ok(passwords) => {
                self.state.write().await.passwords = passwords;
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Replace the password of a stored entry.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank password, or whatever the API
    /// returned.
    pub async fn update_password(&self, url: &str, password: &str) -> Result<(), ClientError> {
        if password.trim().is_empty() {
            return Err(self
                .fail(ClientError::Validation("Please enter a password".to_owned()))
                .await);
        }
        match self
            .api
            .update_password(url, password, &display_timestamp())
            .await
        {
            Ok(updated) => {
                let mut s = self.state.write().await;
                upsert(&mut s.passwords, updated);
                s.notice = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Delete a stored entry, then drop it from the list.
    ///
    /// # Errors
    ///
    /// Whatever the API returned; the list is left unchanged.
    pub async fn delete_password(&self, url: &str) -> Result<(), ClientError> {
        match self.api.delete_password(url).await {
            Ok(()) => {
                let mut s = self.state.write().await;
                s.passwords.retain(|p| p.url != url);
                s.notice = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Ask the user named in [`ViewState::shared_username`] to accept a copy
    /// of the entry for `service_url`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] (and `share_error` set) for a blank or
    /// self-addressed target or a blank URL, without any request. Otherwise
    /// whatever the API returned.
    pub async fn request_share(&self, service_url: &str) -> Result<(), ClientError> {
        let target = {
            let mut s = self.state.write().await;
            let target = s.shared_username.trim().to_owned();
            let invalid =
                target.is_empty() || target == self.username || service_url.trim().is_empty();
            s.share_error = invalid;
            s.sharing_request_sent = false;
            if invalid {
                let err = ClientError::Validation(
                    "Enter another user's name and a saved url to share".to_owned(),
                );
                s.notice = Some(err.notice());
                return Err(err);
            }
            target
        };

        match self.api.send_share(&target, service_url).await {
            Ok(_) => {
                let mut s = self.state.write().await;
                s.sharing_request_sent = true;
                s.notice = None;
                Ok(())
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    /// Reload the share inbox once.
    ///
    /// # Errors
    ///
    /// Whatever the API returned; the current inbox is kept.
    pub async fn refresh_inbox(&self) -> Result<(), ClientError> {
        fetch_inbox(self.api.as_ref(), &self.username, &self.state).await
    }

    /// Accept the pending request for `service_url`. Issues exactly one
    /// request; on success the message leaves the inbox and the copied entry
    /// joins the list.
    ///
    /// # Errors
    ///
    /// Whatever the API returned. Not retried.
    pub async fn accept(&self, service_url: &str) -> Result<(), ClientError> {
        match self.api.accept_message(service_url, &self.username).await {
            Ok(copied) => {
                debug!(service_url, "share request accepted");
                let mut s = self.state.write().await;
                s.messages.retain(|m| m.service_url != service_url);
                upsert(&mut s.passwords, copied);
                s.notice = None;
                Ok(())
            }
            Err(e) => {
                warn!(service_url, error = %e, "failed to accept share request");
                Err(self.fail(e).await)
            }
        }
    }

    /// Reject the pending request for `service_url`. Issues exactly one
    /// request.
    ///
    /// # Errors
    ///
    /// Whatever the API returned. Not retried.
    pub async fn reject(&self, service_url: &str) -> Result<(), ClientError> {
        match self.api.reject_message(service_url).await {
            Ok(()) => {
                debug!(service_url, "share request rejected");
                let mut s = self.state.write().await;
                s.messages.retain(|m| m.service_url != service_url);
                s.notice = None;
                Ok(())
            }
            Err(e) => {
                warn!(service_url, error = %e, "failed to reject share request");
                Err(self.fail(e).await)
            }
        }
    }

    /// Start polling the inbox. No-op when already attached.
    pub fn attach(&mut self) {
        if self.poller.is_none() {
            self.poller = Some(InboxPoller::start(
                Arc::clone(&self.api),
                self.username.clone(),
                Arc::clone(&self.state),
                self.poll_interval,
            ));
        }
    }

    /// Stop polling and wait for the poll task to exit.
    pub async fn detach(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.poller.as_ref().is_some_and(InboxPoller::is_running)
    }

    async fn fail(&self, err: ClientError) -> ClientError {
        self.state.write().await.notice = Some(err.notice());
        err
    }
}

/// Replace the inbox wholesale with what the server holds for `username`.
pub(crate) async fn fetch_inbox(
    api: &dyn PasswordApi,
    username: &str,
    state: &RwLock<ViewState>,
) -> Result<(), ClientError> {
    let messages = api.list_messages(username).await?;
    state.write().await.messages = messages;
    Ok(())
}

fn upsert(passwords: &mut Vec<CredentialEntry>, entry: CredentialEntry) {
    match passwords.iter_mut().find(|p| p.url == entry.url) {
        Some(existing) => *existing = entry,
        None => passwords.push(entry),
    }
}

/// Local wall-clock time, e.g. `1/2/2024, 3:04:05 PM`.
fn display_timestamp() -> String {
    chrono::Local::now()
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}
