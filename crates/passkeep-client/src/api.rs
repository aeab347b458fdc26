//! The persistence seam between the view-controller and the server.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{CredentialEntry, ShareMessage};

/// Credential and share-message operations for the logged-in user.
///
/// [`HttpClient`](crate::HttpClient) is the production implementation.
#[async_trait]
pub trait PasswordApi: Send + Sync {
    /// Every entry of the context user.
    async fn list_passwords(&self) -> Result<Vec<CredentialEntry>, ClientError>;

    /// Store a new entry.
    async fn add_password(&self, entry: &CredentialEntry) -> Result<CredentialEntry, ClientError>;

    /// Replace the password of an existing entry.
    async fn update_password(
        &self,
        url: &str,
        password: &str,
        last_updated: &str,
    ) -> Result<CredentialEntry, ClientError>;

    /// Delete an entry.
    async fn delete_password(&self, url: &str) -> Result<(), ClientError>;

    /// Ask `receiver` to accept a copy of the entry for `service_url`.
    async fn send_share(
        &self,
        receiver: &str,
        service_url: &str,
    ) -> Result<ShareMessage, ClientError>;

    /// Pending share requests addressed to `username`.
    async fn list_messages(&self, username: &str) -> Result<Vec<ShareMessage>, ClientError>;

    /// Accept the pending request for `service_url`. Returns the copied entry.
    async fn accept_message(
        &self,
        service_url: &str,
        receiver: &str,
    ) -> Result<CredentialEntry, ClientError>;

    /// Reject the pending request for `service_url`.
    async fn reject_message(&self, service_url: &str) -> Result<(), ClientError>;
}
