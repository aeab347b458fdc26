//! Share-message store — the inbox of pending share requests.
//!
//! A share message asks the receiver to accept a copy of one of the sender's
//! credential entries. Messages are keyed `messages/{receiver}/{serviceUrl}`,
//! so a receiver has at most one pending request per URL and a newer request
//! replaces an older one.
//!
//! Lifecycle:
//!
//! ```text
//! send ──► pending ──accept──► credential copied to receiver, message removed
//!                  └─reject──► message removed
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use passkeep_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collection::Collection;
use crate::credential::{CredentialEntry, CredentialStore};
use crate::error::{CredentialError, MessageError};
use crate::user::UserStore;

/// A pending share request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMessage {
    pub sender_user_name: String,
    pub receiver_user_name: String,
    pub service_url: String,
    pub created_at: DateTime<Utc>,
}

/// Send, list, accept, and reject share requests.
#[derive(Debug, Clone)]
pub struct MessageStore {
    messages: Collection<ShareMessage>,
    users: Arc<UserStore>,
    credentials: Arc<CredentialStore>,
}

impl MessageStore {
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        users: Arc<UserStore>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        Self {
            messages: Collection::new(storage, "messages"),
            users,
            credentials,
        }
    }

    /// Record a request from `sender` to share their entry for `service_url`
    /// with `receiver`.
    ///
    /// # Errors
    ///
    /// - [`MessageError::InvalidRequest`] for blank fields.
    /// - [`MessageError::SelfShare`] if sender and receiver are the same.
    /// - [`MessageError::ReceiverNotFound`] for an unknown receiver.
    /// - [`MessageError::Credential`] (`NotFound`) if the sender has no entry
    ///   for `service_url`.
    pub async fn send(
        &self,
        sender: &str,
        receiver: &str,
        service_url: &str,
    ) -> Result<ShareMessage, MessageError> {
        let receiver = receiver.trim();
        let service_url = service_url.trim();
        if receiver.is_empty() {
            return Err(MessageError::InvalidRequest {
                reason: "receiver username must not be empty".to_owned(),
            });
        }
        if service_url.is_empty() {
            return Err(MessageError::InvalidRequest {
                reason: "service url must not be empty".to_owned(),
            });
        }
        if receiver == sender {
            return Err(MessageError::SelfShare);
        }
        if self.users.get_user_by_username(receiver).await?.is_none() {
            return Err(MessageError::ReceiverNotFound {
                username: receiver.to_owned(),
            });
        }
        if self.credentials.get(sender, service_url).await?.is_none() {
            return Err(CredentialError::NotFound {
                url: service_url.to_owned(),
            }
            .into());
        }

        let message = ShareMessage {
            sender_user_name: sender.to_owned(),
            receiver_user_name: receiver.to_owned(),
            service_url: service_url.to_owned(),
            created_at: Utc::now(),
        };
        self.messages.put(&[receiver, service_url], &message).await?;
        info!(sender, receiver, service_url, "share request sent");
        Ok(message)
    }

    /// Every pending message addressed to `receiver`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Document`] on storage failure.
    pub async fn list_for(&self, receiver: &str) -> Result<Vec<ShareMessage>, MessageError> {
        Ok(self.messages.list(&[receiver]).await?)
    }

    /// Accept a pending request: copy the sender's current entry into the
    /// receiver's entries (replacing any entry for the same URL) and remove
    /// the message.
    ///
    /// # Errors
    ///
    /// - [`MessageError::NotFound`] if nothing is pending for this URL.
    /// - [`MessageError::Credential`] (`NotFound`) if the sender has since
    ///   deleted the entry. The message is left in place.
    pub async fn accept(
        &self,
        receiver: &str,
        service_url: &str,
    ) -> Result<CredentialEntry, MessageError> {
        let message = self.pending(receiver, service_url).await?;

        let shared = self
            .credentials
            .get(&message.sender_user_name, service_url)
            .await?
            .ok_or_else(|| CredentialError::NotFound {
                url: service_url.to_owned(),
            })?;

        let copied = self.credentials.upsert(receiver, shared).await?;
        self.messages.delete(&[receiver, service_url]).await?;

        info!(
            sender = %message.sender_user_name,
            receiver,
            service_url,
            "share request accepted"
        );
        Ok(copied)
    }

    /// Reject (delete) a pending request.
    ///
    /// # Errors
    ///
    /// - [`MessageError::NotFound`] if nothing is pending for this URL.
    /// - [`MessageError::Document`] on storage failure.
    pub async fn reject(&self, receiver: &str, service_url: &str) -> Result<(), MessageError> {
        if !self.messages.delete(&[receiver, service_url]).await? {
            return Err(MessageError::NotFound {
                service_url: service_url.to_owned(),
            });
        }
        info!(receiver, service_url, "share request rejected");
        Ok(())
    }

    async fn pending(&self, receiver: &str, service_url: &str) -> Result<ShareMessage, MessageError> {
        self.messages
            .get(&[receiver, service_url])
            .await?
            .ok_or_else(|| MessageError::NotFound {
                service_url: service_url.to_owned(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::user::NewUser;
    use passkeep_storage::MemoryBackend;

    struct Fixture {
        users: Arc<UserStore>,
        credentials: Arc<CredentialStore>,
        messages: MessageStore,
    }

    async fn fixture() -> Fixture {
        let storage: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
        let users = Arc::new(UserStore::new(Arc::clone(&storage)));
        let credentials = Arc::new(CredentialStore::new(Arc::clone(&storage)));
        let messages = MessageStore::new(storage, Arc::clone(&users), Arc::clone(&credentials));

        for name in ["alice", "bob"] {
            users
                .insert_user(NewUser {
                    username: name.to_owned(),
                    password: "password123".to_owned(),
                })
                .await
                .unwrap();
        }
        credentials
            .add(
                "alice",
                CredentialEntry {
                    url: "https://mail.example".to_owned(),
                    password: "alice-mail".to_owned(),
                    last_updated: "yesterday".to_owned(),
                },
            )
            .await
            .unwrap();

        Fixture {
            users,
            credentials,
            messages,
        }
    }

    #[tokio::test]
    async fn send_then_list_for_receiver() {
        let f = fixture().await;
        f.messages.send("alice", "bob", "https://mail.example").await.unwrap();

        let inbox = f.messages.list_for("bob").await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].sender_user_name, "alice");
        assert_eq!(inbox[0].service_url, "https://mail.example");
        assert!(f.messages.list_for("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_validates_parties_and_entry() {
        let f = fixture().await;
        assert!(matches!(
            f.messages.send("alice", "alice", "https://mail.example").await,
            Err(MessageError::SelfShare)
        ));
        assert!(matches!(
            f.messages.send("alice", "", "https://mail.example").await,
            Err(MessageError::InvalidRequest { .. })
        ));
        assert!(matches!(
            f.messages.send("alice", "carol", "https://mail.example").await,
            Err(MessageError::ReceiverNotFound { .. })
        ));
        assert!(matches!(
            f.messages.send("alice", "bob", "https://bank.example").await,
            Err(MessageError::Credential(CredentialError::NotFound { .. }))
        ));
        assert!(f.messages.list_for("bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn accept_copies_entry_and_clears_message() {
        let f = fixture().await;
        f.messages.send("alice", "bob", "https://mail.example").await.unwrap();

        let copied = f.messages.accept("bob", "https://mail.example").await.unwrap();
        assert_eq!(copied.password, "alice-mail");

        let bob = f.credentials.list("bob").await.unwrap();
        assert_eq!(bob, vec![copied]);
        assert!(f.messages.list_for("bob").await.unwrap().is_empty());
        // The sender keeps their entry.
        assert_eq!(f.credentials.list("alice").await.unwrap().len(), 1);
        assert!(f.users.get_user_by_username("bob").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn accept_after_sender_deleted_entry_keeps_message() {
        let f = fixture().await;
        f.messages.send("alice", "bob", "https://mail.example").await.unwrap();
        f.credentials.delete("alice", "https://mail.example").await.unwrap();

        let err = f.messages.accept("bob", "https://mail.example").await.unwrap_err();
        assert!(matches!(err, MessageError::Credential(CredentialError::NotFound { .. })));
        assert_eq!(f.messages.list_for("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reject_removes_only_that_message() {
        let f = fixture().await;
        f.messages.send("alice", "bob", "https://mail.example").await.unwrap();

        f.messages.reject("bob", "https://mail.example").await.unwrap();
        assert!(f.messages.list_for("bob").await.unwrap().is_empty());
        assert!(f.credentials.list("bob").await.unwrap().is_empty());
        assert!(matches!(
            f.messages.reject("bob", "https://mail.example").await,
            Err(MessageError::NotFound { .. })
        ));
    }
}
