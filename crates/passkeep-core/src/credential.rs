//! Credential store — the per-user list of saved website passwords.
//!
//! Entries are keyed `passwords/{owner}/{url}`, so an owner holds at most
//! one entry per URL. Concurrent writers to the same entry resolve as
//! last-write-wins.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use passkeep_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collection::Collection;
use crate::error::CredentialError;

/// A stored `(url, password, lastUpdated)` triple.
///
/// `last_updated` is an opaque display string chosen by the client; the
/// server fills in an RFC 3339 timestamp when the client leaves it empty.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    pub url: String,
    pub password: String,
    #[serde(default)]
    pub last_updated: String,
}

impl fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("url", &self.url)
            .field("password", &"[REDACTED]")
            .field("last_updated", &self.last_updated)
            .finish()
    }
}

/// Per-user credential CRUD.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    entries: Collection<CredentialEntry>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            entries: Collection::new(storage, "passwords"),
        }
    }

    /// Store a new entry for `owner`.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::InvalidUrl`] / [`CredentialError::InvalidPassword`]
    ///   for blank fields.
    /// - [`CredentialError::AlreadyExists`] if `owner` already saved this URL.
    /// - [`CredentialError::Document`] on storage failure.
    pub async fn add(
        &self,
        owner: &str,
        entry: CredentialEntry,
    ) -> Result<CredentialEntry, CredentialError> {
        let entry = normalize(entry)?;
        if !self.entries.insert(&[owner, &entry.url], &entry).await? {
            return Err(CredentialError::AlreadyExists { url: entry.url });
        }
        info!(owner, url = %entry.url, "password stored");
        Ok(entry)
    }

    /// All entries for `owner`, ordered by URL key.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Document`] on storage failure.
    pub async fn list(&self, owner: &str) -> Result<Vec<CredentialEntry>, CredentialError> {
        Ok(self.entries.list(&[owner]).await?)
    }

    /// Fetch a single entry.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Document`] on storage failure.
    pub async fn get(
        &self,
        owner: &str,
        url: &str,
    ) -> Result<Option<CredentialEntry>, CredentialError> {
        Ok(self.entries.get(&[owner, url]).await?)
    }

    /// Replace the password of an existing entry.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotFound`] if `owner` has no entry for `url`.
    /// - [`CredentialError::InvalidPassword`] for a blank password.
    /// - [`CredentialError::Document`] on storage failure.
    pub async fn update(
        &self,
        owner: &str,
        url: &str,
        password: String,
        last_updated: String,
    ) -> Result<CredentialEntry, CredentialError> {
        if !self.entries.exists(&[owner, url]).await? {
            return Err(CredentialError::NotFound {
                url: url.to_owned(),
            });
        }
        let entry = normalize(CredentialEntry {
            url: url.to_owned(),
            password,
            last_updated,
        })?;
        self.entries.put(&[owner, url], &entry).await?;
        info!(owner, url, "password updated");
        Ok(entry)
    }

    /// Write an entry whether or not one exists. Used when accepting a share.
    ///
    /// # Errors
    ///
    /// Same validation and storage errors as [`add`](Self::add).
    pub async fn upsert(
        &self,
        owner: &str,
        entry: CredentialEntry,
    ) -> Result<CredentialEntry, CredentialError> {
        let entry = normalize(entry)?;
        self.entries.put(&[owner, &entry.url], &entry).await?;
        Ok(entry)
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::NotFound`] if there was nothing to delete.
    /// - [`CredentialError::Document`] on storage failure.
    pub async fn delete(&self, owner: &str, url: &str) -> Result<(), CredentialError> {
        if !self.entries.delete(&[owner, url]).await? {
            return Err(CredentialError::NotFound {
                url: url.to_owned(),
            });
        }
        info!(owner, url, "password deleted");
        Ok(())
    }
}

fn normalize(mut entry: CredentialEntry) -> Result<CredentialEntry, CredentialError> {
    let url = entry.url.trim();
    if url.is_empty() {
        return Err(CredentialError::InvalidUrl {
            reason: "url must not be empty".to_owned(),
        });
    }
    if url.contains('\0') {
        return Err(CredentialError::InvalidUrl {
            reason: "null bytes are not allowed in urls".to_owned(),
        });
    }
    entry.url = url.to_owned();

    if entry.password.trim().is_empty() {
        return Err(CredentialError::InvalidPassword {
            reason: "password must not be empty".to_owned(),
        });
    }

    if entry.last_updated.trim().is_empty() {
        entry.last_updated = Utc::now().to_rfc3339();
    }
    Ok(entry)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passkeep_storage::MemoryBackend;

    fn store() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryBackend::new()))
    }

    fn entry(url: &str, password: &str) -> CredentialEntry {
        CredentialEntry {
            url: url.to_owned(),
            password: password.to_owned(),
            last_updated: "1/2/2024, 10:00:00 AM".to_owned(),
        }
    }

    #[tokio::test]
    async fn add_and_list_per_owner() {
        let creds = store();
        creds.add("alice", entry("https://a.example/login", "pw-a")).await.unwrap();
        creds.add("alice", entry("https://b.example", "pw-b")).await.unwrap();
        creds.add("bob", entry("https://a.example/login", "pw-bob")).await.unwrap();

        let alice = creds.list("alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(alice[0].url, "https://a.example/login");
        assert_eq!(alice[0].password, "pw-a");

        let bob = creds.list("bob").await.unwrap();
        assert_eq!(bob, vec![entry("https://a.example/login", "pw-bob")]);
    }

    #[tokio::test]
    async fn duplicate_url_conflicts() {
        let creds = store();
        creds.add("alice", entry("site", "one")).await.unwrap();
        let err = creds.add("alice", entry("site", "two")).await.unwrap_err();
        assert!(matches!(err, CredentialError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn blank_fields_rejected() {
        let creds = store();
        assert!(matches!(
            creds.add("alice", entry("   ", "pw")).await,
            Err(CredentialError::InvalidUrl { .. })
        ));
        assert!(matches!(
            creds.add("alice", entry("site", "")).await,
            Err(CredentialError::InvalidPassword { .. })
        ));
        assert!(creds.list("alice").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_timestamp_is_filled() {
        let creds = store();
        let stored = creds
            .add(
                "alice",
                CredentialEntry {
                    url: "site".to_owned(),
                    password: "pw".to_owned(),
                    last_updated: String::new(),
                },
            )
            .await
            .unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&stored.last_updated).is_ok());
    }

    #[tokio::test]
    async fn update_and_delete_require_existing_entry() {
        let creds = store();
        assert!(matches!(
            creds.update("alice", "site", "pw".to_owned(), String::new()).await,
            Err(CredentialError::NotFound { .. })
        ));

        creds.add("alice", entry("site", "old")).await.unwrap();
        let updated = creds
            .update("alice", "site", "new".to_owned(), "later".to_owned())
            .await
            .unwrap();
        assert_eq!(updated.password, "new");
        assert_eq!(creds.get("alice", "site").await.unwrap(), Some(updated));

        creds.delete("alice", "site").await.unwrap();
        assert!(matches!(
            creds.delete("alice", "site").await,
            Err(CredentialError::NotFound { .. })
        ));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = serde_json::to_value(entry("site", "pw")).unwrap();
        assert_eq!(json["lastUpdated"], "1/2/2024, 10:00:00 AM");
        assert!(format!("{:?}", entry("site", "hunter2")).contains("REDACTED"));
    }
}
