//! Session store — bearer tokens that identify the context user.
//!
//! Tokens are UUID v4 values returned once at login. Only `SHA-256(token)`
//! is persisted (`sessions/{hash}`), so a storage dump cannot be replayed as
//! a login. Sessions carry a fixed TTL; [`SessionStore::purge_expired`] is
//! driven by a background sweeper in the server.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use passkeep_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::collection::Collection;
use crate::error::SessionError;

/// A persisted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Hex-encoded SHA-256 of the bearer token. Also the storage key.
    pub token_hash: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Creates, resolves, and revokes sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Collection<Session>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, ttl: Duration) -> Self {
        Self {
            sessions: Collection::new(storage, "sessions"),
            ttl,
        }
    }

    /// Open a session for `username`.
    ///
    /// Returns the plaintext token (never stored) and the session record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TtlOverflow`] if the expiry cannot be
    /// represented, or [`SessionError::Document`] if storage fails.
    pub async fn create(&self, username: &str) -> Result<(String, Session), SessionError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(SessionError::TtlOverflow)?;
        let token = uuid::Uuid::new_v4().to_string();
        let session = Session {
            token_hash: hash_token(&token),
            username: username.to_owned(),
            created_at: now,
            expires_at,
        };
        self.sessions.put(&[&session.token_hash], &session).await?;
        info!(username, "session created");
        Ok((token, session))
    }

    /// Resolve a plaintext token to its live session.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotFound`] for an unknown token.
    /// - [`SessionError::Expired`] once the TTL has passed.
    /// - [`SessionError::Document`] if storage fails.
    pub async fn lookup(&self, token: &str) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .get(&[&hash_token(token)])
            .await?
            .ok_or(SessionError::NotFound)?;

        if session.is_expired_at(Utc::now()) {
            return Err(SessionError::Expired {
                expired_at: session.expires_at.to_rfc3339(),
            });
        }
        Ok(session)
    }

    /// Revoke the session for a plaintext token. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Document`] if storage fails.
    pub async fn revoke(&self, token: &str) -> Result<(), SessionError> {
        if self.sessions.delete(&[&hash_token(token)]).await? {
            debug!("session revoked");
        }
        Ok(())
    }

    /// Delete every session that expired at or before `now`. Returns how many
    /// were removed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Document`] if storage fails.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, SessionError> {
        let mut removed = 0usize;
        for session in self.sessions.list(&[]).await? {
            if session.is_expired_at(now) && self.sessions.delete(&[&session.token_hash]).await? {
                removed = removed.saturating_add(1);
            }
        }
        Ok(removed)
    }
}

/// Hash a plaintext token with SHA-256, hex-encoded.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
