//! User store.
//!
//! Users are keyed by username (`users/{username}`), which makes the key
//! itself the uniqueness constraint. Login passwords are hashed with
//! Argon2id before they reach storage; the PHC hash string is the only
//! password material ever persisted.

use std::fmt;
use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core};
use chrono::{DateTime, Utc};
use passkeep_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::collection::Collection;
use crate::error::UserError;

/// Maximum username length.
pub const MAX_USERNAME_LEN: usize = 64;

/// Accepted registration password lengths.
pub const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 8..=128;

/// A persisted user.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    /// Argon2id hash in PHC string format.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Registration input.
pub struct NewUser {
    pub username: String,
    pub password: String,
}

/// Insert, list, and look up users.
#[derive(Debug, Clone)]
pub struct UserStore {
    users: Collection<UserRecord>,
}

impl UserStore {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            users: Collection::new(storage, "users"),
        }
    }

    /// Create and persist one user.
    ///
    /// # Errors
    ///
    /// - [`UserError::InvalidUsername`] / [`UserError::InvalidPassword`] on
    ///   bad input.
    /// - [`UserError::AlreadyExists`] if the username is taken.
    /// - [`UserError::Hashing`] / [`UserError::Document`] on internal failure.
    pub async fn insert_user(&self, new_user: NewUser) -> Result<UserRecord, UserError> {
        validate_username(&new_user.username)?;
        validate_password(&new_user.password)?;

        if self.users.exists(&[&new_user.username]).await? {
            return Err(UserError::AlreadyExists {
                username: new_user.username,
            });
        }

        let password_hash = hash_password(new_user.password).await?;
        let record = UserRecord {
            username: new_user.username,
            password_hash,
            created_at: Utc::now(),
        };

        if !self.users.insert(&[&record.username], &record).await? {
            return Err(UserError::AlreadyExists {
                username: record.username,
            });
        }

        info!(username = %record.username, "user registered");
        Ok(record)
    }

    /// Return every registered user, ordered by username.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Document`] on storage failure.
    pub async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserError> {
        Ok(self.users.list(&[]).await?)
    }

    /// Look up one user. `Ok(None)` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Document`] on storage failure.
    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserError> {
        Ok(self.users.get(&[username]).await?)
    }

    /// Check a username/password pair and return the user on success.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] for an unknown user or a
    /// wrong password, and [`UserError::Document`] on storage failure.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserRecord, UserError> {
        let Some(record) = self.get_user_by_username(username).await? else {
            return Err(UserError::InvalidCredentials);
        };

        let hash = record.password_hash.clone();
        let password = password.to_owned();
        let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| UserError::Hashing {
                reason: format!("verification task panicked: {e}"),
            })?;

        if ok {
            Ok(record)
        } else {
            Err(UserError::InvalidCredentials)
        }
    }
}

/// Check a username against the naming rules: 1–64 characters of ASCII
/// alphanumerics, `_`, `-`, and `.`.
///
/// # Errors
///
/// Returns [`UserError::InvalidUsername`] describing the first rule broken.
pub fn validate_username(username: &str) -> Result<(), UserError> {
    let invalid = |reason: &str| UserError::InvalidUsername {
        reason: reason.to_owned(),
    };

    if username.trim().is_empty() {
        return Err(invalid("username must not be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(invalid("username must be at most 64 characters"));
    }
    if !username
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
    {
        return Err(invalid(
            "username may only contain alphanumeric characters, '_', '-', and '.'",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserError> {
    let len = password.chars().count();
    if PASSWORD_LEN.contains(&len) {
        Ok(())
    } else {
        Err(UserError::InvalidPassword {
            reason: format!(
                "password must be between {} and {} characters",
                PASSWORD_LEN.start(),
                PASSWORD_LEN.end()
            ),
        })
    }
}

async fn hash_password(password: String) -> Result<String, UserError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::Hashing {
                reason: e.to_string(),
            })
    })
    .await
    .map_err(|e| UserError::Hashing {
        reason: format!("hashing task panicked: {e}"),
    })?
}

fn verify_password(password: &str, phc_hash: &str) -> bool {
    PasswordHash::new(phc_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
