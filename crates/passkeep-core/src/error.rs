//! Error types for `passkeep-core`.
//!
//! Each store has its own error enum so the HTTP layer can map every variant
//! to a distinct status. Errors never carry password material, only
//! usernames, URLs, and reasons.

use passkeep_storage::StorageError;

/// Errors from the document collection layer.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The underlying storage backend failed.
    #[error("document storage error: {0}")]
    Storage(#[from] StorageError),

    /// A document could not be encoded as JSON.
    #[error("failed to serialize document '{key}': {reason}")]
    Serialize { key: String, reason: String },

    /// A stored document could not be decoded.
    #[error("failed to deserialize document '{key}': {reason}")]
    Deserialize { key: String, reason: String },
}

/// Errors from the user store.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// The username fails the naming rules.
    #[error("invalid username: {reason}")]
    InvalidUsername { reason: String },

    /// The registration password fails the length rules.
    #[error("invalid password: {reason}")]
    InvalidPassword { reason: String },

    /// A user with this username is already registered.
    #[error("user '{username}' already exists")]
    AlreadyExists { username: String },

    /// Login failed. Deliberately does not say which half was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Argon2 hashing failed.
    #[error("password hashing failed: {reason}")]
    Hashing { reason: String },

    /// The document layer returned an error.
    #[error("user store error: {0}")]
    Document(#[from] DocumentError),
}

/// Errors from the credential (password entry) store.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// The entry's URL is empty or otherwise unusable.
    #[error("invalid url: {reason}")]
    InvalidUrl { reason: String },

    /// The entry's password is empty.
    #[error("invalid password: {reason}")]
    InvalidPassword { reason: String },

    /// The owner already has an entry for this URL.
    #[error("a password for '{url}' already exists")]
    AlreadyExists { url: String },

    /// The owner has no entry for this URL.
    #[error("no password stored for '{url}'")]
    NotFound { url: String },

    /// The document layer returned an error.
    #[error("credential store error: {0}")]
    Document(#[from] DocumentError),
}

/// Errors from the share-message store.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// A required field of the share request is missing or malformed.
    #[error("invalid share request: {reason}")]
    InvalidRequest { reason: String },

    /// The sender tried to share with themselves.
    #[error("cannot share a password with yourself")]
    SelfShare,

    /// The receiving user is not registered.
    #[error("user '{username}' not found")]
    ReceiverNotFound { username: String },

    /// No pending message for this receiver and URL.
    #[error("no pending share request for '{service_url}'")]
    NotFound { service_url: String },

    /// The credential store returned an error (e.g. the shared entry is gone).
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The user store returned an error.
    #[error(transparent)]
    User(#[from] UserError),

    /// The document layer returned an error.
    #[error("message store error: {0}")]
    Document(#[from] DocumentError),
}

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for this token.
    #[error("session not found")]
    NotFound,

    /// The session has expired.
    #[error("session expired at {expired_at}")]
    Expired { expired_at: String },

    /// The configured TTL pushes the expiry past the representable range.
    #[error("session TTL too large to compute an expiry")]
    TtlOverflow,

    /// The document layer returned an error.
    #[error("session store error: {0}")]
    Document(#[from] DocumentError),
}
