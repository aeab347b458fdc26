//! Shared application state for the `PassKeep` server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use std::sync::Arc;

use passkeep_core::credential::CredentialStore;
use passkeep_core::message::MessageStore;
use passkeep_core::session::SessionStore;
use passkeep_core::user::UserStore;
use passkeep_storage::StorageBackend;

/// Shared application state passed to all HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Registered users.
    pub users: Arc<UserStore>,
    /// Per-user password entries.
    pub credentials: Arc<CredentialStore>,
    /// Pending share requests.
    pub messages: Arc<MessageStore>,
    /// Bearer-token sessions.
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Build every store on top of one storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, session_ttl: chrono::Duration) -> Self {
        let users = Arc::new(UserStore::new(Arc::clone(&storage)));
        let credentials = Arc::new(CredentialStore::new(Arc::clone(&storage)));
        let messages = Arc::new(MessageStore::new(
            Arc::clone(&storage),
            Arc::clone(&users),
            Arc::clone(&credentials),
        ));
        let sessions = Arc::new(SessionStore::new(storage, session_ttl));

        Self {
            users,
            credentials,
            messages,
            sessions,
        }
    }
}
