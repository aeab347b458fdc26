//! Request and response types for the `PassKeep` API.

use serde::{Deserialize, Serialize};

/// A stored `(url, password, lastUpdated)` triple.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    pub url: String,
    pub password: String,
    #[serde(default)]
    pub last_updated: String,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("url", &self.url)
            .field("password", &"[REDACTED]")
            .field("last_updated", &self.last_updated)
            .finish()
    }
}

/// A pending share request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMessage {
    pub sender_user_name: String,
    pub receiver_user_name: String,
    pub service_url: String,
    #[serde(default)]
    pub created_at: String,
}

/// Public view of a registered user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub created_at: String,
}

/// Response from `POST /api/users/login`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub expires_at: String,
}

/// Response from `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub message: Option<String>,
}
