//! Error types for the `PassKeep` client.

use crate::generator::GeneratorError;

/// All errors that can occur when using the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Missing or unusable configuration.
    #[error("passkeep config error: {0}")]
    Config(String),

    /// Input rejected before or by the server (400).
    #[error("{0}")]
    Validation(String),

    /// No session, or the session was rejected (401/403).
    #[error("passkeep auth error: {0}")]
    Unauthorized(String),

    /// The addressed user, entry, or message does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// The resource already exists (409).
    #[error("{0}")]
    Conflict(String),

    /// Any other non-success status.
    #[error("passkeep API error {status_code}: {message}")]
    Api { status_code: u16, message: String },

    /// Request timed out.
    #[error("passkeep request timed out")]
    Timeout,

    /// Network or HTTP client error.
    #[error("passkeep network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("passkeep json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// The message to show the user for this failure.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Config(msg)
            | Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg) => msg.clone(),
            Self::Unauthorized(_) => "not logged in or session expired, please log in again".to_owned(),
            Self::Api {
                status_code,
                message,
            } => format!("server error ({status_code}): {message}"),
            Self::Timeout => "the server did not respond in time".to_owned(),
            Self::Network(_) => "could not reach the server".to_owned(),
            Self::Json(_) => "unexpected response from the server".to_owned(),
        }
    }
}

impl From<GeneratorError> for ClientError {
    fn from(err: GeneratorError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_distinct_per_kind() {
        let notices = [
            ClientError::Validation("Please enter a URL".to_owned()).notice(),
            ClientError::Unauthorized("invalid session token".to_owned()).notice(),
            ClientError::NotFound("user 'carol' not found".to_owned()).notice(),
            ClientError::Conflict("a password for 'x' already exists".to_owned()).notice(),
            ClientError::Api {
                status_code: 500,
                message: "internal server error".to_owned(),
            }
            .notice(),
            ClientError::Timeout.notice(),
        ];
        for (i, a) in notices.iter().enumerate() {
            for b in &notices[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(notices[0], "Please enter a URL");
    }

    #[test]
    fn generator_errors_become_validation() {
        let err: ClientError = GeneratorError::NoClassSelected.into();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
