//! HTTP error types for the `PassKeep` server.
//!
//! Maps domain errors from `passkeep-core` into HTTP responses. Every error
//! variant produces a JSON body with a machine-readable `error` field and a
//! human-readable `message`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use passkeep_core::error::{CredentialError, MessageError, SessionError, UserError};

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Missing, unknown, or expired session token, or a failed login.
    Unauthorized(String),
    /// Authenticated, but acting on another user's data.
    Forbidden(String),
    /// Requested resource not found.
    NotFound(String),
    /// Client sent invalid input.
    BadRequest(String),
    /// The resource already exists.
    Conflict(String),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::Internal(detail) => {
                error!(error = %detail, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::InvalidUsername { .. } | UserError::InvalidPassword { .. } => {
                Self::BadRequest(err.to_string())
            }
            UserError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            UserError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            UserError::Hashing { .. } | UserError::Document(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidUrl { .. } | CredentialError::InvalidPassword { .. } => {
                Self::BadRequest(err.to_string())
            }
            CredentialError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            CredentialError::NotFound { .. } => Self::NotFound(err.to_string()),
            CredentialError::Document(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<MessageError> for AppError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::InvalidRequest { .. } | MessageError::SelfShare => {
                Self::BadRequest(err.to_string())
            }
            MessageError::ReceiverNotFound { .. } | MessageError::NotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            MessageError::Credential(inner) => inner.into(),
            MessageError::User(inner) => inner.into(),
            MessageError::Document(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => Self::Unauthorized("invalid session token".to_owned()),
            SessionError::Expired { .. } => Self::Unauthorized(err.to_string()),
            SessionError::TtlOverflow | SessionError::Document(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use passkeep_core::error::DocumentError;
    use passkeep_storage::StorageError;

    fn status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status(UserError::AlreadyExists {
                username: "a".to_owned()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(UserError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(CredentialError::NotFound { url: "u".to_owned() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(MessageError::SelfShare), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(MessageError::Credential(CredentialError::AlreadyExists {
                url: "u".to_owned()
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(status(SessionError::NotFound), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn internal_errors_are_redacted() {
        let err = CredentialError::Document(DocumentError::Storage(StorageError::Read {
            key: "passwords/alice/site".to_owned(),
            reason: "disk on fire at /secret/path".to_owned(),
        }));
        let resp = AppError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "internal_error");
        assert!(!body["message"].as_str().unwrap().contains("/secret/path"));
    }
}
