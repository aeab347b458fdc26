//! Authentication middleware for `PassKeep`.
//!
//! Extracts the `Authorization: Bearer <token>` header, resolves it against
//! the session store, and injects an [`AuthContext`] naming the context user
//! into the request extensions.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// Authentication context injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The context user every handler acts on behalf of.
    pub username: String,
    /// The plaintext bearer token, kept so logout can revoke it.
    pub token: String,
}

/// Middleware that requires a live session token.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] when the header is missing, malformed,
/// unknown, or expired.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::Unauthorized("missing Authorization: Bearer header".to_owned()))?
        .to_owned();

    let session = state.sessions.lookup(&token).await?;

    req.extensions_mut().insert(AuthContext {
        username: session.username,
        token,
    });
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
