//! Share-message routes: `/api/messages/*` and `/api/message/*`
//!
//! The singular `/api/message/...` paths are the accept/reject actions on one
//! pending request; the plural paths send requests and read an inbox.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use passkeep_core::credential::CredentialEntry;
use passkeep_core::message::ShareMessage;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::state::AppState;

/// Build the message router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/messages", post(send_message))
        .route("/api/messages/", post(send_message))
        .route("/api/messages/{username}", get(list_messages))
        .route("/api/message/accept", post(accept_message))
        .route("/api/message/accept/", post(accept_message))
        .route("/api/message/delete/{service_url}", delete(reject_message))
}

// ── Request types ────────────────────────────────────────────────────

/// Request body for `POST /api/messages/`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub receiver_user_name: String,
    pub service_url: String,
}

/// Request body for `POST /api/message/accept/`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMessageRequest {
    pub service_url: String,
    pub receiver_user_name: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShareMessage>), AppError> {
    let Json(body) = body?;
    let message = state
        .messages
        .send(&auth.username, &body.receiver_user_name, &body.service_url)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(username): Path<String>,
) -> Result<Json<Vec<ShareMessage>>, AppError> {
    ensure_self(&auth, &username)?;
    Ok(Json(state.messages.list_for(&auth.username).await?))
}

async fn accept_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<AcceptMessageRequest>, JsonRejection>,
) -> Result<Json<CredentialEntry>, AppError> {
    let Json(body) = body?;
    ensure_self(&auth, &body.receiver_user_name)?;
    let copied = state
        .messages
        .accept(&auth.username, &body.service_url)
        .await?;
    Ok(Json(copied))
}

async fn reject_message(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(service_url): Path<String>,
) -> Result<StatusCode, AppError> {
    state.messages.reject(&auth.username, &service_url).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn ensure_self(auth: &AuthContext, username: &str) -> Result<(), AppError> {
    if auth.username == username {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "cannot act on messages addressed to '{username}'"
        )))
    }
}
