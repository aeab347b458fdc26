//! Password routes: `/api/passwords/*`
//!
//! Every handler is scoped to the context user from [`AuthContext`]; there is
//! no way to address another user's entries.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use passkeep_core::credential::CredentialEntry;

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::state::AppState;

/// Build the password router. `{url}` is one percent-encoded segment.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/passwords", get(list_passwords))
        .route("/api/passwords/", get(list_passwords))
        // The static route shadows `{url}` for an entry whose url is "add".
        .route(
            "/api/passwords/add",
            post(add_password)
                .put(update_literal_add)
                .delete(delete_literal_add),
        )
        .route(
            "/api/passwords/{url}",
            put(update_password).delete(delete_password),
        )
}

/// Request body for `PUT /api/passwords/{url}`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub password: String,
    #[serde(default)]
    pub last_updated: String,
}

async fn list_passwords(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<CredentialEntry>>, AppError> {
    Ok(Json(state.credentials.list(&auth.username).await?))
}

async fn add_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<CredentialEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<CredentialEntry>), AppError> {
    let Json(entry) = body?;
    let stored = state.credentials.add(&auth.username, entry).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(url): Path<String>,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<CredentialEntry>, AppError> {
    update_entry(&state, &auth, &url, body).await
}

async fn update_literal_add(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<CredentialEntry>, AppError> {
    update_entry(&state, &auth, "add", body).await
}

async fn delete_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(url): Path<String>,
) -> Result<StatusCode, AppError> {
    state.credentials.delete(&auth.username, &url).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_literal_add(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    state.credentials.delete(&auth.username, "add").await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_entry(
    state: &AppState,
    auth: &AuthContext,
    url: &str,
    body: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<CredentialEntry>, AppError> {
    let Json(body) = body?;
    let updated = state
        .credentials
        .update(&auth.username, url, body.password, body.last_updated)
        .await?;
    Ok(Json(updated))
}
