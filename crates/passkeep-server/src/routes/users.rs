//! User routes: `/api/users/*`
//!
//! Registration and login are public; everything else needs a session.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use passkeep_core::user::{NewUser, UserRecord};

use crate::error::AppError;
use crate::middleware::AuthContext;
use crate::state::AppState;

/// Routes that require a session.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/", get(list_users))
        .route("/api/users/logout", post(logout))
        .route("/api/users/{username}", get(get_user))
}

/// Registration and login. Unauthenticated.
pub fn login_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
}

// ── Request / Response types ─────────────────────────────────────────

/// Request body for register and login.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Public view of a user. The password hash never leaves the server.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            username: record.username,
            created_at: record.created_at,
        }
    }
}

/// Response body for `POST /api/users/login`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token. Shown once.
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let Json(body) = body?;
    let record = state
        .users
        .insert_user(NewUser {
            username: body.username,
            password: body.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(body) = body?;
    let user = state
        .users
        .verify_credentials(&body.username, &body.password)
        .await?;
    let (token, session) = state.sessions.create(&user.username).await?;

    Ok(Json(LoginResponse {
        token,
        username: session.username,
        expires_at: session.expires_at,
    }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<StatusCode, AppError> {
    state.sessions.revoke(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.get_all_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    state
        .users
        .get_user_by_username(&username)
        .await?
        .map(|u| Json(u.into()))
        .ok_or_else(|| AppError::NotFound(format!("user '{username}' not found")))
}
