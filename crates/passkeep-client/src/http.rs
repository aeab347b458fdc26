//! HTTP implementation of the `PassKeep` API.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::api::PasswordApi;
use crate::error::ClientError;
use crate::types::{
    ApiErrorBody, CredentialEntry, HealthStatus, LoginResponse, ShareMessage, UserSummary,
};
use crate::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, RETRY_BASE_DELAY};

/// `PassKeep` REST client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    token: Option<String>,
    max_retries: u32,
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a client, filling empty config fields from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for a base URL that is not `http(s)`,
    /// or [`ClientError::Network`] if the HTTP client cannot be built.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(cfg: ClientConfig) -> Result<Self, ClientError> {
        let base_url = first_non_empty(&[
            &cfg.base_url,
            &std::env::var("PASSKEEP_URL").unwrap_or_default(),
            DEFAULT_BASE_URL,
        ])
        .trim_end_matches('/')
        .to_owned();

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "invalid server url '{base_url}', expected http:// or https://"
            )));
        }

        let token = first_non_empty(&[
            &cfg.token,
            &std::env::var("PASSKEEP_TOKEN").unwrap_or_default(),
        ]);

        let timeout = if cfg.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            cfg.timeout
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("passkeep-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            base_url,
            token: (!token.is_empty()).then_some(token),
            max_retries: cfg.max_retries,
            client,
        })
    }

    /// Use `token` for subsequent requests.
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server is up.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.request(Method::GET, "/api/health", None).await
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// [`ClientError::Conflict`] if the username is taken,
    /// [`ClientError::Validation`] if it or the password breaks the rules.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserSummary, ClientError> {
        let body = json!({ "username": username, "password": password });
        self.request(Method::POST, "/api/users/register", Some(body))
            .await
    }

    /// Open a session. The returned token is not stored; pass it to
    /// [`set_token`](Self::set_token).
    ///
    /// # Errors
    ///
    /// [`ClientError::Unauthorized`] for a wrong username or password.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = json!({ "username": username, "password": password });
        self.request(Method::POST, "/api/users/login", Some(body))
            .await
    }

    /// Revoke the current session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        self.request(Method::POST, "/api/users/logout", None).await
    }

    /// Every registered user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_users(&self) -> Result<Vec<UserSummary>, ClientError> {
        self.request(Method::GET, "/api/users/", None).await
    }

    /// Look up one user.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] for an unknown username.
    pub async fn get_user(&self, username: &str) -> Result<UserSummary, ClientError> {
        let path = format!("/api/users/{}", urlencoding::encode(username));
        self.request(Method::GET, &path, None).await
    }

    // --- Private ---

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        // Only reads are safe to repeat.
        let max_retries = if method == Method::GET {
            self.max_retries
        } else {
            0
        };
        let mut last_err = None;

        for attempt in 0..=max_retries {
            let mut req = self.client.request(method.clone(), &url);
            if let Some(token) = &self.token {
                req = req.bearer_auth(token);
            }
            if let Some(b) = &body {
                req = req.json(b);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let text = resp.text().await.map_err(ClientError::Network)?;
                        let text = if text.is_empty() { "null" } else { &text };
                        return serde_json::from_str(text).map_err(ClientError::Json);
                    }

                    let error_text = resp.text().await.unwrap_or_default();
                    let msg = serde_json::from_str::<ApiErrorBody>(&error_text)
                        .ok()
                        .and_then(|b| b.message)
                        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

                    let err = classify(status, msg);
                    if !matches!(err, ClientError::Api { .. }) {
                        return Err(err);
                    }
                    last_err = Some(err);

                    if attempt < max_retries && is_retryable(status) {
                        sleep_with_jitter(attempt).await;
                        continue;
                    }
                }
                Err(e) => {
                    last_err = Some(if e.is_timeout() {
                        ClientError::Timeout
                    } else {
                        ClientError::Network(e)
                    });

                    if attempt < max_retries {
                        debug!(attempt, url = %url, "request failed, retrying");
                        sleep_with_jitter(attempt).await;
                        continue;
                    }
                }
            }

            break;
        }

        Err(last_err.unwrap_or(ClientError::Api {
            status_code: 0,
            message: "unknown error".to_owned(),
        }))
    }
}

#[async_trait]
impl PasswordApi for HttpClient {
    async fn list_passwords(&self) -> Result<Vec<CredentialEntry>, ClientError> {
        self.request(Method::GET, "/api/passwords/", None).await
    }

    async fn add_password(&self, entry: &CredentialEntry) -> Result<CredentialEntry, ClientError> {
        let body = serde_json::to_value(entry)?;
        self.request(Method::POST, "/api/passwords/add", Some(body))
            .await
    }

    async fn update_password(
        &self,
        url: &str,
        password: &str,
        last_updated: &str,
    ) -> Result<CredentialEntry, ClientError> {
        let path = format!("/api/passwords/{}", urlencoding::encode(url));
        let body = json!({ "password": password, "lastUpdated": last_updated });
        self.request(Method::PUT, &path, Some(body)).await
    }

    async fn delete_password(&self, url: &str) -> Result<(), ClientError> {
        let path = format!("/api/passwords/{}", urlencoding::encode(url));
        self.request(Method::DELETE, &path, None).await
    }

    async fn send_share(
        &self,
        receiver: &str,
        service_url: &str,
    ) -> Result<ShareMessage, ClientError> {
        let body = json!({ "receiverUserName": receiver, "serviceUrl": service_url });
        self.request(Method::POST, "/api/messages/", Some(body))
            .await
    }

    async fn list_messages(&self, username: &str) -> Result<Vec<ShareMessage>, ClientError> {
        let path = format!("/api/messages/{}", urlencoding::encode(username));
        self.request(Method::GET, &path, None).await
    }

    async fn accept_message(
        &self,
        service_url: &str,
        receiver: &str,
    ) -> Result<CredentialEntry, ClientError> {
        let body = json!({ "serviceUrl": service_url, "receiverUserName": receiver });
        self.request(Method::POST, "/api/message/accept/", Some(body))
            .await
    }

    async fn reject_message(&self, service_url: &str) -> Result<(), ClientError> {
        let path = format!("/api/message/delete/{}", urlencoding::encode(service_url));
        self.request(Method::DELETE, &path, None).await
    }
}

fn classify(status: StatusCode, message: String) -> ClientError {
    match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        _ => ClientError::Api {
            status_code: status.as_u16(),
            message,
        },
    }
}

fn is_retryable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

async fn sleep_with_jitter(attempt: u32) {
    // RETRY_BASE_DELAY is 500ms and attempts stay small.
    #[allow(clippy::cast_possible_truncation)]
    let base = (RETRY_BASE_DELAY.as_millis() as u64).saturating_mul(2u64.saturating_pow(attempt));
    let jitter = rand::rng().random_range(0..=base / 10 * 3);
    tokio::time::sleep(Duration::from_millis(base.saturating_add(jitter))).await;
}

fn first_non_empty(vals: &[&str]) -> String {
    vals.iter()
        .find(|v| !v.is_empty())
        .map(|v| (*v).to_owned())
        .unwrap_or_default()
}
