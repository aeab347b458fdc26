//! A recording in-memory [`PasswordApi`] for view and poller tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::PasswordApi;
use crate::error::ClientError;
use crate::types::{CredentialEntry, ShareMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListPasswords,
    AddPassword { url: String, password: String },
    UpdatePassword { url: String, password: String },
    DeletePassword(String),
    SendShare { receiver: String, service_url: String },
    ListMessages(String),
    Accept { service_url: String, receiver: String },
    Reject(String),
}

#[derive(Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Call>>,
    passwords: Mutex<Vec<CredentialEntry>>,
    inbox: Mutex<Vec<ShareMessage>>,
    failing: AtomicBool,
}

impl RecordingApi {
    /// Every call fails with a 503.
    pub fn failing() -> Self {
        let api = Self::default();
        api.set_failing(true);
        api
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn push_message(&self, sender: &str, receiver: &str, service_url: &str) {
        self.inbox.lock().unwrap().push(ShareMessage {
            sender_user_name: sender.to_owned(),
            receiver_user_name: receiver.to_owned(),
            service_url: service_url.to_owned(),
            created_at: String::new(),
        });
    }

    pub fn clear_messages(&self) {
        self.inbox.lock().unwrap().clear();
    }

    fn record(&self, call: Call) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status_code: 503,
                message: "unavailable".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PasswordApi for RecordingApi {
    async fn list_passwords(&self) -> Result<Vec<CredentialEntry>, ClientError> {
        self.record(Call::ListPasswords)?;
        Ok(self.passwords.lock().unwrap().clone())
    }

    async fn add_password(&self, entry: &CredentialEntry) -> Result<CredentialEntry, ClientError> {
        self.record(Call::AddPassword {
            url: entry.url.clone(),
            password: entry.password.clone(),
        })?;
        self.passwords.lock().unwrap().push(entry.clone());
        Ok(entry.clone())
    }

    async fn update_password(
        &self,
        url: &str,
        password: &str,
        last_updated: &str,
    ) -> Result<CredentialEntry, ClientError> {
        self.record(Call::UpdatePassword {
            url: url.to_owned(),
            password: password.to_owned(),
        })?;
        Ok(CredentialEntry {
            url: url.to_owned(),
            password: password.to_owned(),
            last_updated: last_updated.to_owned(),
        })
    }

    async fn delete_password(&self, url: &str) -> Result<(), ClientError> {
        self.record(Call::DeletePassword(url.to_owned()))?;
        self.passwords.lock().unwrap().retain(|p| p.url != url);
        Ok(())
    }

    async fn send_share(
        &self,
        receiver: &str,
        service_url: &str,
    ) -> Result<ShareMessage, ClientError> {
        self.record(Call::SendShare {
            receiver: receiver.to_owned(),
            service_url: service_url.to_owned(),
        })?;
        Ok(ShareMessage {
            sender_user_name: "alice".to_owned(),
            receiver_user_name: receiver.to_owned(),
            service_url: service_url.to_owned(),
            created_at: String::new(),
        })
    }

    async fn list_messages(&self, username: &str) -> Result<Vec<ShareMessage>, ClientError> {
        self.record(Call::ListMessages(username.to_owned()))?;
        Ok(self.inbox.lock().unwrap().clone())
    }

    async fn accept_message(
        &self,
        service_url: &str,
        receiver: &str,
    ) -> Result<CredentialEntry, ClientError> {
        self.record(Call::Accept {
            service_url: service_url.to_owned(),
            receiver: receiver.to_owned(),
        })?;
        self.inbox
            .lock()
            .unwrap()
            .retain(|m| m.service_url != service_url);
        Ok(CredentialEntry {
            url: service_url.to_owned(),
            password: "shared".to_owned(),
            last_updated: String::new(),
        })
    }

    async fn reject_message(&self, service_url: &str) -> Result<(), ClientError> {
        self.record(Call::Reject(service_url.to_owned()))?;
        self.inbox
            .lock()
            .unwrap()
            .retain(|m| m.service_url != service_url);
        Ok(())
    }
}
