//! `HttpClient` and `PasswordManagerView` against a live in-process server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use passkeep_client::{
    ClientConfig, ClientError, HttpClient, PasswordApi, PasswordManagerView, SubmitOutcome,
};
use passkeep_server::routes::build_router;
use passkeep_server::state::AppState;
use passkeep_storage::MemoryBackend;

async fn spawn_server() -> String {
    let state = AppState::new(Arc::new(MemoryBackend::new()), chrono::Duration::hours(1));
    let app = build_router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> HttpClient {
    HttpClient::new(ClientConfig {
        base_url: base_url.to_owned(),
        max_retries: 0,
        ..ClientConfig::default()
    })
    .unwrap()
}

/// Register `username` and return a client holding its session token.
async fn signed_in(base_url: &str, username: &str) -> HttpClient {
    let mut c = client(base_url);
    c.register(username, "correct horse").await.unwrap();
    let login = c.login(username, "correct horse").await.unwrap();
    assert_eq!(login.username, username);
    c.set_token(login.token);
    c
}

#[tokio::test]
async fn health_check() {
    let base = spawn_server().await;
    let health = client(&base).health().await.unwrap();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn account_errors_are_classified() {
    let base = spawn_server().await;
    let alice = signed_in(&base, "alice").await;

    let err = alice.register("alice", "correct horse").await.unwrap_err();
    assert!(matches!(err, ClientError::Conflict(_)));

    let err = alice.login("alice", "wrong password").await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));

    let err = client(&base).list_passwords().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));

    let err = alice.get_user("nobody").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));

    let users = alice.list_users().await.unwrap();
    assert_eq!(users.len(), 1);

    alice.logout().await.unwrap();
    let err = alice.list_passwords().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
}

#[tokio::test]
async fn urls_with_slashes_survive_the_path() {
    let base = spawn_server().await;
    let alice = signed_in(&base, "alice").await;
    let view = PasswordManagerView::new(Arc::new(alice.clone()), "alice");

    view.edit(|s| {
        s.url = "https://mail.example/login?next=/inbox".to_owned();
        s.password = "pw".to_owned();
    })
    .await;
    let outcome = view.submit().await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Stored(_)));
    assert_eq!(view.state().await.passwords.len(), 1);

    view.update_password("https://mail.example/login?next=/inbox", "pw2")
        .await
        .unwrap();
    let stored = alice.list_passwords().await.unwrap();
    assert_eq!(stored[0].password, "pw2");

    view.delete_password("https://mail.example/login?next=/inbox")
        .await
        .unwrap();
    assert!(alice.list_passwords().await.unwrap().is_empty());
}

#[tokio::test]
async fn share_and_accept_between_two_views() {
    let base = spawn_server().await;
    let alice = PasswordManagerView::new(Arc::new(signed_in(&base, "alice").await), "alice");
    let bob_client = Arc::new(signed_in(&base, "bob").await);
    let bob = PasswordManagerView::new(Arc::clone(&bob_client) as Arc<dyn PasswordApi>, "bob");

    alice
        .edit(|s| {
            s.url = "https://bank.example".to_owned();
            s.password = "s3cret".to_owned();
            s.shared_username = "bob".to_owned();
        })
        .await;
    alice.submit().await.unwrap();
    alice.request_share("https://bank.example").await.unwrap();
    assert!(alice.state().await.sharing_request_sent);

    bob.refresh_inbox().await.unwrap();
    let inbox = bob.state().await.messages;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].sender_user_name, "alice");

    bob.accept("https://bank.example").await.unwrap();
    assert!(bob.state().await.messages.is_empty());
    let stored = bob_client.list_passwords().await.unwrap();
    assert_eq!(stored[0].password, "s3cret");
    assert!(bob_client.list_messages("bob").await.unwrap().is_empty());
}

#[tokio::test]
async fn share_with_unknown_user_surfaces_not_found() {
    let base = spawn_server().await;
    let alice = PasswordManagerView::new(Arc::new(signed_in(&base, "alice").await), "alice");
    alice
        .edit(|s| {
            s.url = "site".to_owned();
            s.password = "pw".to_owned();
            s.shared_username = "carol".to_owned();
        })
        .await;
    alice.submit().await.unwrap();

    let err = alice.request_share("site").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    let state = alice.state().await;
    assert!(!state.sharing_request_sent);
    assert_eq!(state.notice, Some(err.notice()));
}

#[tokio::test]
async fn reject_removes_the_request() {
    let base = spawn_server().await;
    let alice = signed_in(&base, "alice").await;
    let bob = signed_in(&base, "bob").await;

    let view = PasswordManagerView::new(Arc::new(alice.clone()), "alice");
    view.edit(|s| {
        s.url = "https://a.example/x/y".to_owned();
        s.password = "pw".to_owned();
    })
    .await;
    view.submit().await.unwrap();
    alice.send_share("bob", "https://a.example/x/y").await.unwrap();

    bob.reject_message("https://a.example/x/y").await.unwrap();
    assert!(bob.list_messages("bob").await.unwrap().is_empty());
    let err = bob.reject_message("https://a.example/x/y").await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}")).health().await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.notice(), "could not reach the server");
}
