//! Integration tests for the `passkeep` CLI binary.
//!
//! The binary runs as a subprocess pointed at an address nothing listens on,
//! so only offline commands and client-side validation can succeed.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::process::Command;

fn passkeep_bin() -> String {
    let path = env!("CARGO_BIN_EXE_passkeep");
    assert!(
        Path::new(path).exists(),
        "passkeep binary not found at {path}"
    );
    path.to_owned()
}

/// Helper: run passkeep with args and return (`exit_code`, stdout, stderr).
fn run(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(passkeep_bin())
        .args(args)
        .env("PASSKEEP_URL", "http://127.0.0.1:19999") // Non-existent server
        .env_remove("PASSKEEP_TOKEN")
        .env_remove("PASSKEEP_USER")
        .env_remove("PASSKEEP_PASSWORD")
        .output()
        .expect("failed to execute passkeep");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("passkeep"), "version output: {stdout}");
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("PassKeep CLI"));
    for cmd in ["generate", "add", "share", "inbox", "accept", "reject"] {
        assert!(stdout.contains(cmd), "help should list '{cmd}': {stdout}");
    }
}

// ── Generator ────────────────────────────────────────────────────────

#[test]
fn test_generate_raw_lowercase() {
    let (code, stdout, stderr) = run(&["generate", "--raw", "--lowercase", "--length", "12"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    let password = stdout.trim();
    assert_eq!(password.len(), 12);
    assert!(password.bytes().all(|b| b.is_ascii_lowercase()));
}

#[test]
fn test_generate_default_length_is_8() {
    let (code, stdout, _) = run(&["generate", "--raw", "--digits"]);
    assert_eq!(code, 0);
    let password = stdout.trim();
    assert_eq!(password.len(), 8);
    assert!(password.bytes().all(|b| b.is_ascii_digit()));
}

#[test]
fn test_generate_without_class_fails() {
    let (code, _, stderr) = run(&["generate", "--length", "12"]);
    assert_eq!(code, 1);
    assert!(
        stderr.contains("Please select at least one option"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_generate_length_out_of_range_fails() {
    let (code, _, stderr) = run(&["generate", "--symbols", "--length", "60"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("between 4 and 50"), "stderr: {stderr}");
}

// ── Client-side validation ───────────────────────────────────────────

#[test]
fn test_add_blank_url_is_rejected_locally() {
    let (code, _, stderr) = run(&["add", " ", "--password", "pw"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Please enter a URL"), "stderr: {stderr}");
}

#[test]
fn test_inbox_requires_user() {
    let (code, _, stderr) = run(&["inbox"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no user set"), "stderr: {stderr}");
}

#[test]
fn test_share_to_self_is_rejected_locally() {
    let (code, _, stderr) = run(&["--user", "alice", "share", "https://a.example", "alice"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Enter another user's name"), "stderr: {stderr}");
}

#[test]
fn test_invalid_server_url() {
    let (code, _, stderr) = run(&["--url", "ftp://nowhere", "list"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid server url"), "stderr: {stderr}");
}

// ── Server unreachable ───────────────────────────────────────────────

#[test]
fn test_list_without_server_reports_unreachable() {
    let (code, _, stderr) = run(&["--retries", "0", "list"]);
    assert_eq!(code, 1);
    assert!(
        stderr.contains("could not reach the server"),
        "stderr: {stderr}"
    );
}
