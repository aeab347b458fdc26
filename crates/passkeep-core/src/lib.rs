//! Core library for `PassKeep`.
//!
//! Holds the typed document collections and the four stores the HTTP server
//! is built from: users, credential entries, share messages, and sessions.
//! Everything persists through a [`passkeep_storage::StorageBackend`], so the
//! stores are oblivious to which database sits underneath.

pub mod collection;
pub mod credential;
pub mod error;
pub mod message;
pub mod session;
pub mod user;
