//! `PassKeep` HTTP server.
//!
//! Wires the core stores and a storage backend into an Axum router serving
//! the JSON API under `/api/*`, plus the background session sweeper.

pub mod config;
pub mod error;
pub mod hardening;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod sweeper;
