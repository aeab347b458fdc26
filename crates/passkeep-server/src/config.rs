//! Server configuration for `PassKeep`.
//!
//! Loaded from `PASSKEEP_*` environment variables with development-friendly
//! defaults.

use std::net::SocketAddr;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8300;

/// Longest accepted session lifetime (366 days). Larger values are clamped.
pub const MAX_SESSION_TTL_SECS: u64 = 366 * 24 * 60 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Session lifetime in seconds.
    pub session_ttl_secs: u64,
    /// Seconds between expired-session sweeps.
    pub session_scan_interval_secs: u64,
    /// Leave core dumps enabled (for debugging only).
    pub allow_core_dumps: bool,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// Single-file redb database.
    Redb { path: String },
    /// `RocksDB` directory.
    RocksDb { path: String },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            storage_backend: StorageBackendType::Memory,
            log_level: "info".to_owned(),
            session_ttl_secs: 12 * 60 * 60,
            session_scan_interval_secs: 60,
            allow_core_dumps: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PASSKEEP_BIND_ADDR` — full bind address (default `127.0.0.1:8300`)
    /// - `PORT` — port to bind on `0.0.0.0` when no bind address is given
    /// - `PASSKEEP_STORAGE` — `memory`, `redb`, or `rocksdb` (default `memory`)
    /// - `PASSKEEP_STORAGE_PATH` — path for persistent backends (default `./data`)
    /// - `PASSKEEP_LOG_LEVEL` — log filter (default `info`)
    /// - `PASSKEEP_SESSION_TTL` — session lifetime in seconds (default `43200`,
    ///   at most [`MAX_SESSION_TTL_SECS`])
    /// - `PASSKEEP_SESSION_SCAN_INTERVAL` — seconds between sweeps (default `60`)
    /// - `PASSKEEP_ALLOW_CORE_DUMPS` — keep core dumps enabled (default `false`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = if let Some(addr) = lookup("PASSKEEP_BIND_ADDR") {
            addr.parse().unwrap_or(defaults.bind_addr)
        } else if let Some(port) = lookup("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(DEFAULT_PORT)))
        } else {
            defaults.bind_addr
        };

        let storage_path = lookup("PASSKEEP_STORAGE_PATH").unwrap_or_else(|| "./data".to_owned());
        let storage_backend = match lookup("PASSKEEP_STORAGE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "redb" => StorageBackendType::Redb {
                path: format!("{}/passkeep.redb", storage_path.trim_end_matches('/')),
            },
            "rocksdb" => StorageBackendType::RocksDb { path: storage_path },
            _ => StorageBackendType::Memory,
        };

        let secs = |name: &str, default: u64| {
            lookup(name)
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        Self {
            bind_addr,
            storage_backend,
            log_level: lookup("PASSKEEP_LOG_LEVEL").unwrap_or(defaults.log_level),
            session_ttl_secs: secs("PASSKEEP_SESSION_TTL", defaults.session_ttl_secs)
                .min(MAX_SESSION_TTL_SECS),
            session_scan_interval_secs: secs(
                "PASSKEEP_SESSION_SCAN_INTERVAL",
                defaults.session_scan_interval_secs,
            ),
            allow_core_dumps: lookup("PASSKEEP_ALLOW_CORE_DUMPS")
                .is_some_and(|v| v == "true" || v == "1"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8300)));
        assert_eq!(cfg.storage_backend, StorageBackendType::Memory);
        assert_eq!(cfg.session_ttl_secs, 43_200);
        assert_eq!(cfg.session_scan_interval_secs, 60);
        assert!(!cfg.allow_core_dumps);
    }

    #[test]
    fn bind_addr_beats_port() {
        let cfg = config(&[("PASSKEEP_BIND_ADDR", "10.0.0.1:9000"), ("PORT", "7000")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([10, 0, 0, 1], 9000)));

        let cfg = config(&[("PORT", "7000")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([0, 0, 0, 0], 7000)));
    }

    #[test]
    fn storage_selection() {
        let cfg = config(&[("PASSKEEP_STORAGE", "REDB"), ("PASSKEEP_STORAGE_PATH", "/var/lib/pk/")]);
        assert_eq!(
            cfg.storage_backend,
            StorageBackendType::Redb {
                path: "/var/lib/pk/passkeep.redb".to_owned()
            }
        );

        let cfg = config(&[("PASSKEEP_STORAGE", "rocksdb")]);
        assert_eq!(
            cfg.storage_backend,
            StorageBackendType::RocksDb {
                path: "./data".to_owned()
            }
        );
    }

    #[test]
    fn zero_or_garbage_intervals_fall_back() {
        let cfg = config(&[
            ("PASSKEEP_SESSION_TTL", "0"),
            ("PASSKEEP_SESSION_SCAN_INTERVAL", "soon"),
        ]);
        assert_eq!(cfg.session_ttl_secs, 43_200);
        assert_eq!(cfg.session_scan_interval_secs, 60);
    }

    #[test]
    fn huge_session_ttl_is_clamped() {
        let cfg = config(&[("PASSKEEP_SESSION_TTL", "10000000000000")]);
        assert_eq!(cfg.session_ttl_secs, MAX_SESSION_TTL_SECS);
        let ttl = chrono::TimeDelta::try_seconds(i64::try_from(cfg.session_ttl_secs).unwrap());
        assert!(ttl.is_some());

        let cfg = config(&[("PASSKEEP_SESSION_TTL", "3600")]);
        assert_eq!(cfg.session_ttl_secs, 3600);
    }
}
