//! In-memory storage backend.
//!
//! Data lives in a `BTreeMap` behind a `RwLock` and is lost when the process
//! exits. Used by unit tests, the HTTP tests, and `PASSKEEP_STORAGE=memory`.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Keys are kept sorted, so prefix listing is a single `range` scan.
/// Clones share the same underlying map.
///
/// # Examples
///
/// ```
/// # use passkeep_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("users/alice", b"{}").await.unwrap();
/// assert!(backend.exists("users/alice").await.unwrap());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the backend holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        let keys = data
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("users/nobody").await.unwrap(), None);
        assert!(!backend.exists("users/nobody").await.unwrap());
    }

    #[tokio::test]
    async fn put_overwrites_last_write_wins() {
        let backend = MemoryBackend::new();
        backend.put("passwords/alice/site", b"first").await.unwrap();
        backend.put("passwords/alice/site", b"second").await.unwrap();
        assert_eq!(
            backend.get("passwords/alice/site").await.unwrap(),
            Some(b"second".to_vec())
        );
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let backend = MemoryBackend::new();
        backend.put("messages/bob/x", b"1").await.unwrap();
        backend.delete("messages/bob/x").await.unwrap();
        backend.delete("messages/bob/x").await.unwrap();
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn list_stops_at_prefix_boundary() {
        let backend = MemoryBackend::new();
        backend.put("passwords/alice/a", b"1").await.unwrap();
        backend.put("passwords/alice/b", b"2").await.unwrap();
        backend.put("passwords/alicia/a", b"3").await.unwrap();
        backend.put("users/alice", b"4").await.unwrap();

        let keys = backend.list("passwords/alice/").await.unwrap();
        assert_eq!(keys, vec!["passwords/alice/a", "passwords/alice/b"]);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let backend = MemoryBackend::new();
        let other = backend.clone();
        backend.put("sessions/abc", b"s").await.unwrap();
        assert!(other.exists("sessions/abc").await.unwrap());
    }
}
