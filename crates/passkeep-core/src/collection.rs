//! Typed JSON document collections over a [`StorageBackend`].
//!
//! A collection is a named key prefix (`users`, `passwords`, ...) holding
//! documents of one type. Document keys are built from path segments, each
//! percent-encoded so that values such as `https://example.com/login` stay a
//! single segment:
//!
//! ```text
//! passwords/alice/https%3A%2F%2Fexample.com%2Flogin
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use passkeep_storage::StorageBackend;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DocumentError;

/// A named set of JSON documents of type `T`.
pub struct Collection<T> {
    storage: Arc<dyn StorageBackend>,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            name: self.name,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a collection named `name` on top of `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageBackend>, name: &'static str) -> Self {
        Self {
            storage,
            name,
            _marker: PhantomData,
        }
    }

    /// The collection name (its top-level key prefix).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build the storage key for a document.
    #[must_use]
    pub fn key(&self, segments: &[&str]) -> String {
        let mut key = self.name.to_owned();
        for segment in segments {
            key.push('/');
            key.push_str(&urlencoding::encode(segment));
        }
        key
    }

    /// Build the listing prefix for all documents below `segments`.
    #[must_use]
    pub fn prefix(&self, segments: &[&str]) -> String {
        let mut prefix = self.key(segments);
        prefix.push('/');
        prefix
    }

    /// Fetch one document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] on storage failure or a corrupt document.
    pub async fn get(&self, segments: &[&str]) -> Result<Option<T>, DocumentError> {
        let key = self.key(segments);
        self.get_raw(&key).await
    }

    /// Write one document, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] on serialization or storage failure.
    pub async fn put(&self, segments: &[&str], doc: &T) -> Result<(), DocumentError> {
        let key = self.key(segments);
        let bytes = serde_json::to_vec(doc).map_err(|e| DocumentError::Serialize {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        self.storage.put(&key, &bytes).await?;
        Ok(())
    }

    /// Write a document only if no document exists at its key yet.
    ///
    /// Returns `false` (and writes nothing) if the key is taken. The check
    /// and the write are not atomic.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] on serialization or storage failure.
    pub async fn insert(&self, segments: &[&str], doc: &T) -> Result<bool, DocumentError> {
        if self.exists(segments).await? {
            return Ok(false);
        }
        self.put(segments, doc).await?;
        Ok(true)
    }

    /// Whether a document exists.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] on storage failure.
    pub async fn exists(&self, segments: &[&str]) -> Result<bool, DocumentError> {
        Ok(self.storage.exists(&self.key(segments)).await?)
    }

    /// Delete one document. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Storage`] on storage failure.
    pub async fn delete(&self, segments: &[&str]) -> Result<bool, DocumentError> {
        let key = self.key(segments);
        let existed = self.storage.exists(&key).await?;
        if existed {
            self.storage.delete(&key).await?;
        }
        Ok(existed)
    }

    /// Fetch every document below `segments`, in key order.
    ///
    /// Documents removed between listing and reading are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] on storage failure or a corrupt document.
    pub async fn list(&self, segments: &[&str]) -> Result<Vec<T>, DocumentError> {
        let keys = self.storage.list(&self.prefix(segments)).await?;
        let mut docs = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(doc) = self.get_raw(key).await? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    async fn get_raw(&self, key: &str) -> Result<Option<T>, DocumentError> {
        let Some(bytes) = self.storage.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| DocumentError::Deserialize {
                key: key.to_owned(),
                reason: e.to_string(),
            })
    }
}
