//! Storage traits: local key-value persistence and encrypted blob storage.
//!
//! Both are injected capabilities. The orchestrator never names a concrete
//! backend; tests use the in-memory implementations and production uses
//! SQLite and the HTTP gateway store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use securedocs_core::BlobLocator;

use crate::error::{BlobResult, Result};

/// Result of an atomic multi-key insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Every entry was written.
    Inserted,
    /// At least one key was already present; nothing was written.
    AlreadyExists,
}

/// Async string key-value store for local state (keypairs, name hints).
///
/// # Design Notes
///
/// - **Atomic first write**: `insert_all_if_absent` writes a group of
///   entries only if none of the keys exists, so two writers racing on the
///   same group converge on whichever committed first.
/// - **Plain overwrite**: `set` replaces an existing value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Write all entries, or none if any key already exists.
    async fn insert_all_if_absent(&self, entries: &[(String, String)]) -> Result<InsertResult>;

    /// All keys starting with `prefix`, sorted.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Content-addressed storage for encrypted blobs.
///
/// Implementations only ever see ciphertext.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under a display `name` and return its locator.
    async fn put(&self, bytes: Bytes, name: &str) -> BlobResult<BlobLocator>;

    /// Fetch the exact bytes stored under `locator`.
    async fn get(&self, locator: &BlobLocator) -> BlobResult<Bytes>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key).await
    }

    async fn insert_all_if_absent(&self, entries: &[(String, String)]) -> Result<InsertResult> {
        (**self).insert_all_if_absent(entries).await
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).keys_with_prefix(prefix).await
    }
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn put(&self, bytes: Bytes, name: &str) -> BlobResult<BlobLocator> {
        (**self).put(bytes, name).await
    }

    async fn get(&self, locator: &BlobLocator) -> BlobResult<Bytes> {
        (**self).get(locator).await
    }
}
