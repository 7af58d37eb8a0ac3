//! In-memory implementations of the storage traits.
//!
//! These are primarily for testing. They have the same semantics as the
//! persistent backends but keep everything in memory, plus a few knobs for
//! injecting faults.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;
use securedocs_core::BlobLocator;

use crate::error::{BlobError, BlobResult, Result, StoreError};
use crate::traits::{BlobStore, InsertResult, KeyValueStore};

// A poisoned lock still guards consistent data: every mutation below is a
// single map operation.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

/// In-memory key-value store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<BTreeMap<String, String>>,
    rejected_prefixes: RwLock<Vec<String>>,
}

impl MemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to a key under `prefix` fail.
    pub fn reject_writes_under(&self, prefix: impl Into<String>) {
        write(&self.rejected_prefixes).push(prefix.into());
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.entries).is_empty()
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if read(&self.rejected_prefixes)
            .iter()
            .any(|p| key.starts_with(p.as_str()))
        {
            return Err(StoreError::WriteRejected(key.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(read(&self.entries).get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        write(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check_writable(key)?;
        Ok(write(&self.entries).remove(key).is_some())
    }

    async fn insert_all_if_absent(&self, entries: &[(String, String)]) -> Result<InsertResult> {
        for (key, _) in entries {
            self.check_writable(key)?;
        }

        let mut map = write(&self.entries);
        if entries.iter().any(|(key, _)| map.contains_key(key)) {
            return Ok(InsertResult::AlreadyExists);
        }
        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        Ok(InsertResult::Inserted)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(read(&self.entries)
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

/// In-memory content-addressed blob store.
///
/// Locators are `mem:` followed by the Blake3 hash of the bytes, so storing
/// the same bytes twice yields the same locator.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<BlobLocator, Stored>>,
    offline: AtomicBool,
    puts: AtomicUsize,
    fetches: AtomicUsize,
}

struct Stored {
    bytes: Bytes,
    name: String,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `put` calls that reached the store.
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Number of `get` calls that reached the store.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        read(&self.blobs).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.blobs).is_empty()
    }

    /// The name a blob was uploaded under.
    pub fn name_of(&self, locator: &BlobLocator) -> Option<String> {
        read(&self.blobs).get(locator).map(|s| s.name.clone())
    }

    /// Flip the bits of the byte at `index` in place, simulating storage
    /// corruption. Returns false if the blob or index does not exist.
    pub fn corrupt(&self, locator: &BlobLocator, index: usize) -> bool {
        let mut blobs = write(&self.blobs);
        let Some(stored) = blobs.get_mut(locator) else {
            return false;
        };
        if index >= stored.bytes.len() {
            return false;
        }
        let mut bytes = stored.bytes.to_vec();
        bytes[index] ^= 0xff;
        stored.bytes = Bytes::from(bytes);
        true
    }

    fn check_online(&self) -> BlobResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BlobError::Unavailable("memory blob store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Bytes, name: &str) -> BlobResult<BlobLocator> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        let locator = BlobLocator::new(format!("mem:{}", blake3::hash(&bytes).to_hex()))?;
        write(&self.blobs).insert(
            locator.clone(),
            Stored {
                bytes,
                name: name.to_string(),
            },
        );
        Ok(locator)
    }

    async fn get(&self, locator: &BlobLocator) -> BlobResult<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;

        read(&self.blobs)
            .get(locator)
            .map(|s| s.bytes.clone())
            .ok_or_else(|| BlobError::NotFound(locator.to_string()))
    }
}
