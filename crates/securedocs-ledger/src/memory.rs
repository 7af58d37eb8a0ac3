//! In-memory implementation of the AccessLedger trait.
//!
//! One [`MemoryLedger`] is the shared record; each party talks to it
//! through a [`MemoryLedgerClient`] bound to its own identity, the way each
//! wallet signs its own transactions against one contract.
//!
//! Mutating calls wait for the configured confirmation delay *before*
//! applying, so a caller that times out or drops the future during the wait
//! leaves no trace.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use securedocs_core::{BlobLocator, DocumentId, Fingerprint, Identity, WrappedKey};

use crate::error::{LedgerError, Result};
use crate::record::DocumentMetadata;
use crate::state::LedgerState;
use crate::traits::AccessLedger;

struct Book {
    state: Mutex<LedgerState>,
    confirmation_delay_ms: AtomicU64,
    offline: AtomicBool,
    confirmed_writes: AtomicUsize,
}

impl Book {
    fn state(&self) -> MutexGuard<'_, LedgerState> {
        // Every mutation is applied under a single lock acquisition, so a
        // poisoned guard still holds consistent state.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("ledger node unreachable".into()));
        }
        Ok(())
    }

    async fn confirm(&self) -> Result<()> {
        self.check_online()?;
        let delay = self.confirmation_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        // An outage during confirmation drops the transaction.
        self.check_online()
    }

    fn applied(&self) {
        self.confirmed_writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Shared in-memory ledger with fault injection.
#[derive(Clone)]
pub struct MemoryLedger {
    book: Arc<Book>,
}

impl MemoryLedger {
    /// Create an empty ledger with instant confirmation.
    pub fn new() -> Self {
        Self {
            book: Arc::new(Book {
                state: Mutex::new(LedgerState::new()),
                confirmation_delay_ms: AtomicU64::new(0),
                offline: AtomicBool::new(false),
                confirmed_writes: AtomicUsize::new(0),
            }),
        }
    }

    /// Create an empty ledger that waits `delay` before confirming writes.
    pub fn with_confirmation_delay(delay: Duration) -> Self {
        let ledger = Self::new();
        ledger.set_confirmation_delay(delay);
        ledger
    }

    /// A client that signs as `identity`.
    pub fn connect(&self, identity: Identity) -> MemoryLedgerClient {
        MemoryLedgerClient {
            book: self.book.clone(),
            signer: identity,
        }
    }

    pub fn set_confirmation_delay(&self, delay: Duration) {
        self.book
            .confirmation_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Simulate an outage: every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.book.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of registered documents.
    pub fn document_count(&self) -> usize {
        self.book.state().document_count()
    }

    /// Number of writes that were confirmed and applied.
    pub fn confirmed_writes(&self) -> usize {
        self.book.confirmed_writes.load(Ordering::SeqCst)
    }

    /// Snapshot of the full state, for assertions.
    pub fn snapshot(&self) -> LedgerState {
        self.book.state().clone()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// A party's connection to a [`MemoryLedger`].
#[derive(Clone)]
pub struct MemoryLedgerClient {
    book: Arc<Book>,
    signer: Identity,
}

impl std::fmt::Debug for MemoryLedgerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLedgerClient")
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AccessLedger for MemoryLedgerClient {
    fn signer(&self) -> Identity {
        self.signer
    }

    async fn register(
        &self,
        locator: &BlobLocator,
        fingerprint: &Fingerprint,
        owner_key: &WrappedKey,
    ) -> Result<DocumentId> {
        self.book.confirm().await?;

        let id = self.book.state().register(
            self.signer,
            locator.clone(),
            *fingerprint,
            owner_key.clone(),
            now_secs(),
        );
        self.book.applied();
        tracing::debug!(document = %id, owner = %self.signer, "document registered");
        Ok(id)
    }

    async fn grant(
        &self,
        document: DocumentId,
        recipient: &Identity,
        wrapped_key: &WrappedKey,
    ) -> Result<()> {
        self.book.confirm().await?;

        self.book.state().grant(
            &self.signer,
            document,
            *recipient,
            wrapped_key.clone(),
            now_secs(),
        )?;
        self.book.applied();
        Ok(())
    }

    async fn revoke(&self, document: DocumentId, recipient: &Identity) -> Result<()> {
        self.book.confirm().await?;

        self.book.state().revoke(&self.signer, document, recipient)?;
        self.book.applied();
        Ok(())
    }

    async fn wrapped_key(
        &self,
        document: DocumentId,
        identity: &Identity,
    ) -> Result<Option<WrappedKey>> {
        self.book.check_online()?;
        self.book.state().wrapped_key(document, identity)
    }

    async fn metadata(&self, document: DocumentId) -> Result<DocumentMetadata> {
        self.book.check_online()?;
        self.book.state().metadata(document)
    }

    async fn has_access(&self, document: DocumentId, identity: &Identity) -> Result<bool> {
        self.book.check_online()?;
        self.book.state().has_access(document, identity)
    }

    async fn shared_with(&self, document: DocumentId) -> Result<Vec<Identity>> {
        self.book.check_online()?;
        self.book.state().shared_with(document)
    }

    async fn check_integrity(
        &self,
        document: DocumentId,
        fingerprint: &Fingerprint,
    ) -> Result<bool> {
        self.book.check_online()?;
        self.book.state().check_integrity(document, fingerprint)
    }

    async fn next_id(&self) -> Result<DocumentId> {
        self.book.check_online()?;
        Ok(self.book.state().next_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> Identity {
        Identity::from_bytes([n; 20])
    }

    fn key(n: u8) -> WrappedKey {
        WrappedKey::from_bytes(vec![n; 8]).unwrap()
    }

    fn locator() -> BlobLocator {
        BlobLocator::new("bafyTEST").unwrap()
    }

    #[tokio::test]
    async fn test_register_and_query() {
        let ledger = MemoryLedger::new();
        let owner = ledger.connect(id(1));

        let fp = Fingerprint::from_bytes([0x11; 32]);
        let doc = owner.register(&locator(), &fp, &key(1)).await.unwrap();

        assert_eq!(owner.next_id().await.unwrap(), doc);
        let meta = owner.metadata(doc).await.unwrap();
        assert_eq!(meta.owner, id(1));
        assert_eq!(meta.fingerprint, fp);
        assert!(owner.has_access(doc, &id(1)).await.unwrap());
        assert!(owner.check_integrity(doc, &fp).await.unwrap());
        assert_eq!(ledger.confirmed_writes(), 1);
    }

    #[tokio::test]
    async fn test_clients_share_one_record() {
        let ledger = MemoryLedger::new();
        let owner = ledger.connect(id(1));
        let alice = ledger.connect(id(2));

        let doc = owner
            .register(&locator(), &Fingerprint::from_bytes([0x22; 32]), &key(1))
            .await
            .unwrap();
        owner.grant(doc, &id(2), &key(2)).await.unwrap();

        assert_eq!(alice.wrapped_key(doc, &id(2)).await.unwrap(), Some(key(2)));
        assert_eq!(alice.shared_with(doc).await.unwrap(), vec![id(1), id(2)]);

        owner.revoke(doc, &id(2)).await.unwrap();
        assert!(!alice.has_access(doc, &id(2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_owner_grant_reverts() {
        let ledger = MemoryLedger::new();
        let owner = ledger.connect(id(1));
        let alice = ledger.connect(id(2));

        let doc = owner
            .register(&locator(), &Fingerprint::from_bytes([0x33; 32]), &key(1))
            .await
            .unwrap();

        let result = alice.grant(doc, &id(2), &key(2)).await;
        assert!(matches!(result, Err(LedgerError::NotOwner { .. })));
        assert_eq!(ledger.confirmed_writes(), 1);
        assert_eq!(owner.shared_with(doc).await.unwrap(), vec![id(1)]);
    }

    #[tokio::test]
    async fn test_offline_register_leaves_no_record() {
        let ledger = MemoryLedger::new();
        let owner = ledger.connect(id(1));
        ledger.set_offline(true);

        let result = owner
            .register(&locator(), &Fingerprint::from_bytes([0x44; 32]), &key(1))
            .await;
        assert!(matches!(result, Err(LedgerError::Unavailable(_))));
        assert!(result.unwrap_err().is_transient());

        ledger.set_offline(false);
        assert_eq!(ledger.document_count(), 0);
        assert_eq!(owner.next_id().await.unwrap(), DocumentId::new(0));
    }

    #[tokio::test]
    async fn test_cancelled_write_is_not_applied() {
        let ledger = MemoryLedger::with_confirmation_delay(Duration::from_secs(5));
        let owner = ledger.connect(id(1));

        let (loc, fp, k) = (locator(), Fingerprint::from_bytes([0x55; 32]), key(1));
        let register = owner.register(&loc, &fp, &k);
        let result = tokio::time::timeout(Duration::from_millis(20), register).await;

        assert!(result.is_err());
        assert_eq!(ledger.document_count(), 0);
        assert_eq!(ledger.confirmed_writes(), 0);
    }

    #[tokio::test]
    async fn test_confirmation_delay_is_awaited() {
        let ledger = MemoryLedger::with_confirmation_delay(Duration::from_millis(30));
        let owner = ledger.connect(id(1));

        let started = std::time::Instant::now();
        owner
            .register(&locator(), &Fingerprint::from_bytes([0x66; 32]), &key(1))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(ledger.document_count(), 1);
    }
}
