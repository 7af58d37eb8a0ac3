//! AccessLedger trait: the interface to the external authorization record.

use std::sync::Arc;

use async_trait::async_trait;
use securedocs_core::{BlobLocator, DocumentId, Fingerprint, Identity, WrappedKey};

use crate::error::Result;
use crate::record::DocumentMetadata;

/// A ledger connection bound to one signing identity.
///
/// Every method is a remote call. Mutating calls return only after the
/// change is confirmed; if the returned future is dropped first, the change
/// may or may not have been applied, which the ledger reports faithfully on
/// the next read.
///
/// # Design Notes
///
/// - **Owner-only writes**: `grant` and `revoke` fail with `NotOwner` unless
///   the signer registered the document.
/// - **Empty is not an error**: `wrapped_key` returns `None` when there is no
///   active grant for the identity.
#[async_trait]
pub trait AccessLedger: Send + Sync {
    /// The identity that signs mutating calls.
    fn signer(&self) -> Identity;

    /// Record a new document owned by the signer.
    async fn register(
        &self,
        locator: &BlobLocator,
        fingerprint: &Fingerprint,
        owner_key: &WrappedKey,
    ) -> Result<DocumentId>;

    /// Give `recipient` access. Re-granting overwrites and reactivates.
    async fn grant(
        &self,
        document: DocumentId,
        recipient: &Identity,
        wrapped_key: &WrappedKey,
    ) -> Result<()>;

    /// Remove `recipient`'s access to future fetches.
    async fn revoke(&self, document: DocumentId, recipient: &Identity) -> Result<()>;

    /// The active wrapped key for `identity`.
    async fn wrapped_key(
        &self,
        document: DocumentId,
        identity: &Identity,
    ) -> Result<Option<WrappedKey>>;

    async fn metadata(&self, document: DocumentId) -> Result<DocumentMetadata>;

    async fn has_access(&self, document: DocumentId, identity: &Identity) -> Result<bool>;

    /// Identities with an active grant, owner first.
    async fn shared_with(&self, document: DocumentId) -> Result<Vec<Identity>>;

    /// Compare `fingerprint` with the registered one.
    async fn check_integrity(&self, document: DocumentId, fingerprint: &Fingerprint)
        -> Result<bool>;

    /// The allocation counter. Equals the most recently assigned id.
    async fn next_id(&self) -> Result<DocumentId>;
}

#[async_trait]
impl<T: AccessLedger + ?Sized> AccessLedger for Arc<T> {
    fn signer(&self) -> Identity {
        (**self).signer()
    }

    async fn register(
        &self,
        locator: &BlobLocator,
        fingerprint: &Fingerprint,
        owner_key: &WrappedKey,
    ) -> Result<DocumentId> {
        (**self).register(locator, fingerprint, owner_key).await
    }

    async fn grant(
        &self,
        document: DocumentId,
        recipient: &Identity,
        wrapped_key: &WrappedKey,
    ) -> Result<()> {
        (**self).grant(document, recipient, wrapped_key).await
    }

    async fn revoke(&self, document: DocumentId, recipient: &Identity) -> Result<()> {
        (**self).revoke(document, recipient).await
    }

    async fn wrapped_key(
        &self,
        document: DocumentId,
        identity: &Identity,
    ) -> Result<Option<WrappedKey>> {
        (**self).wrapped_key(document, identity).await
    }

    async fn metadata(&self, document: DocumentId) -> Result<DocumentMetadata> {
        (**self).metadata(document).await
    }

    async fn has_access(&self, document: DocumentId, identity: &Identity) -> Result<bool> {
        (**self).has_access(document, identity).await
    }

    async fn shared_with(&self, document: DocumentId) -> Result<Vec<Identity>> {
        (**self).shared_with(document).await
    }

    async fn check_integrity(
        &self,
        document: DocumentId,
        fingerprint: &Fingerprint,
    ) -> Result<bool> {
        (**self).check_integrity(document, fingerprint).await
    }

    async fn next_id(&self) -> Result<DocumentId> {
        (**self).next_id().await
    }
}
