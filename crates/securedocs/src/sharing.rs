//! The document sharing orchestrator.
//!
//! Every flow is a strict sequential pipeline over the injected
//! collaborators. Each remote call is bounded by the configured timeout, and
//! ledger writes are always the last remote step, so a failure or
//! cancellation before that point leaves at most an orphaned blob.

use std::future::Future;
use std::sync::Arc;

use securedocs_core::{
    BlobLocator, ContentKey, DocumentId, EncryptedBlob, Fingerprint, Identity, Nonce, PublicKey,
    SecureRandomSource,
};
use securedocs_ledger::AccessLedger;
use securedocs_store::{BlobStore, KeyValueStore};

use crate::config::SharingConfig;
use crate::error::{AtStep, FlowStep, Result, SharingError};
use crate::keys::{IdentityKeys, KeypairManager};

/// Persistence key for a document's local name hint.
pub fn name_hint_entry(document: DocumentId) -> String {
    format!("document:{}:name", document)
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDocument {
    pub id: DocumentId,
    pub locator: BlobLocator,
    pub fingerprint: Fingerprint,
}

/// A decrypted document.
#[derive(Clone, PartialEq, Eq)]
pub struct RetrievedDocument {
    pub id: DocumentId,
    /// Local name hint, or the configured fallback name.
    pub name: String,
    pub plaintext: Vec<u8>,
}

impl std::fmt::Debug for RetrievedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievedDocument")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("plaintext", &format_args!("{} bytes", self.plaintext.len()))
            .finish()
    }
}

/// Register, grant and retrieve documents on behalf of one identity.
///
/// The acting identity is the ledger connection's signer.
pub struct DocumentSharing<L, B, K> {
    ledger: L,
    blobs: B,
    keys: KeypairManager<K>,
    random: Arc<dyn SecureRandomSource>,
    config: SharingConfig,
}

impl<L, B, K> DocumentSharing<L, B, K>
where
    L: AccessLedger,
    B: BlobStore,
    K: KeyValueStore,
{
    /// Create an orchestrator. Fails if the configuration is invalid.
    pub fn new(
        ledger: L,
        blobs: B,
        local: K,
        random: Arc<dyn SecureRandomSource>,
        config: SharingConfig,
    ) -> Result<Self> {
        config.validate()?;
        let keys = KeypairManager::new(local, random.clone(), config.modulus_bits);
        Ok(Self {
            ledger,
            blobs,
            keys,
            random,
            config,
        })
    }

    /// The acting identity.
    pub fn identity(&self) -> Identity {
        self.ledger.signer()
    }

    pub fn config(&self) -> &SharingConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeypairManager<K> {
        &self.keys
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// The caller's exportable public key, for out-of-band sharing.
    pub async fn public_key_pem(&self) -> Result<String> {
        Ok(self.own_keys().await?.public_pem)
    }

    /// Encrypt `plaintext`, store the ciphertext and record the document
    /// with the caller as owner.
    ///
    /// A retry after failure starts over with a fresh key, nonce and
    /// ciphertext.
    pub async fn register(&self, plaintext: &[u8], name: &str) -> Result<RegisteredDocument> {
        let me = self.identity();
        let keys = self.own_keys().await?;

        let content_key = ContentKey::generate(self.random.as_ref());
        let nonce = Nonce::generate(self.random.as_ref());
        let blob = EncryptedBlob::seal(self.config.cipher, &content_key, nonce, plaintext)
            .map_err(|e| e.at(FlowStep::Encrypt))?;
        tracing::debug!(identity = %me, bytes = blob.len(), "content encrypted");

        let upload_name = format!("{}.enc", upload_stem(name));
        let locator = self
            .bounded(FlowStep::UploadBlob, self.blobs.put(blob.to_bytes(), &upload_name))
            .await?;
        let fingerprint = Fingerprint::compute(blob.as_bytes());
        tracing::debug!(%locator, %fingerprint, "blob stored");

        let owner_key = keys
            .public
            .wrap(&content_key, self.random.as_ref())
            .map_err(|e| e.at(FlowStep::Wrap))?;

        let id = match self
            .bounded(
                FlowStep::Register,
                self.ledger.register(&locator, &fingerprint, &owner_key),
            )
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(%locator, error = %e, "registration failed, blob is orphaned");
                return Err(e);
            }
        };

        if let Err(e) = self.keys.store().set(&name_hint_entry(id), name).await {
            tracing::warn!(document = %id, error = %e, "failed to store name hint");
        }

        tracing::info!(document = %id, owner = %me, %locator, "document registered");
        Ok(RegisteredDocument {
            id,
            locator,
            fingerprint,
        })
    }

    /// Share an owned document with `recipient`, whose public key is given
    /// as pasted PEM text.
    ///
    /// The pasted key is trusted as given. Its SHA-256 fingerprint is logged
    /// so the binding can be checked out-of-band.
    pub async fn grant(
        &self,
        document: DocumentId,
        recipient: &Identity,
        recipient_public_pem: &str,
    ) -> Result<()> {
        let me = self.identity();
        let keys = self.own_keys().await?;

        let metadata = self
            .bounded(FlowStep::ReadMetadata, self.ledger.metadata(document))
            .await?;
        if metadata.owner != me {
            return Err(SharingError::NotOwner {
                document,
                caller: me,
            });
        }

        let content_key = self.unwrap_own_key(document, &keys).await?;

        let recipient_key =
            PublicKey::from_pem(recipient_public_pem).map_err(SharingError::InvalidRecipientKey)?;
        match recipient_key.fingerprint() {
            Ok(fp) => tracing::info!(
                document = %document,
                %recipient,
                key_fingerprint = %fp,
                "granting access to pasted key"
            ),
            Err(e) => tracing::warn!(%recipient, error = %e, "could not fingerprint recipient key"),
        }

        let wrapped = recipient_key
            .wrap(&content_key, self.random.as_ref())
            .map_err(|e| e.at(FlowStep::Wrap))?;

        self.bounded(FlowStep::Grant, self.ledger.grant(document, recipient, &wrapped))
            .await?;

        tracing::info!(document = %document, %recipient, "access granted");
        Ok(())
    }

    /// Fetch, verify and decrypt a document the caller has a grant for.
    ///
    /// The blob is fetched only after a grant is confirmed, and decrypted
    /// only after its fingerprint matches the ledger record.
    pub async fn retrieve(&self, document: DocumentId) -> Result<RetrievedDocument> {
        let me = self.identity();

        let metadata = self
            .bounded(FlowStep::ReadMetadata, self.ledger.metadata(document))
            .await?;
        let keys = self.own_keys().await?;

        let wrapped = self
            .bounded(FlowStep::ReadWrappedKey, self.ledger.wrapped_key(document, &me))
            .await?
            .ok_or(SharingError::NoGrantForCaller {
                document,
                caller: me,
            })?;

        let bytes = self
            .bounded(FlowStep::FetchBlob, self.blobs.get(&metadata.locator))
            .await?;

        let actual = Fingerprint::compute(&bytes);
        if !securedocs_core::fingerprint::verify(&metadata.fingerprint, &actual) {
            tracing::warn!(
                document = %document,
                expected = %metadata.fingerprint,
                %actual,
                "integrity mismatch"
            );
            return Err(SharingError::IntegrityMismatch {
                document,
                expected: metadata.fingerprint,
                actual,
            });
        }
        tracing::debug!(document = %document, "fingerprint verified");

        let blob = EncryptedBlob::from_bytes(bytes).map_err(|e| e.at(FlowStep::Decrypt))?;
        let content_key = keys
            .private
            .unwrap_key(&wrapped, self.random.as_ref())
            .map_err(|e| e.at(FlowStep::Unwrap))?;
        let plaintext = blob
            .open(self.config.cipher, &content_key)
            .map_err(|e| e.at(FlowStep::Decrypt))?;

        let name = self.name_hint(document).await;
        tracing::info!(document = %document, identity = %me, "document retrieved");

        Ok(RetrievedDocument {
            id: document,
            name,
            plaintext,
        })
    }

    /// Remove `recipient`'s future access. Keys already unwrapped elsewhere
    /// are unaffected.
    pub async fn revoke(&self, document: DocumentId, recipient: &Identity) -> Result<()> {
        self.bounded(FlowStep::Revoke, self.ledger.revoke(document, recipient))
            .await?;
        tracing::info!(document = %document, %recipient, "access revoked");
        Ok(())
    }

    /// Identities with an active grant, owner first.
    pub async fn shared_with(&self, document: DocumentId) -> Result<Vec<Identity>> {
        self.bounded(FlowStep::ReadSharedWith, self.ledger.shared_with(document))
            .await
    }

    /// Check candidate blob bytes against the registered fingerprint.
    pub async fn verify_blob(&self, document: DocumentId, bytes: &[u8]) -> Result<bool> {
        let fingerprint = Fingerprint::compute(bytes);
        self.bounded(
            FlowStep::CheckIntegrity,
            self.ledger.check_integrity(document, &fingerprint),
        )
        .await
    }

    async fn own_keys(&self) -> Result<IdentityKeys> {
        self.keys.ensure_keypair(&self.identity()).await
    }

    async fn unwrap_own_key(&self, document: DocumentId, keys: &IdentityKeys) -> Result<ContentKey> {
        let wrapped = self
            .bounded(
                FlowStep::ReadWrappedKey,
                self.ledger.wrapped_key(document, &keys.identity),
            )
            .await?
            .ok_or(SharingError::NoGrantForCaller {
                document,
                caller: keys.identity,
            })?;

        keys.private
            .unwrap_key(&wrapped, self.random.as_ref())
            .map_err(|e| e.at(FlowStep::Unwrap))
    }

    async fn name_hint(&self, document: DocumentId) -> String {
        match self.keys.store().get(&name_hint_entry(document)).await {
            Ok(Some(name)) if !name.is_empty() => name,
            Ok(_) => self.config.fallback_file_name.clone(),
            Err(e) => {
                tracing::warn!(document = %document, error = %e, "failed to read name hint");
                self.config.fallback_file_name.clone()
            }
        }
    }

    /// Run one collaborator call under the configured timeout.
    async fn bounded<T, E, F>(&self, step: FlowStep, call: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        E: AtStep,
    {
        let after = self.config.call_timeout();
        match tokio::time::timeout(after, call).await {
            Ok(result) => result.map_err(|e| e.at(step)),
            Err(_) => {
                tracing::warn!(%step, ?after, "call timed out");
                Err(SharingError::Timeout { step, after })
            }
        }
    }
}

fn upload_stem(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        "encrypted"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_hint_entry() {
        assert_eq!(name_hint_entry(DocumentId::new(12)), "document:12:name");
    }

    #[test]
    fn test_upload_stem() {
        assert_eq!(upload_stem("report.pdf"), "report.pdf");
        assert_eq!(upload_stem("  "), "encrypted");
    }

    #[test]
    fn test_retrieved_debug_hides_plaintext() {
        let doc = RetrievedDocument {
            id: DocumentId::new(1),
            name: "a.txt".into(),
            plaintext: b"secret".to_vec(),
        };
        let debug = format!("{:?}", doc);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("6 bytes"));
    }
}
