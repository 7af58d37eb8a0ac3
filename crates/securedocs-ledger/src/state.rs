//! Ledger state machine.
//!
//! Pure computation over document records: no I/O, no clock. Every ledger
//! implementation in this workspace applies calls through [`LedgerState`],
//! so the access rules live in exactly one place.
//!
//! Per document: `Unregistered -> Registered`, after which the metadata never
//! changes. Per recipient, orthogonally: `NoAccess <-> Granted`.

use std::collections::BTreeMap;

use securedocs_core::{BlobLocator, DocumentId, Fingerprint, Identity, WrappedKey};

use crate::error::{LedgerError, Result};
use crate::record::{AccessState, DocumentMetadata, GrantEntry};

#[derive(Debug, Clone)]
struct DocumentRecord {
    metadata: DocumentMetadata,

    /// In order of first grant; the owner's entry is always first.
    grants: Vec<GrantEntry>,
}

impl DocumentRecord {
    fn entry(&self, identity: &Identity) -> Option<&GrantEntry> {
        self.grants.iter().find(|g| &g.recipient == identity)
    }

    fn entry_mut(&mut self, identity: &Identity) -> Option<&mut GrantEntry> {
        self.grants.iter_mut().find(|g| &g.recipient == identity)
    }

    fn require_owner(&self, document: DocumentId, caller: &Identity) -> Result<()> {
        if &self.metadata.owner != caller {
            return Err(LedgerError::NotOwner {
                document,
                caller: *caller,
            });
        }
        Ok(())
    }
}

/// All documents known to a ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    /// Last assigned id; 0 before the first registration.
    last_id: u64,
    documents: BTreeMap<DocumentId, DocumentRecord>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document. The caller becomes its owner and receives the
    /// first grant entry.
    pub fn register(
        &mut self,
        caller: Identity,
        locator: BlobLocator,
        fingerprint: Fingerprint,
        owner_key: WrappedKey,
        now: u64,
    ) -> DocumentId {
        self.last_id += 1;
        let id = DocumentId::new(self.last_id);

        let record = DocumentRecord {
            metadata: DocumentMetadata {
                owner: caller,
                locator,
                fingerprint,
                created_at: now,
            },
            grants: vec![GrantEntry {
                recipient: caller,
                wrapped_key: owner_key,
                state: AccessState::Granted,
                granted_at: now,
            }],
        };
        self.documents.insert(id, record);
        id
    }

    /// Give `recipient` access. Re-granting overwrites the stored key and
    /// reactivates a revoked entry, keeping its position.
    pub fn grant(
        &mut self,
        caller: &Identity,
        document: DocumentId,
        recipient: Identity,
        wrapped_key: WrappedKey,
        now: u64,
    ) -> Result<()> {
        let record = self.record_mut(document)?;
        record.require_owner(document, caller)?;

        match record.entry_mut(&recipient) {
            Some(entry) => {
                entry.wrapped_key = wrapped_key;
                entry.state = AccessState::Granted;
                entry.granted_at = now;
            }
            None => record.grants.push(GrantEntry {
                recipient,
                wrapped_key,
                state: AccessState::Granted,
                granted_at: now,
            }),
        }
        Ok(())
    }

    /// Remove `recipient`'s access. Revoking an identity without an active
    /// grant is a no-op.
    pub fn revoke(
        &mut self,
        caller: &Identity,
        document: DocumentId,
        recipient: &Identity,
    ) -> Result<()> {
        let record = self.record_mut(document)?;
        record.require_owner(document, caller)?;

        if &record.metadata.owner == recipient {
            return Err(LedgerError::CannotRevokeOwner(document));
        }

        if let Some(entry) = record.entry_mut(recipient) {
            entry.state = AccessState::NoAccess;
        }
        Ok(())
    }

    /// The active wrapped key for `identity`, if any.
    pub fn wrapped_key(&self, document: DocumentId, identity: &Identity) -> Result<Option<WrappedKey>> {
        Ok(self
            .record(document)?
            .entry(identity)
            .filter(|e| e.is_active())
            .map(|e| e.wrapped_key.clone()))
    }

    pub fn metadata(&self, document: DocumentId) -> Result<DocumentMetadata> {
        Ok(self.record(document)?.metadata.clone())
    }

    pub fn access_state(&self, document: DocumentId, identity: &Identity) -> Result<AccessState> {
        Ok(self
            .record(document)?
            .entry(identity)
            .map(|e| e.state)
            .unwrap_or(AccessState::NoAccess))
    }

    pub fn has_access(&self, document: DocumentId, identity: &Identity) -> Result<bool> {
        Ok(self.access_state(document, identity)? == AccessState::Granted)
    }

    /// Identities with an active grant: owner first, then in grant order.
    pub fn shared_with(&self, document: DocumentId) -> Result<Vec<Identity>> {
        Ok(self
            .record(document)?
            .grants
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.recipient)
            .collect())
    }

    /// Compare a fingerprint with the registered one.
    pub fn check_integrity(&self, document: DocumentId, fingerprint: &Fingerprint) -> Result<bool> {
        Ok(securedocs_core::fingerprint::verify(
            &self.record(document)?.metadata.fingerprint,
            fingerprint,
        ))
    }

    /// The allocation counter: after a registration, the id just assigned.
    pub fn next_id(&self) -> DocumentId {
        DocumentId::new(self.last_id)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Total grant entries for a document, active or not.
    pub fn entry_count(&self, document: DocumentId) -> Result<usize> {
        Ok(self.record(document)?.grants.len())
    }

    fn record(&self, document: DocumentId) -> Result<&DocumentRecord> {
        self.documents
            .get(&document)
            .ok_or(LedgerError::UnknownDocument(document))
    }

    fn record_mut(&mut self, document: DocumentId) -> Result<&mut DocumentRecord> {
        self.documents
            .get_mut(&document)
            .ok_or(LedgerError::UnknownDocument(document))
    }
}
