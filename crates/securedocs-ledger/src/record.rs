//! Records kept by the ledger for each document.

use serde::{Deserialize, Serialize};

use securedocs_core::{BlobLocator, Fingerprint, Identity, WrappedKey};

/// Immutable facts fixed at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// The registering identity. Only the owner may grant or revoke.
    pub owner: Identity,

    /// Where the encrypted blob lives.
    pub locator: BlobLocator,

    /// SHA-256 over the exact stored blob bytes.
    pub fingerprint: Fingerprint,

    /// Registration time, Unix seconds.
    pub created_at: u64,
}

/// Per-recipient access state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessState {
    NoAccess,
    Granted,
}

/// One recipient's wrapped key for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantEntry {
    pub recipient: Identity,

    /// The content key wrapped under the recipient's public key. Kept after
    /// revocation; a re-grant overwrites it.
    pub wrapped_key: WrappedKey,

    pub state: AccessState,

    /// Time of the most recent grant, Unix seconds.
    pub granted_at: u64,
}

impl GrantEntry {
    pub fn is_active(&self) -> bool {
        self.state == AccessState::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json_uses_text_identifiers() {
        let metadata = DocumentMetadata {
            owner: Identity::from_bytes([0xab; 20]),
            locator: BlobLocator::new("bafyexample").unwrap(),
            fingerprint: Fingerprint::compute(b"blob"),
            created_at: 1_700_000_000,
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["owner"], format!("0x{}", "ab".repeat(20)));
        assert_eq!(json["locator"], "bafyexample");

        let back: DocumentMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, metadata);
    }

    #[test]
    fn test_revoked_entry_is_inactive() {
        let mut entry = GrantEntry {
            recipient: Identity::from_bytes([1; 20]),
            wrapped_key: WrappedKey::from_bytes(vec![7; 4]).unwrap(),
            state: AccessState::Granted,
            granted_at: 0,
        };
        assert!(entry.is_active());

        entry.state = AccessState::NoAccess;
        assert!(!entry.is_active());
    }
}
