//! Proptest generators for property-based testing.

use proptest::prelude::*;

use securedocs_core::{
    BlobLocator, CipherSuite, ContentKey, DocumentId, Fingerprint, Identity, Nonce,
};

/// Generate a random Identity.
pub fn identity() -> impl Strategy<Value = Identity> {
    any::<[u8; 20]>().prop_map(Identity::from_bytes)
}

/// Generate a random ContentKey.
pub fn content_key() -> impl Strategy<Value = ContentKey> {
    any::<[u8; 32]>().prop_map(ContentKey::from_bytes)
}

/// Generate a random Nonce.
pub fn nonce() -> impl Strategy<Value = Nonce> {
    any::<[u8; 12]>().prop_map(Nonce::from_bytes)
}

/// Generate a random Fingerprint.
pub fn fingerprint() -> impl Strategy<Value = Fingerprint> {
    any::<[u8; 32]>().prop_map(Fingerprint::from_bytes)
}

/// Generate a document id as the ledger assigns them (from 1).
pub fn document_id() -> impl Strategy<Value = DocumentId> {
    (1u64..=1_000_000).prop_map(DocumentId::new)
}

/// Generate a content-identifier-like locator.
pub fn locator() -> impl Strategy<Value = BlobLocator> {
    "bafy[a-z2-7]{20,52}".prop_map(|s| BlobLocator::new(s).expect("pattern is non-empty"))
}

/// Generate either cipher suite.
pub fn cipher_suite() -> impl Strategy<Value = CipherSuite> {
    prop_oneof![Just(CipherSuite::Aes256Gcm), Just(CipherSuite::ChaCha20Poly1305)]
}

/// Generate document bytes of at most `max_len`.
pub fn plaintext(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a file name.
pub fn document_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,24}\\.(txt|pdf|png|bin)".prop_map(String::from)
}
