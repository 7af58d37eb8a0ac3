//! # SecureDocs Core
//!
//! Pure primitives for SecureDocs: content encryption, key wrapping,
//! fingerprints and identifiers.
//!
//! This crate contains no I/O, no storage, no networking. Randomness is
//! injected through [`SecureRandomSource`] so every primitive can be driven
//! deterministically in tests.
//!
//! ## Key Types
//!
//! - [`ContentKey`] - Fresh 256-bit symmetric key, one per document
//! - [`EncryptedBlob`] - `nonce || ciphertext || tag`, the stored form of a document
//! - [`KeyPair`] / [`PublicKey`] / [`PrivateKey`] - RSA-OAEP identities
//! - [`WrappedKey`] - A content key encrypted for one recipient
//! - [`Fingerprint`] - SHA-256 over the encrypted blob
//! - [`Identity`], [`DocumentId`], [`BlobLocator`] - Identifiers

pub mod cipher;
pub mod encoding;
pub mod error;
pub mod fingerprint;
pub mod keywrap;
pub mod random;
pub mod types;

pub use cipher::{CipherSuite, ContentKey, EncryptedBlob, Nonce};
pub use encoding::KeyKind;
pub use error::{CoreError, Result};
pub use fingerprint::Fingerprint;
pub use keywrap::{
    KeyPair, PrivateKey, PublicKey, WrappedKey, DEFAULT_MODULUS_BITS, MIN_MODULUS_BITS,
};
pub use random::{OsRandom, SecureRandomSource, SeededRandom};
pub use types::{BlobLocator, DocumentId, Identity};
