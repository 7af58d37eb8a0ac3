//! # SecureDocs
//!
//! Encrypt a document once, store the ciphertext in a content-addressed blob
//! store, and share the same ciphertext with more recipients without
//! re-encrypting or re-uploading it.
//!
//! ## Overview
//!
//! - **Register**: a fresh content key encrypts the document; the blob is
//!   stored, fingerprinted, and recorded on the ledger together with the
//!   content key wrapped for the owner.
//! - **Grant**: the owner unwraps their copy of the content key and wraps it
//!   again for the recipient's pasted public key.
//! - **Retrieve**: a grantee fetches the blob, checks it against the recorded
//!   fingerprint, unwraps their copy of the key and decrypts.
//!
//! Neither the blob store nor the ledger ever sees plaintext or a private key.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use securedocs::core::{Identity, OsRandom};
//! use securedocs::ledger::MemoryLedger;
//! use securedocs::store::{GatewayConfig, HttpBlobStore, SqliteKvStore};
//! use securedocs::{DocumentSharing, SharingConfig};
//!
//! async fn example(me: Identity) {
//!     let ledger = MemoryLedger::new();
//!     let blobs = HttpBlobStore::new(GatewayConfig::from_env()).unwrap();
//!     let local = SqliteKvStore::open("securedocs.db").unwrap();
//!
//!     let sharing = DocumentSharing::new(
//!         ledger.connect(me),
//!         blobs,
//!         local,
//!         Arc::new(OsRandom),
//!         SharingConfig::default(),
//!     )
//!     .unwrap();
//!
//!     let doc = sharing.register(b"hello world", "hello.txt").await.unwrap();
//!     let back = sharing.retrieve(doc.id).await.unwrap();
//!     assert_eq!(back.plaintext, b"hello world");
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `securedocs::core` - Cipher, key wrapping, fingerprints, identifiers
//! - `securedocs::store` - Local key-value store and blob stores
//! - `securedocs::ledger` - Access ledger contract and in-memory ledger

pub mod config;
pub mod error;
pub mod keys;
pub mod sharing;

pub use securedocs_core as core;
pub use securedocs_ledger as ledger;
pub use securedocs_store as store;

pub use config::SharingConfig;
pub use error::{ErrorKind, FlowStep, Result, SharingError};
pub use keys::{keypair_entry, IdentityKeys, KeypairManager};
pub use sharing::{name_hint_entry, DocumentSharing, RegisteredDocument, RetrievedDocument};
