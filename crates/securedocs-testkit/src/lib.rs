//! # SecureDocs Testkit
//!
//! Testing utilities for SecureDocs.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Published SHA-256 and AES-256-GCM cases pinning the blob layout
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A shared in-memory world with pre-provisioned parties
//!
//! ## Golden Vectors
//!
//! ```rust
//! use securedocs_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use securedocs_core::{CipherSuite, EncryptedBlob};
//! use securedocs_testkit::generators::{content_key, nonce, plaintext};
//!
//! proptest! {
//!     #[test]
//!     fn blob_roundtrip(key in content_key(), nonce in nonce(), data in plaintext(512)) {
//!         let blob = EncryptedBlob::seal(CipherSuite::Aes256Gcm, &key, nonce, &data).unwrap();
//!         prop_assert_eq!(blob.open(CipherSuite::Aes256Gcm, &key).unwrap(), data);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use securedocs_testkit::fixtures::TestWorld;
//!
//! let world = TestWorld::new();
//! let alice = world.party(1).await;
//! let doc = alice.register(b"hello world", "hello.txt").await?;
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fast_config, identity, multi_party_world, Party, TestWorld};
pub use vectors::{cipher_vectors, fingerprint_vectors, verify_all_vectors};
