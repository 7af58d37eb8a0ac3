//! # SecureDocs Store
//!
//! Storage abstractions for SecureDocs: a local key-value store for keypairs
//! and name hints, and a blob store for encrypted documents.
//!
//! ## Key Types
//!
//! - [`KeyValueStore`] - Async trait for local string persistence
//! - [`SqliteKvStore`] - SQLite-based persistent implementation
//! - [`MemoryKvStore`] - In-memory implementation for tests
//! - [`BlobStore`] - Async trait for ciphertext storage
//! - [`HttpBlobStore`] - Pinning service upload, multi-gateway download
//! - [`MemoryBlobStore`] - Content-addressed in-memory implementation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use securedocs_store::{KeyValueStore, SqliteKvStore};
//!
//! async fn example() {
//!     let store = SqliteKvStore::open("securedocs.db").unwrap();
//!     store.set("document:1:name", "report.pdf").await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic first write**: `insert_all_if_absent` never partially writes
//! - **Blob stores see ciphertext only**: nothing here handles keys or plaintext

pub mod error;
pub mod gateway;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{BlobError, BlobResult, Result, StoreError};
pub use gateway::{GatewayConfig, HttpBlobStore, PINNING_TOKEN_ENV};
pub use memory::{MemoryBlobStore, MemoryKvStore};
pub use sqlite::SqliteKvStore;
pub use traits::{BlobStore, InsertResult, KeyValueStore};
