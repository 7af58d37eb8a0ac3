//! # SecureDocs Ledger
//!
//! The access ledger is the external system of record for document
//! ownership and grants. This crate defines its contract and ships an
//! in-memory implementation for tests and local use.
//!
//! ## Key Concepts
//!
//! - **Register**: records `{owner, locator, fingerprint, created_at}` plus the
//!   owner's own wrapped key. Metadata never changes afterwards.
//! - **Grant**: the owner stores a content key wrapped for a recipient.
//!   Re-granting overwrites the stored key and reactivates access.
//! - **Revoke**: the owner marks a grant inactive. Keys a recipient already
//!   unwrapped are out of the ledger's reach.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use securedocs_core::Identity;
//! use securedocs_ledger::{AccessLedger, MemoryLedger};
//!
//! async fn example(owner: Identity) {
//!     let ledger = MemoryLedger::new();
//!     let client = ledger.connect(owner);
//!     let next = client.next_id().await.unwrap();
//! }
//! ```

pub mod error;
pub mod memory;
pub mod record;
pub mod state;
pub mod traits;

pub use error::{LedgerError, Result};
pub use memory::{MemoryLedger, MemoryLedgerClient};
pub use record::{AccessState, DocumentMetadata, GrantEntry};
pub use state::LedgerState;
pub use traits::AccessLedger;
