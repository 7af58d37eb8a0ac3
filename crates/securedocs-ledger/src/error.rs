//! Error types for the ledger module.

use securedocs_core::{DocumentId, Identity};
use thiserror::Error;

/// Errors returned by an access ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Only the recorded owner may change a document's grants.
    #[error("not document owner: {caller} on document {document}")]
    NotOwner {
        document: DocumentId,
        caller: Identity,
    },

    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),

    /// The owner's own entry is permanent.
    #[error("cannot revoke the owner of document {0}")]
    CannotRevokeOwner(DocumentId),

    /// The call was rejected for a reason not covered above.
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The ledger could not be reached; nothing was applied.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Whether the failure is a transport problem rather than a rejection.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_))
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
