//! Error types for the sharing flows.

use std::fmt;
use std::time::Duration;

use securedocs_core::{CoreError, DocumentId, Fingerprint, Identity};
use securedocs_ledger::LedgerError;
use securedocs_store::{BlobError, StoreError};
use thiserror::Error;

/// The step of a flow at which an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowStep {
    EnsureKeypair,
    Encrypt,
    UploadBlob,
    Wrap,
    Register,
    ReadMetadata,
    ReadWrappedKey,
    Unwrap,
    ImportRecipientKey,
    Grant,
    Revoke,
    FetchBlob,
    VerifyFingerprint,
    Decrypt,
    ReadSharedWith,
    CheckIntegrity,
}

impl FlowStep {
    /// Steps that only read remote state. Repeating them has no effect.
    pub const fn is_read(self) -> bool {
        matches!(
            self,
            FlowStep::ReadMetadata
                | FlowStep::ReadWrappedKey
                | FlowStep::FetchBlob
                | FlowStep::ReadSharedWith
                | FlowStep::CheckIntegrity
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FlowStep::EnsureKeypair => "ensure-keypair",
            FlowStep::Encrypt => "encrypt",
            FlowStep::UploadBlob => "upload-blob",
            FlowStep::Wrap => "wrap",
            FlowStep::Register => "register",
            FlowStep::ReadMetadata => "read-metadata",
            FlowStep::ReadWrappedKey => "read-wrapped-key",
            FlowStep::Unwrap => "unwrap",
            FlowStep::ImportRecipientKey => "import-recipient-key",
            FlowStep::Grant => "grant",
            FlowStep::Revoke => "revoke",
            FlowStep::FetchBlob => "fetch-blob",
            FlowStep::VerifyFingerprint => "verify-fingerprint",
            FlowStep::Decrypt => "decrypt",
            FlowStep::ReadSharedWith => "read-shared-with",
            FlowStep::CheckIntegrity => "check-integrity",
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`SharingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Fatal misconfiguration. Do not retry.
    Configuration,
    /// Transport failure or timeout.
    Network,
    /// The caller is not allowed to do this.
    Authorization,
    /// Stored bytes do not match the registered fingerprint.
    Integrity,
    /// Tag or unwrap failure. Wrong key and tampering look the same.
    Authentication,
    /// Malformed input or a rejected ledger call.
    InvalidInput,
    /// The local key store failed or holds corrupt entries.
    LocalStorage,
    /// Key generation failure or a panicked worker.
    Internal,
}

/// Errors returned by the sharing flows.
#[derive(Debug, Error)]
pub enum SharingError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{caller} is not the owner of document {document}")]
    NotOwner {
        document: DocumentId,
        caller: Identity,
    },

    #[error("{caller} holds no grant for document {document}")]
    NoGrantForCaller {
        document: DocumentId,
        caller: Identity,
    },

    /// The fetched blob does not hash to the registered fingerprint.
    #[error("integrity mismatch on document {document}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        document: DocumentId,
        expected: Fingerprint,
        actual: Fingerprint,
    },

    #[error("authentication failure during {step}")]
    AuthenticationFailure { step: FlowStep },

    #[error("{step} timed out after {after:?}")]
    Timeout { step: FlowStep, after: Duration },

    #[error("ledger call failed during {step}: {source}")]
    Ledger {
        step: FlowStep,
        #[source]
        source: LedgerError,
    },

    #[error("blob store failed during {step}: {source}")]
    Blob {
        step: FlowStep,
        #[source]
        source: BlobError,
    },

    #[error("local key store failed: {0}")]
    KeyStore(#[from] StoreError),

    /// A persisted keypair is unreadable or only half present.
    #[error("stored keypair for {identity} is corrupt: {reason}")]
    CorruptKeypair { identity: Identity, reason: String },

    #[error("invalid recipient public key: {0}")]
    InvalidRecipientKey(#[source] CoreError),

    #[error("crypto failure during {step}: {source}")]
    Crypto {
        step: FlowStep,
        #[source]
        source: CoreError,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl SharingError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SharingError::Configuration(_) => ErrorKind::Configuration,
            SharingError::NotOwner { .. } | SharingError::NoGrantForCaller { .. } => {
                ErrorKind::Authorization
            }
            SharingError::IntegrityMismatch { .. } => ErrorKind::Integrity,
            SharingError::AuthenticationFailure { .. } => ErrorKind::Authentication,
            SharingError::Timeout { .. } => ErrorKind::Network,
            SharingError::Ledger { source, .. } => match source {
                LedgerError::Unavailable(_) => ErrorKind::Network,
                LedgerError::NotOwner { .. } => ErrorKind::Authorization,
                LedgerError::UnknownDocument(_)
                | LedgerError::CannotRevokeOwner(_)
                | LedgerError::Reverted(_) => ErrorKind::InvalidInput,
            },
            SharingError::Blob { source, .. } => match source {
                e if e.is_configuration() => ErrorKind::Configuration,
                BlobError::InvalidLocator(_) => ErrorKind::InvalidInput,
                _ => ErrorKind::Network,
            },
            SharingError::KeyStore(_) | SharingError::CorruptKeypair { .. } => {
                ErrorKind::LocalStorage
            }
            SharingError::InvalidRecipientKey(_) => ErrorKind::InvalidInput,
            SharingError::Crypto { source, .. } => match source {
                CoreError::MalformedBlob(_) => ErrorKind::Integrity,
                CoreError::WeakModulus(_) => ErrorKind::Configuration,
                _ => ErrorKind::Internal,
            },
            SharingError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The flow step that failed, when known.
    pub fn step(&self) -> Option<FlowStep> {
        match self {
            SharingError::AuthenticationFailure { step }
            | SharingError::Timeout { step, .. }
            | SharingError::Ledger { step, .. }
            | SharingError::Blob { step, .. }
            | SharingError::Crypto { step, .. } => Some(*step),
            SharingError::NotOwner { .. } => Some(FlowStep::ReadMetadata),
            SharingError::NoGrantForCaller { .. } => Some(FlowStep::ReadWrappedKey),
            SharingError::IntegrityMismatch { .. } => Some(FlowStep::VerifyFingerprint),
            SharingError::KeyStore(_) | SharingError::CorruptKeypair { .. } => {
                Some(FlowStep::EnsureKeypair)
            }
            SharingError::InvalidRecipientKey(_) => Some(FlowStep::ImportRecipientKey),
            SharingError::Configuration(_) | SharingError::Internal(_) => None,
        }
    }

    /// True only for network failures on steps that read remote state.
    /// Ledger writes are never retried blindly: a timed-out write may still
    /// confirm later.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network && self.step().is_some_and(FlowStep::is_read)
    }
}

/// Attach the failing step to a collaborator error.
pub(crate) trait AtStep {
    fn at(self, step: FlowStep) -> SharingError;
}

impl AtStep for LedgerError {
    fn at(self, step: FlowStep) -> SharingError {
        match self {
            LedgerError::NotOwner { document, caller } => {
                SharingError::NotOwner { document, caller }
            }
            source => SharingError::Ledger { step, source },
        }
    }
}

impl AtStep for BlobError {
    fn at(self, step: FlowStep) -> SharingError {
        SharingError::Blob { step, source: self }
    }
}

impl AtStep for CoreError {
    fn at(self, step: FlowStep) -> SharingError {
        match self {
            CoreError::AuthenticationFailure | CoreError::UnwrapFailure => {
                SharingError::AuthenticationFailure { step }
            }
            source => SharingError::Crypto { step, source },
        }
    }
}

/// Result type for sharing operations.
pub type Result<T> = std::result::Result<T, SharingError>;
