//! Error types for SecureDocs core primitives.

use thiserror::Error;

/// Errors raised by the cryptographic primitives and identifier parsers.
///
/// `AuthenticationFailure` and `UnwrapFailure` intentionally carry no detail:
/// callers must not be able to tell a wrong key from tampered bytes.
#[derive(Debug, Error)]
pub enum CoreError {
    /// AEAD tag check failed while decrypting content.
    #[error("authentication failure")]
    AuthenticationFailure,

    /// The wrapped content key could not be recovered.
    #[error("unwrap failure")]
    UnwrapFailure,

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("modulus of {0} bits is below the {}-bit minimum", crate::keywrap::MIN_MODULUS_BITS)]
    WeakModulus(usize),

    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("malformed blob: {0}")]
    MalformedBlob(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid blob locator: {0}")]
    InvalidLocator(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
