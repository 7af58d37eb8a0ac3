//! Error types for the store module.

use thiserror::Error;

/// Errors from the local key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The store refused the write.
    #[error("write rejected for key {0}")]
    WriteRejected(String),

    /// A blocking worker panicked or was cancelled.
    #[error("store task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for key-value store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from blob storage.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The pinning service answered with a non-success status.
    #[error("upload rejected with status {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("upload response did not contain a locator: {0}")]
    MissingLocator(String),

    /// Every configured gateway failed; one entry per attempt.
    #[error("fetch failed on all gateways:\n{}", .0.join("\n"))]
    AllGatewaysFailed(Vec<String>),

    /// No bearer token is configured for uploads.
    #[error("missing pinning credentials: set {0}")]
    MissingCredentials(&'static str),

    #[error("invalid locator: {0}")]
    InvalidLocator(#[from] securedocs_core::CoreError),

    /// A gateway response exceeded the configured size limit.
    #[error("response exceeds the {limit}-byte limit")]
    TooLarge { limit: u64 },

    /// The store is unreachable.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),
}

impl BlobError {
    /// Whether this failure is a local misconfiguration rather than a
    /// transport problem.
    pub fn is_configuration(&self) -> bool {
        matches!(self, BlobError::MissingCredentials(_) | BlobError::UrlParse(_))
    }
}

/// Result type for blob operations.
pub type BlobResult<T> = std::result::Result<T, BlobError>;
