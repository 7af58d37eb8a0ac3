//! Content fingerprints binding a stored blob to its ledger record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::encoding::{from_prefixed_hex, to_prefixed_hex};
use crate::error::{CoreError, Result};

/// A 32-byte SHA-256 digest over the exact bytes of an encrypted blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Compute the fingerprint of the given bytes.
    pub fn compute(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lower-case hex, the ledger's `bytes32` encoding.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }

    /// Parse hex in either case, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = from_prefixed_hex(s)?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidHex(format!("fingerprint must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// Recompute over `data` and compare with this fingerprint.
    pub fn matches(&self, data: &[u8]) -> bool {
        verify(self, &Self::compute(data))
    }
}

/// Exact comparison of a recorded fingerprint with a recomputed one.
pub fn verify(expected: &Fingerprint, actual: &Fingerprint) -> bool {
    expected.0 == actual.0
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..18])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}
