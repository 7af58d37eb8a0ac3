//! Strong type definitions for SecureDocs identifiers.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::encoding::to_prefixed_hex;
use crate::error::{CoreError, Result};

/// A 20-byte account address naming an owner or a recipient.
///
/// Parsing accepts either hex case; the canonical text form is lower-case
/// with a `0x` prefix, which is also the form used in persistence keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(pub [u8; 20]);

impl Identity {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lower-case `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }

    /// Parse `0x` followed by exactly 40 hex digits.
    pub fn parse(s: &str) -> Result<Self> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| CoreError::InvalidIdentity(format!("missing 0x prefix: {s:?}")))?;

        if digits.len() != 40 {
            return Err(CoreError::InvalidIdentity(format!(
                "expected 40 hex digits, got {}",
                digits.len()
            )));
        }

        let mut arr = [0u8; 20];
        hex::decode_to_slice(digits, &mut arr)
            .map_err(|e| CoreError::InvalidIdentity(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", &self.to_hex()[..10])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Identity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identity {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.to_hex()
    }
}

impl From<[u8; 20]> for Identity {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Ledger-assigned document number. The first document registered is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl DocumentId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DocumentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Opaque address of an encrypted blob in external storage.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobLocator(String);

impl BlobLocator {
    /// Wrap a locator string. Surrounding whitespace is trimmed; the result
    /// must be non-empty.
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidLocator("locator is empty".into()));
        }
        if trimmed.len() == s.len() {
            Ok(Self(s))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobLocator({})", self.0)
    }
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BlobLocator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for BlobLocator {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<BlobLocator> for String {
    fn from(locator: BlobLocator) -> Self {
        locator.0
    }
}

impl AsRef<str> for BlobLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    #[test]
    fn test_identity_parse_normalizes_case() {
        let id = Identity::parse(ADDR).unwrap();
        assert_eq!(id.to_string(), ADDR.to_lowercase());
        assert_eq!(Identity::parse(&ADDR.to_lowercase()).unwrap(), id);
    }

    #[test]
    fn test_identity_rejects_bad_input() {
        assert!(Identity::parse("52908400098527886e0f7030069857d2e4169ee7").is_err());
        assert!(Identity::parse("0x1234").is_err());
        assert!(Identity::parse("0xzz908400098527886e0f7030069857d2e4169ee7").is_err());
    }

    #[test]
    fn test_identity_serde_as_string() {
        let id = Identity::parse(ADDR).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", ADDR.to_lowercase()));

        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_locator_rules() {
        assert!(BlobLocator::new("").is_err());
        assert!(BlobLocator::new("   ").is_err());
        assert_eq!(BlobLocator::new(" bafy \n").unwrap().as_str(), "bafy");
    }

    #[test]
    fn test_document_id_display() {
        assert_eq!(DocumentId::new(7).to_string(), "7");
        assert_eq!(serde_json::to_string(&DocumentId(3)).unwrap(), "3");
    }
}
