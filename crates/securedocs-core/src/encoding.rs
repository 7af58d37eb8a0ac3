//! Textual encodings that cross trust boundaries.
//!
//! Two formats leave the process:
//!
//! - PEM-style key exports (`-----BEGIN PUBLIC KEY-----`), base64 wrapped at
//!   64 columns with `\n` line endings and no trailing newline. These are what
//!   users copy-paste between identities.
//! - `0x`-prefixed hex byte strings, the ledger's parameter encoding for
//!   fingerprints and wrapped keys.

use pem::{EncodeConfig, LineEnding, Pem};

use crate::error::{CoreError, Result};

/// Which half of a keypair a PEM document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// DER SubjectPublicKeyInfo.
    Public,
    /// DER PKCS#8 PrivateKeyInfo.
    Private,
}

impl KeyKind {
    /// The PEM label, e.g. `PUBLIC KEY`.
    pub const fn label(self) -> &'static str {
        match self {
            KeyKind::Public => "PUBLIC KEY",
            KeyKind::Private => "PRIVATE KEY",
        }
    }

    /// Short name used in persistence keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyKind::Public => "public",
            KeyKind::Private => "private",
        }
    }
}

/// Frame DER bytes as a PEM document of the given kind.
pub fn encode_pem(kind: KeyKind, der: &[u8]) -> String {
    let doc = Pem::new(kind.label(), der.to_vec());
    let config = EncodeConfig::new().set_line_ending(LineEnding::LF);
    pem::encode_config(&doc, config).trim_end().to_string()
}

/// Parse a PEM document, checking that it carries the expected kind.
///
/// Surrounding whitespace is ignored so pasted keys with stray newlines
/// are accepted.
pub fn decode_pem(kind: KeyKind, text: &str) -> Result<Vec<u8>> {
    let doc = pem::parse(text.trim())
        .map_err(|e| CoreError::InvalidKeyEncoding(format!("malformed PEM: {e}")))?;

    if doc.tag() != kind.label() {
        return Err(CoreError::InvalidKeyEncoding(format!(
            "expected {}, found {}",
            kind.label(),
            doc.tag()
        )));
    }

    Ok(doc.into_contents())
}

/// Encode bytes as `0x`-prefixed lower-case hex.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with an optional `0x`/`0X` prefix, in either case.
pub fn from_prefixed_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| CoreError::InvalidHex(e.to_string()))
}
