//! Asymmetric wrapping of content keys.
//!
//! A [`ContentKey`] is shared with a recipient by encrypting it under the
//! recipient's RSA public key with OAEP padding (SHA-256 for both the label
//! hash and MGF1). The same content key is wrapped independently for every
//! recipient. Wrapping is randomized, so two wraps of one key for one
//! recipient differ byte-for-byte and both unwrap to the same key.

use std::fmt;

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::cipher::ContentKey;
use crate::encoding::{decode_pem, encode_pem, from_prefixed_hex, to_prefixed_hex, KeyKind};
use crate::error::{CoreError, Result};
use crate::fingerprint::Fingerprint;
use crate::random::{SecureRandomSource, SourceRng};

/// Modulus size used when none is configured.
pub const DEFAULT_MODULUS_BITS: usize = 4096;

/// Smallest modulus accepted for new keypairs.
pub const MIN_MODULUS_BITS: usize = 2048;

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

/// A recipient's public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Wrap a content key for this recipient.
    pub fn wrap(&self, key: &ContentKey, random: &dyn SecureRandomSource) -> Result<WrappedKey> {
        let mut rng = SourceRng::new(random);
        self.0
            .encrypt(&mut rng, oaep(), key.as_bytes())
            .map(WrappedKey)
            .map_err(|e| CoreError::Encryption(e.to_string()))
    }

    /// Export as a `PUBLIC KEY` PEM document (DER SubjectPublicKeyInfo).
    pub fn to_pem(&self) -> Result<String> {
        Ok(encode_pem(KeyKind::Public, &self.to_der()?))
    }

    /// Import a pasted `PUBLIC KEY` PEM document.
    pub fn from_pem(text: &str) -> Result<Self> {
        let der = decode_pem(KeyKind::Public, text)?;
        RsaPublicKey::from_public_key_der(&der)
            .map(Self)
            .map_err(|e| CoreError::InvalidKeyEncoding(e.to_string()))
    }

    fn to_der(&self) -> Result<Vec<u8>> {
        self.0
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| CoreError::InvalidKeyEncoding(e.to_string()))
    }

    /// SHA-256 over the DER encoding, for audit logs.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Ok(Fingerprint::compute(&self.to_der()?))
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(rsa-{})", self.bits())
    }
}

/// An identity's private key.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PrivateKey {
    /// Recover a content key wrapped for this identity.
    ///
    /// Any failure (wrong key, corrupted bytes, padding mismatch, wrong
    /// recovered length) is reported as [`CoreError::UnwrapFailure`] and no
    /// key material is returned.
    pub fn unwrap_key(
        &self,
        wrapped: &WrappedKey,
        random: &dyn SecureRandomSource,
    ) -> Result<ContentKey> {
        let mut rng = SourceRng::new(random);
        let mut raw = self
            .0
            .decrypt_blinded(&mut rng, oaep(), wrapped.as_bytes())
            .map_err(|_| CoreError::UnwrapFailure)?;

        let key = ContentKey::try_from_slice(&raw);
        zeroize::Zeroize::zeroize(&mut raw);
        key.ok_or(CoreError::UnwrapFailure)
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// Export as a `PRIVATE KEY` PEM document (DER PKCS#8).
    pub fn to_pem(&self) -> Result<String> {
        let der = self
            .0
            .to_pkcs8_der()
            .map_err(|e| CoreError::InvalidKeyEncoding(e.to_string()))?;
        Ok(encode_pem(KeyKind::Private, der.as_bytes()))
    }

    /// Import a `PRIVATE KEY` PEM document.
    pub fn from_pem(text: &str) -> Result<Self> {
        let der = decode_pem(KeyKind::Private, text)?;
        RsaPrivateKey::from_pkcs8_der(&der)
            .map(Self)
            .map_err(|e| CoreError::InvalidKeyEncoding(e.to_string()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A public/private keypair for one identity.
#[derive(Debug, Clone)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Generate a new keypair with the given modulus size.
    ///
    /// CPU heavy for large moduli; async callers should run this on a
    /// blocking thread.
    pub fn generate(random: &dyn SecureRandomSource, bits: usize) -> Result<Self> {
        if bits < MIN_MODULUS_BITS {
            return Err(CoreError::WeakModulus(bits));
        }

        let mut rng = SourceRng::new(random);
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CoreError::KeyGeneration(e.to_string()))?;

        Ok(Self::from_private(PrivateKey(private)))
    }

    /// Rebuild a keypair from its private half.
    pub fn from_private(private: PrivateKey) -> Self {
        Self {
            public: private.public_key(),
            private,
        }
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn private(&self) -> &PrivateKey {
        &self.private
    }

    pub fn into_parts(self) -> (PublicKey, PrivateKey) {
        (self.public, self.private)
    }
}

/// A content key encrypted for one recipient.
///
/// On the wire this is a `0x`-prefixed hex byte string whose width equals the
/// recipient's modulus size.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WrappedKey(Vec<u8>);

impl WrappedKey {
    /// Create from raw bytes, rejecting the empty value.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CoreError::InvalidHex("wrapped key is empty".into()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode for the ledger.
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }

    /// Decode a ledger value. `0x` alone means "no grant" and yields `None`.
    pub fn from_hex(s: &str) -> Result<Option<Self>> {
        let bytes = from_prefixed_hex(s)?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self(bytes)))
    }
}

impl fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WrappedKey({} bytes)", self.0.len())
    }
}
