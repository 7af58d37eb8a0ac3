//! Symmetric content encryption.
//!
//! A document is encrypted once under a fresh [`ContentKey`] with a fresh
//! [`Nonce`]. The stored unit is an [`EncryptedBlob`]:
//!
//! ```text
//! nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! The nonce travels with the blob so any holder of the content key can
//! decrypt it without further metadata.

use std::fmt;

use aes_gcm::Aes256Gcm;
use bytes::{BufMut, Bytes, BytesMut};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::ChaCha20Poly1305;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CoreError, Result};
use crate::random::SecureRandomSource;

/// Content key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// Nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// AEAD tag length in bytes.
pub const TAG_LEN: usize = 16;

/// A 256-bit symmetric key for one document.
///
/// Never persisted in the clear; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ContentKey([u8; KEY_LEN]);

impl ContentKey {
    /// Generate a fresh key from the given random source.
    pub fn generate(random: &dyn SecureRandomSource) -> Self {
        let mut bytes = [0u8; KEY_LEN];
        random.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, failing unless it is exactly 32 bytes.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(..)")
    }
}

/// A 96-bit AEAD nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce(pub [u8; NONCE_LEN]);

impl Nonce {
    /// Generate a fresh nonce from the given random source.
    pub fn generate(random: &dyn SecureRandomSource) -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        random.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// The AEAD construction used for content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CipherSuite {
    /// AES-256-GCM. Matches blobs written by the browser client.
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    /// ChaCha20-Poly1305 with a 256-bit key.
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl CipherSuite {
    /// Encrypt `plaintext`, returning `ciphertext || tag`.
    pub fn encrypt(&self, key: &ContentKey, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
        let result = match self {
            CipherSuite::Aes256Gcm => Aes256Gcm::new_from_slice(key.as_bytes())
                .map_err(|e| CoreError::Encryption(e.to_string()))?
                .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), plaintext),
            CipherSuite::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.as_bytes())
                .map_err(|e| CoreError::Encryption(e.to_string()))?
                .encrypt(chacha20poly1305::Nonce::from_slice(nonce.as_bytes()), plaintext),
        };

        result.map_err(|e| CoreError::Encryption(e.to_string()))
    }

    /// Decrypt `ciphertext || tag`.
    ///
    /// Any failure, including a bad key length, surfaces as
    /// [`CoreError::AuthenticationFailure`].
    pub fn decrypt(&self, key: &ContentKey, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let result = match self {
            CipherSuite::Aes256Gcm => Aes256Gcm::new_from_slice(key.as_bytes())
                .map_err(|_| CoreError::AuthenticationFailure)?
                .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), ciphertext),
            CipherSuite::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.as_bytes())
                .map_err(|_| CoreError::AuthenticationFailure)?
                .decrypt(chacha20poly1305::Nonce::from_slice(nonce.as_bytes()), ciphertext),
        };

        result.map_err(|_| CoreError::AuthenticationFailure)
    }
}

/// `nonce || ciphertext || tag`, the unit persisted to the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Bytes);

impl EncryptedBlob {
    /// Smallest valid blob: a nonce and a tag around empty plaintext.
    pub const MIN_LEN: usize = NONCE_LEN + TAG_LEN;

    /// Encrypt `plaintext` and pack the result with its nonce.
    pub fn seal(
        suite: CipherSuite,
        key: &ContentKey,
        nonce: Nonce,
        plaintext: &[u8],
    ) -> Result<Self> {
        let ciphertext = suite.encrypt(key, &nonce, plaintext)?;

        let mut buf = BytesMut::with_capacity(NONCE_LEN + ciphertext.len());
        buf.put_slice(nonce.as_bytes());
        buf.put_slice(&ciphertext);
        Ok(Self(buf.freeze()))
    }

    /// Wrap bytes fetched from the blob store.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.len() < Self::MIN_LEN {
            return Err(CoreError::MalformedBlob(format!(
                "expected at least {} bytes, got {}",
                Self::MIN_LEN,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// The nonce prefix.
    pub fn nonce(&self) -> Nonce {
        let mut arr = [0u8; NONCE_LEN];
        arr.copy_from_slice(&self.0[..NONCE_LEN]);
        Nonce(arr)
    }

    /// The ciphertext and tag following the nonce.
    pub fn ciphertext(&self) -> &[u8] {
        &self.0[NONCE_LEN..]
    }

    /// Decrypt with the given key.
    pub fn open(&self, suite: CipherSuite, key: &ContentKey) -> Result<Vec<u8>> {
        suite.decrypt(key, &self.nonce(), self.ciphertext())
    }

    /// The exact persisted bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Cheap clone of the persisted bytes.
    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandom;

    const SUITES: [CipherSuite; 2] = [CipherSuite::Aes256Gcm, CipherSuite::ChaCha20Poly1305];

    fn random() -> SeededRandom {
        SeededRandom::from_seed([0x42; 32])
    }

    #[test]
    fn test_encrypt_decrypt() {
        let random = random();
        for suite in SUITES {
            let key = ContentKey::generate(&random);
            let nonce = Nonce::generate(&random);
            let plaintext = b"hello, world!";

            let ciphertext = suite.encrypt(&key, &nonce, plaintext).unwrap();
            assert_eq!(ciphertext.len(), plaintext.len() + TAG_LEN);
            assert_ne!(&ciphertext[..plaintext.len()], plaintext);

            let decrypted = suite.decrypt(&key, &nonce, &ciphertext).unwrap();
            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let random = random();
        for suite in SUITES {
            let key1 = ContentKey::generate(&random);
            let key2 = ContentKey::generate(&random);
            let nonce = Nonce::generate(&random);

            let ciphertext = suite.encrypt(&key1, &nonce, b"secret").unwrap();

            assert!(matches!(
                suite.decrypt(&key2, &nonce, &ciphertext),
                Err(CoreError::AuthenticationFailure)
            ));
        }
    }

    #[test]
    fn test_every_single_bit_flip_fails() {
        let random = random();
        let key = ContentKey::generate(&random);
        let nonce = Nonce::generate(&random);
        let ciphertext = CipherSuite::Aes256Gcm
            .encrypt(&key, &nonce, b"tamper me")
            .unwrap();

        // Covers both ciphertext and tag bytes.
        for byte in 0..ciphertext.len() {
            for bit in 0..8 {
                let mut tampered = ciphertext.clone();
                tampered[byte] ^= 1 << bit;
                assert!(matches!(
                    CipherSuite::Aes256Gcm.decrypt(&key, &nonce, &tampered),
                    Err(CoreError::AuthenticationFailure)
                ));
            }
        }
    }

    #[test]
    fn test_blob_layout() {
        let random = random();
        let key = ContentKey::generate(&random);
        let nonce = Nonce::generate(&random);

        let blob = EncryptedBlob::seal(CipherSuite::Aes256Gcm, &key, nonce, b"abc").unwrap();

        assert_eq!(blob.len(), NONCE_LEN + 3 + TAG_LEN);
        assert_eq!(&blob.as_bytes()[..NONCE_LEN], nonce.as_bytes());
        assert_eq!(blob.nonce(), nonce);
        assert_eq!(blob.open(CipherSuite::Aes256Gcm, &key).unwrap(), b"abc");
    }

    #[test]
    fn test_blob_from_fetched_bytes() {
        let random = random();
        let key = ContentKey::generate(&random);
        let blob = EncryptedBlob::seal(
            CipherSuite::ChaCha20Poly1305,
            &key,
            Nonce::generate(&random),
            b"",
        )
        .unwrap();

        let fetched = EncryptedBlob::from_bytes(blob.as_bytes().to_vec()).unwrap();
        assert_eq!(fetched, blob);
        assert!(fetched.open(CipherSuite::ChaCha20Poly1305, &key).unwrap().is_empty());
    }

    #[test]
    fn test_short_blob_rejected() {
        let err = EncryptedBlob::from_bytes(vec![0u8; EncryptedBlob::MIN_LEN - 1]).unwrap_err();
        assert!(matches!(err, CoreError::MalformedBlob(_)));
    }

    #[test]
    fn test_suite_mismatch_fails_closed() {
        let random = random();
        let key = ContentKey::generate(&random);
        let blob = EncryptedBlob::seal(
            CipherSuite::Aes256Gcm,
            &key,
            Nonce::generate(&random),
            b"data",
        )
        .unwrap();

        assert!(matches!(
            blob.open(CipherSuite::ChaCha20Poly1305, &key),
            Err(CoreError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_content_key_debug_is_redacted() {
        let key = ContentKey::from_bytes([0xab; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "ContentKey(..)");
    }

    #[test]
    fn test_suite_serde_names() {
        let json = serde_json::to_string(&CipherSuite::Aes256Gcm).unwrap();
        assert_eq!(json, "\"aes-256-gcm\"");

        let suite: CipherSuite = serde_json::from_str("\"chacha20-poly1305\"").unwrap();
        assert_eq!(suite, CipherSuite::ChaCha20Poly1305);
    }
}
