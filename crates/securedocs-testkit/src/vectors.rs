//! Golden test vectors for deterministic verification.
//!
//! Blobs written here must stay readable by the browser client, which uses
//! WebCrypto's SHA-256 and AES-GCM. These published vectors pin the byte
//! layout and the primitives.

use securedocs_core::{CipherSuite, ContentKey, EncryptedBlob, Fingerprint, Nonce};

/// A SHA-256 fingerprint vector.
#[derive(Debug, Clone)]
pub struct FingerprintVector {
    pub name: &'static str,
    pub input: &'static [u8],
    /// Expected fingerprint (hex).
    pub expected: &'static str,
}

/// An AES-256-GCM vector with a zero nonce.
#[derive(Debug, Clone)]
pub struct CipherVector {
    pub name: &'static str,
    pub key: [u8; 32],
    pub plaintext: &'static [u8],
    /// Expected ciphertext without the tag (hex).
    pub ciphertext: &'static str,
    /// Expected tag (hex).
    pub tag: &'static str,
}

/// FIPS 180-2 and well-known SHA-256 digests.
pub fn fingerprint_vectors() -> Vec<FingerprintVector> {
    vec![
        FingerprintVector {
            name: "empty input",
            input: b"",
            expected: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        FingerprintVector {
            name: "abc",
            input: b"abc",
            expected: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        FingerprintVector {
            name: "hello world",
            input: b"hello world",
            expected: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        },
    ]
}

/// GCM specification test cases 13 and 14.
pub fn cipher_vectors() -> Vec<CipherVector> {
    vec![
        CipherVector {
            name: "zero key, empty plaintext",
            key: [0u8; 32],
            plaintext: b"",
            ciphertext: "",
            tag: "530f8afbc74536b9a963b4f1c4cb738b",
        },
        CipherVector {
            name: "zero key, one zero block",
            key: [0u8; 32],
            plaintext: &[0u8; 16],
            ciphertext: "cea7403d4d606b6e074ec5d3baf39d18",
            tag: "d0d1c8a799996bf0265b98b5d48ab919",
        },
    ]
}

/// The exact blob bytes a cipher vector must produce: `nonce || ciphertext || tag`.
pub fn expected_blob(vector: &CipherVector) -> Vec<u8> {
    let mut out = vec![0u8; 12];
    out.extend(hex::decode(vector.ciphertext).expect("vector ciphertext is hex"));
    out.extend(hex::decode(vector.tag).expect("vector tag is hex"));
    out
}

/// Verify all vectors. Returns a list of failures.
pub fn verify_all_vectors() -> Vec<String> {
    let mut failures = Vec::new();

    for vector in fingerprint_vectors() {
        let actual = Fingerprint::compute(vector.input).to_hex();
        if actual != vector.expected {
            failures.push(format!(
                "{}: expected {}, got {}",
                vector.name, vector.expected, actual
            ));
        }
    }

    for vector in cipher_vectors() {
        let key = ContentKey::from_bytes(vector.key);
        let sealed = match EncryptedBlob::seal(
            CipherSuite::Aes256Gcm,
            &key,
            Nonce::from_bytes([0u8; 12]),
            vector.plaintext,
        ) {
            Ok(blob) => blob,
            Err(e) => {
                failures.push(format!("{}: seal failed: {}", vector.name, e));
                continue;
            }
        };

        let expected = expected_blob(&vector);
        if sealed.as_bytes() != expected.as_slice() {
            failures.push(format!(
                "{}: expected {}, got {}",
                vector.name,
                hex::encode(&expected),
                hex::encode(sealed.as_bytes())
            ));
            continue;
        }

        match sealed.open(CipherSuite::Aes256Gcm, &key) {
            Ok(plaintext) if plaintext == vector.plaintext => {}
            Ok(_) => failures.push(format!("{}: opened to different bytes", vector.name)),
            Err(e) => failures.push(format!("{}: open failed: {}", vector.name, e)),
        }
    }

    failures
}
