//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use securedocs_core::{CipherSuite, DEFAULT_MODULUS_BITS, MIN_MODULUS_BITS};

use crate::error::{Result, SharingError};

/// Configuration for [`DocumentSharing`](crate::DocumentSharing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharingConfig {
    /// RSA modulus size for newly generated keypairs.
    pub modulus_bits: usize,

    /// Content cipher. Every party sharing documents must agree on it.
    pub cipher: CipherSuite,

    /// Upper bound on each ledger or blob store call, in seconds.
    pub call_timeout_secs: u64,

    /// Name returned by retrieve when no local name hint exists.
    pub fallback_file_name: String,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            modulus_bits: DEFAULT_MODULUS_BITS,
            cipher: CipherSuite::default(),
            call_timeout_secs: 30,
            fallback_file_name: "decrypted.bin".to_string(),
        }
    }
}

impl SharingConfig {
    /// Parse from JSON and validate.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| SharingError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.modulus_bits < MIN_MODULUS_BITS {
            return Err(SharingError::Configuration(format!(
                "modulus_bits must be at least {}, got {}",
                MIN_MODULUS_BITS, self.modulus_bits
            )));
        }
        if self.call_timeout_secs == 0 {
            return Err(SharingError::Configuration(
                "call_timeout_secs must be nonzero".into(),
            ));
        }
        if self.fallback_file_name.trim().is_empty() {
            return Err(SharingError::Configuration(
                "fallback_file_name must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = SharingConfig::default();
        assert_eq!(config.modulus_bits, 4096);
        assert_eq!(config.cipher, CipherSuite::Aes256Gcm);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
        assert_eq!(config.fallback_file_name, "decrypted.bin");
        config.validate().unwrap();
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            SharingConfig::from_json(r#"{ "modulus_bits": 2048, "cipher": "chacha20-poly1305" }"#)
                .unwrap();
        assert_eq!(config.modulus_bits, 2048);
        assert_eq!(config.cipher, CipherSuite::ChaCha20Poly1305);
        assert_eq!(config.call_timeout_secs, 30);
    }

    #[test]
    fn test_weak_modulus_rejected() {
        let err = SharingConfig::from_json(r#"{ "modulus_bits": 1024 }"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SharingConfig {
            call_timeout_secs: 0,
            ..SharingConfig::default()
        };
        assert!(matches!(config.validate(), Err(SharingError::Configuration(_))));
    }

    #[test]
    fn test_unknown_cipher_rejected() {
        assert!(SharingConfig::from_json(r#"{ "cipher": "rot13" }"#).is_err());
    }
}
