//! Keypair manager: one RSA keypair per identity, created lazily.
//!
//! Keypairs are persisted as PEM text in the local [`KeyValueStore`] under
//! `keypair:<identity>:public` and `keypair:<identity>:private`. They are
//! never rotated automatically and only removed by [`KeypairManager::delete_keypair`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use securedocs_core::{Identity, KeyKind, KeyPair, PrivateKey, PublicKey, SecureRandomSource};
use securedocs_store::{InsertResult, KeyValueStore};

use crate::error::{AtStep, FlowStep, Result, SharingError};

const KEYPAIR_PREFIX: &str = "keypair:";

/// Persistence key for one half of an identity's keypair.
pub fn keypair_entry(identity: &Identity, kind: KeyKind) -> String {
    format!("{}{}:{}", KEYPAIR_PREFIX, identity, kind.as_str())
}

/// An identity's loaded keypair.
#[derive(Debug, Clone)]
pub struct IdentityKeys {
    pub identity: Identity,
    pub public: PublicKey,
    pub private: PrivateKey,
    /// The exportable public key, byte-identical across loads.
    pub public_pem: String,
}

/// Creates, loads and deletes per-identity keypairs.
pub struct KeypairManager<K> {
    store: K,
    random: Arc<dyn SecureRandomSource>,
    modulus_bits: usize,
    locks: Mutex<HashMap<Identity, Arc<tokio::sync::Mutex<()>>>>,
}

impl<K: KeyValueStore> KeypairManager<K> {
    pub fn new(store: K, random: Arc<dyn SecureRandomSource>, modulus_bits: usize) -> Self {
        Self {
            store,
            random,
            modulus_bits,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying key-value store.
    pub fn store(&self) -> &K {
        &self.store
    }

    fn identity_lock(&self, identity: &Identity) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(*identity).or_default().clone()
    }

    /// Load the identity's keypair, generating and persisting one first if
    /// none exists.
    ///
    /// Concurrent first calls for one identity are serialized, and the
    /// persisting write only succeeds if neither entry exists yet, so every
    /// caller (in this process or another sharing the store) ends up with the
    /// first writer's keys.
    pub async fn ensure_keypair(&self, identity: &Identity) -> Result<IdentityKeys> {
        let lock = self.identity_lock(identity);
        let _guard = lock.lock().await;

        if let Some(keys) = self.load_keypair(identity).await? {
            return Ok(keys);
        }

        let random = self.random.clone();
        let bits = self.modulus_bits;
        let pair = tokio::task::spawn_blocking(move || KeyPair::generate(random.as_ref(), bits))
            .await
            .map_err(|e| SharingError::Internal(format!("key generation task failed: {}", e)))?
            .map_err(|e| e.at(FlowStep::EnsureKeypair))?;

        let public_pem = pair.public().to_pem().map_err(|e| e.at(FlowStep::EnsureKeypair))?;
        let private_pem = pair.private().to_pem().map_err(|e| e.at(FlowStep::EnsureKeypair))?;

        let entries = [
            (keypair_entry(identity, KeyKind::Public), public_pem.clone()),
            (keypair_entry(identity, KeyKind::Private), private_pem),
        ];

        match self.store.insert_all_if_absent(&entries).await? {
            InsertResult::Inserted => {
                tracing::info!(%identity, bits, "generated keypair");
                let (public, private) = pair.into_parts();
                Ok(IdentityKeys {
                    identity: *identity,
                    public,
                    private,
                    public_pem,
                })
            }
            InsertResult::AlreadyExists => {
                tracing::debug!(%identity, "keypair written concurrently, using stored one");
                self.load_keypair(identity)
                    .await?
                    .ok_or_else(|| SharingError::CorruptKeypair {
                        identity: *identity,
                        reason: "keypair vanished after a concurrent write".into(),
                    })
            }
        }
    }

    /// Load the identity's keypair without generating one.
    pub async fn load_keypair(&self, identity: &Identity) -> Result<Option<IdentityKeys>> {
        let public = self
            .store
            .get(&keypair_entry(identity, KeyKind::Public))
            .await?;
        let private = self
            .store
            .get(&keypair_entry(identity, KeyKind::Private))
            .await?;

        let corrupt = |reason: String| SharingError::CorruptKeypair {
            identity: *identity,
            reason,
        };

        match (public, private) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(corrupt("private key entry is missing".into())),
            (None, Some(_)) => Err(corrupt("public key entry is missing".into())),
            (Some(public_pem), Some(private_pem)) => {
                let public = PublicKey::from_pem(&public_pem).map_err(|e| corrupt(e.to_string()))?;
                let private =
                    PrivateKey::from_pem(&private_pem).map_err(|e| corrupt(e.to_string()))?;

                if private.public_key() != public {
                    return Err(corrupt("public and private entries do not match".into()));
                }

                Ok(Some(IdentityKeys {
                    identity: *identity,
                    public,
                    private,
                    public_pem,
                }))
            }
        }
    }

    /// Remove the identity's keypair. Returns whether anything was removed.
    ///
    /// Documents wrapped for the deleted key become unreadable for this
    /// identity.
    pub async fn delete_keypair(&self, identity: &Identity) -> Result<bool> {
        let lock = self.identity_lock(identity);
        let guard = lock.lock().await;

        let public = self
            .store
            .delete(&keypair_entry(identity, KeyKind::Public))
            .await?;
        let private = self
            .store
            .delete(&keypair_entry(identity, KeyKind::Private))
            .await?;

        drop(guard);
        self.release_lock(identity, lock);

        if public || private {
            tracing::info!(%identity, "deleted keypair");
        }
        Ok(public || private)
    }

    /// Identities with a stored public key, sorted.
    ///
    /// Entries whose identity segment does not parse are skipped.
    pub async fn identities(&self) -> Result<Vec<Identity>> {
        let keys = self.store.keys_with_prefix(KEYPAIR_PREFIX).await?;
        let suffix = format!(":{}", KeyKind::Public.as_str());

        Ok(keys
            .iter()
            .filter_map(|key| key.strip_prefix(KEYPAIR_PREFIX)?.strip_suffix(suffix.as_str()))
            .filter_map(|id| id.parse().ok())
            .collect())
    }

    /// Forget the identity's lock unless another caller still holds it.
    fn release_lock(&self, identity: &Identity, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(identity);
        }
    }
}
