//! Test fixtures and helpers.
//!
//! A [`TestWorld`] is one shared ledger and one shared blob store. Each
//! party gets its own local key store and a ledger connection signing as
//! its own identity, the way separate wallets and browsers would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use securedocs::{keypair_entry, DocumentSharing, SharingConfig};
use securedocs_core::{Identity, KeyKind, KeyPair, OsRandom, SeededRandom};
use securedocs_ledger::{MemoryLedger, MemoryLedgerClient};
use securedocs_store::{KeyValueStore, MemoryBlobStore, MemoryKvStore};

/// Modulus used by every fixture keypair.
pub const TEST_MODULUS_BITS: usize = 2048;

/// An orchestrator wired to in-memory collaborators.
pub type Party = DocumentSharing<MemoryLedgerClient, Arc<MemoryBlobStore>, Arc<MemoryKvStore>>;

/// A config with test-sized keys and short timeouts.
pub fn fast_config() -> SharingConfig {
    SharingConfig {
        modulus_bits: TEST_MODULUS_BITS,
        call_timeout_secs: 5,
        ..SharingConfig::default()
    }
}

/// Deterministic identity for party number `n`.
pub fn identity(n: u8) -> Identity {
    let mut bytes = [n; 20];
    bytes[0] = 0x5d;
    Identity::from_bytes(bytes)
}

/// PEM keypair for party number `n`, generated once per process.
///
/// RSA key generation dominates test time; caching lets every scenario
/// start from already-provisioned parties.
pub fn cached_pems(n: u8) -> (String, String) {
    static CACHE: OnceLock<Mutex<HashMap<u8, (String, String)>>> = OnceLock::new();

    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().unwrap_or_else(|e| e.into_inner());
    cache
        .entry(n)
        .or_insert_with(|| {
            let pair = KeyPair::generate(&SeededRandom::from_seed([n; 32]), TEST_MODULUS_BITS)
                .expect("fixture key generation");
            (
                pair.public().to_pem().expect("fixture public PEM"),
                pair.private().to_pem().expect("fixture private PEM"),
            )
        })
        .clone()
}

/// Write party `n`'s cached keypair into `store`.
pub async fn provision(store: &impl KeyValueStore, n: u8) {
    let (public, private) = cached_pems(n);
    let who = identity(n);
    store
        .insert_all_if_absent(&[
            (keypair_entry(&who, KeyKind::Public), public),
            (keypair_entry(&who, KeyKind::Private), private),
        ])
        .await
        .expect("provision fixture keypair");
}

/// Shared ledger and blob store for a multi-party scenario.
pub struct TestWorld {
    pub ledger: MemoryLedger,
    pub blobs: Arc<MemoryBlobStore>,
    pub config: SharingConfig,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::with_config(fast_config())
    }

    pub fn with_config(config: SharingConfig) -> Self {
        Self {
            ledger: MemoryLedger::new(),
            blobs: Arc::new(MemoryBlobStore::new()),
            config,
        }
    }

    /// Party `n` with a fresh local store holding its cached keypair.
    pub async fn party(&self, n: u8) -> Party {
        let local = Arc::new(MemoryKvStore::new());
        provision(local.as_ref(), n).await;
        self.party_with_store(n, local)
    }

    /// Party `n` using the given local store as is.
    pub fn party_with_store(&self, n: u8, local: Arc<MemoryKvStore>) -> Party {
        DocumentSharing::new(
            self.ledger.connect(identity(n)),
            self.blobs.clone(),
            local,
            Arc::new(OsRandom),
            self.config.clone(),
        )
        .expect("fixture config is valid")
    }

    /// The exported public key of party `n`.
    pub fn public_pem(&self, n: u8) -> String {
        cached_pems(n).0
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// A world with `count` provisioned parties, numbered from 1.
pub async fn multi_party_world(count: u8) -> (TestWorld, Vec<Party>) {
    let world = TestWorld::new();
    let mut parties = Vec::with_capacity(count as usize);
    for n in 1..=count {
        parties.push(world.party(n).await);
    }
    (world, parties)
}
