//! End-to-end sharing scenarios over in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;

use securedocs::core::{CipherSuite, DocumentId, Fingerprint, OsRandom};
use securedocs::ledger::AccessLedger;
use securedocs::store::{BlobStore, MemoryKvStore, SqliteKvStore};
use securedocs::{DocumentSharing, ErrorKind, FlowStep, SharingConfig, SharingError};
use securedocs_testkit::fixtures::{self, fast_config, identity, TestWorld};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_register_then_retrieve_as_owner() {
    init_tracing();
    let world = TestWorld::new();
    let alice = world.party(1).await;

    let doc = alice.register(b"hello world", "hello.txt").await.unwrap();
    assert_eq!(doc.id, DocumentId::new(1));
    assert_eq!(world.blobs.name_of(&doc.locator).as_deref(), Some("hello.txt.enc"));

    let back = alice.retrieve(doc.id).await.unwrap();
    assert_eq!(back.plaintext, b"hello world");
    assert_eq!(back.name, "hello.txt");
    assert_eq!(alice.shared_with(doc.id).await.unwrap(), vec![identity(1)]);
}

#[tokio::test]
async fn test_each_registration_uses_a_fresh_key() {
    let world = TestWorld::new();
    let alice = world.party(1).await;

    let a = alice.register(b"same bytes", "a.txt").await.unwrap();
    let b = alice.register(b"same bytes", "b.txt").await.unwrap();

    assert_ne!(a.id, b.id);
    assert_ne!(a.fingerprint, b.fingerprint);
    assert_eq!(world.blobs.len(), 2);
}

#[tokio::test]
async fn test_grant_lets_recipient_read_without_reupload() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let bob = world.party(2).await;

    let doc = alice.register(b"quarterly numbers", "q3.csv").await.unwrap();
    let puts = world.blobs.put_count();

    alice
        .grant(doc.id, &identity(2), &bob.public_key_pem().await.unwrap())
        .await
        .unwrap();
    assert_eq!(world.blobs.put_count(), puts);

    let back = bob.retrieve(doc.id).await.unwrap();
    assert_eq!(back.plaintext, b"quarterly numbers");
    // Bob's local store never saw the name hint.
    assert_eq!(back.name, "decrypted.bin");

    assert_eq!(
        alice.shared_with(doc.id).await.unwrap(),
        vec![identity(1), identity(2)]
    );
}

#[tokio::test]
async fn test_third_party_is_refused_before_fetch() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let mallory = world.party(3).await;

    let doc = alice.register(b"private", "p.txt").await.unwrap();
    let fetches = world.blobs.fetch_count();

    let err = mallory.retrieve(doc.id).await.unwrap_err();
    assert!(matches!(err, SharingError::NoGrantForCaller { .. }));
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(world.blobs.fetch_count(), fetches);
}

#[tokio::test]
async fn test_corrupted_blob_is_an_integrity_error() {
    let world = TestWorld::new();
    let alice = world.party(1).await;

    let doc = alice.register(b"do not touch", "x.txt").await.unwrap();
    assert!(world.blobs.corrupt(&doc.locator, 20));

    let err = alice.retrieve(doc.id).await.unwrap_err();
    assert!(matches!(err, SharingError::IntegrityMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert_eq!(err.step(), Some(FlowStep::VerifyFingerprint));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_tag_tampered_before_registration_fails_at_decrypt() {
    let world = TestWorld::new();
    let alice = world.party(1).await;

    let doc = alice.register(b"sealed", "sealed.txt").await.unwrap();
    let owner_key = alice
        .ledger()
        .wrapped_key(doc.id, &identity(1))
        .await
        .unwrap()
        .unwrap();

    // The fingerprint is recorded over bytes that were already tampered
    // with, so only the AEAD tag can catch it.
    let mut tampered = alice.blobs().get(&doc.locator).await.unwrap().to_vec();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    let locator = alice
        .blobs()
        .put(tampered.clone().into(), "tampered.enc")
        .await
        .unwrap();
    let forged = alice
        .ledger()
        .register(&locator, &Fingerprint::compute(&tampered), &owner_key)
        .await
        .unwrap();

    let err = alice.retrieve(forged).await.unwrap_err();
    assert!(matches!(
        err,
        SharingError::AuthenticationFailure {
            step: FlowStep::Decrypt
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_non_owner_cannot_grant() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let bob = world.party(2).await;

    let doc = alice.register(b"mine", "m.txt").await.unwrap();
    alice
        .grant(doc.id, &identity(2), &world.public_pem(2))
        .await
        .unwrap();
    let entries = world.ledger.snapshot().entry_count(doc.id).unwrap();

    let err = bob
        .grant(doc.id, &identity(3), &world.public_pem(3))
        .await
        .unwrap_err();
    assert!(matches!(err, SharingError::NotOwner { .. }));
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(world.ledger.snapshot().entry_count(doc.id).unwrap(), entries);
}

#[tokio::test]
async fn test_revoke_then_regrant() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let bob = world.party(2).await;

    let doc = alice.register(b"on and off", "o.txt").await.unwrap();
    alice
        .grant(doc.id, &identity(2), &world.public_pem(2))
        .await
        .unwrap();
    bob.retrieve(doc.id).await.unwrap();

    alice.revoke(doc.id, &identity(2)).await.unwrap();
    assert!(matches!(
        bob.retrieve(doc.id).await,
        Err(SharingError::NoGrantForCaller { .. })
    ));
    assert_eq!(alice.shared_with(doc.id).await.unwrap(), vec![identity(1)]);

    alice
        .grant(doc.id, &identity(2), &world.public_pem(2))
        .await
        .unwrap();
    assert_eq!(bob.retrieve(doc.id).await.unwrap().plaintext, b"on and off");
}

#[tokio::test]
async fn test_owner_cannot_be_revoked() {
    let world = TestWorld::new();
    let alice = world.party(1).await;

    let doc = alice.register(b"keep", "k.txt").await.unwrap();
    let err = alice.revoke(doc.id, &identity(1)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(alice.retrieve(doc.id).await.unwrap().plaintext, b"keep");
}

#[tokio::test]
async fn test_ledger_outage_leaves_orphaned_blob_only() {
    let world = TestWorld::new();
    let alice = world.party(1).await;

    world.ledger.set_offline(true);
    let err = alice.register(b"lost", "l.txt").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.step(), Some(FlowStep::Register));
    assert!(!err.is_retryable());
    assert_eq!(world.ledger.document_count(), 0);
    assert_eq!(world.blobs.len(), 1);
}

#[tokio::test]
async fn test_slow_confirmation_times_out_without_record() {
    let config = SharingConfig {
        call_timeout_secs: 1,
        ..fast_config()
    };
    let world = TestWorld::with_config(config);
    let alice = world.party(1).await;
    world.ledger.set_confirmation_delay(Duration::from_secs(3));

    let err = alice.register(b"slow", "s.txt").await.unwrap_err();
    assert!(matches!(
        err,
        SharingError::Timeout {
            step: FlowStep::Register,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Network);
    assert!(!err.is_retryable());
    assert_eq!(world.ledger.document_count(), 0);
    assert_eq!(world.ledger.confirmed_writes(), 0);
}

#[tokio::test]
async fn test_blob_outage_on_retrieve_is_retryable() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let doc = alice.register(b"later", "later.txt").await.unwrap();

    world.blobs.set_offline(true);
    let err = alice.retrieve(doc.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(err.step(), Some(FlowStep::FetchBlob));
    assert!(err.is_retryable());

    world.blobs.set_offline(false);
    assert_eq!(alice.retrieve(doc.id).await.unwrap().plaintext, b"later");
}

#[tokio::test]
async fn test_verify_blob() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let doc = alice.register(b"check me", "c.txt").await.unwrap();

    let bytes = alice.blobs().get(&doc.locator).await.unwrap();
    assert_eq!(Fingerprint::compute(&bytes), doc.fingerprint);
    assert!(alice.verify_blob(doc.id, &bytes).await.unwrap());

    let mut tampered = bytes.to_vec();
    tampered[0] ^= 1;
    assert!(!alice.verify_blob(doc.id, &tampered).await.unwrap());
}

#[tokio::test]
async fn test_name_hint_failure_does_not_fail_register() {
    let world = TestWorld::new();
    let local = Arc::new(MemoryKvStore::new());
    fixtures::provision(local.as_ref(), 1).await;
    local.reject_writes_under("document:");
    let alice = world.party_with_store(1, local);

    let doc = alice.register(b"nameless", "n.txt").await.unwrap();
    let back = alice.retrieve(doc.id).await.unwrap();

    assert_eq!(back.plaintext, b"nameless");
    assert_eq!(back.name, "decrypted.bin");
}

#[tokio::test]
async fn test_bad_recipient_pem_is_rejected() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let doc = alice.register(b"x", "x.txt").await.unwrap();

    let err = alice
        .grant(doc.id, &identity(2), "not a public key")
        .await
        .unwrap_err();
    assert!(matches!(err, SharingError::InvalidRecipientKey(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(alice.shared_with(doc.id).await.unwrap(), vec![identity(1)]);
}

#[tokio::test]
async fn test_grant_to_wrong_pasted_key_fails_authentication() {
    let world = TestWorld::new();
    let alice = world.party(1).await;
    let bob = world.party(2).await;

    let doc = alice.register(b"mixup", "m.txt").await.unwrap();
    // Bob's grant is wrapped for carol's key.
    alice
        .grant(doc.id, &identity(2), &world.public_pem(3))
        .await
        .unwrap();

    let err = bob.retrieve(doc.id).await.unwrap_err();
    assert!(matches!(
        err,
        SharingError::AuthenticationFailure {
            step: FlowStep::Unwrap
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn test_unknown_document() {
    let world = TestWorld::new();
    let alice = world.party(1).await;

    let err = alice.retrieve(DocumentId::new(42)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.step(), Some(FlowStep::ReadMetadata));

    let err = alice
        .grant(DocumentId::new(42), &identity(2), &world.public_pem(2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_chacha_parties_share() {
    let config = SharingConfig {
        cipher: CipherSuite::ChaCha20Poly1305,
        ..fast_config()
    };
    let world = TestWorld::with_config(config);
    let alice = world.party(1).await;
    let bob = world.party(2).await;

    let doc = alice.register(b"stream cipher", "s.bin").await.unwrap();
    alice
        .grant(doc.id, &identity(2), &world.public_pem(2))
        .await
        .unwrap();
    assert_eq!(bob.retrieve(doc.id).await.unwrap().plaintext, b"stream cipher");
}

#[tokio::test]
async fn test_first_use_generates_a_stable_keypair() {
    let world = TestWorld::new();
    let dave = world.party_with_store(4, Arc::new(MemoryKvStore::new()));

    let (a, b) = tokio::join!(dave.public_key_pem(), dave.public_key_pem());
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a, b);
    assert_eq!(dave.keys().store().len(), 2);

    let doc = dave.register(b"fresh", "f.txt").await.unwrap();
    assert_eq!(dave.public_key_pem().await.unwrap(), a);
    assert_eq!(dave.retrieve(doc.id).await.unwrap().plaintext, b"fresh");
}

#[tokio::test]
async fn test_state_survives_restart_with_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.db");
    let world = TestWorld::new();

    let open = || {
        DocumentSharing::new(
            world.ledger.connect(identity(1)),
            world.blobs.clone(),
            SqliteKvStore::open(&path).unwrap(),
            Arc::new(OsRandom),
            fast_config(),
        )
        .unwrap()
    };

    let doc = {
        let alice = open();
        fixtures::provision(alice.keys().store(), 1).await;
        alice.register(b"persistent", "keep.txt").await.unwrap()
    };

    let alice = open();
    let back = alice.retrieve(doc.id).await.unwrap();
    assert_eq!(back.plaintext, b"persistent");
    assert_eq!(back.name, "keep.txt");
    assert_eq!(alice.public_key_pem().await.unwrap(), world.public_pem(1));
}

#[tokio::test]
async fn test_many_recipients() {
    let (world, parties) = fixtures::multi_party_world(4).await;
    let owner = &parties[0];

    let doc = owner.register(b"broadcast", "all.txt").await.unwrap();
    for n in 2..=4u8 {
        owner
            .grant(doc.id, &identity(n), &world.public_pem(n))
            .await
            .unwrap();
    }

    for party in &parties {
        assert_eq!(party.retrieve(doc.id).await.unwrap().plaintext, b"broadcast");
    }
    assert_eq!(owner.shared_with(doc.id).await.unwrap().len(), 4);
    assert_eq!(world.blobs.put_count(), 1);
}
