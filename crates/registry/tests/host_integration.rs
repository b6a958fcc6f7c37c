//! Integration tests for the ledger host.
//!
//! Covers genesis verifier registration, durable replay after reopening the
//! ledger file, and that rejected transactions never reach the ledger.

use authcoin_core::{
    AccountId, AuthCoinConfig, ChallengeId, ContentType, LedgerConfig, LedgerEntry,
    LoggingConfig, RegistryConfig, SessionId, TransactionLedger, VerifierBinding,
};
use authcoin_crypto::{revocation_digest, Ed25519Signer, RsaSigner, Secp256k1Signer, VerifierKind};
use authcoin_registry::{
    ChallengeRequest, EirRequest, HostError, LedgerHost, RegistryError, RegistryEvent,
    Transaction,
};
use std::path::PathBuf;

fn temp_db() -> PathBuf {
    std::env::temp_dir().join(format!("test_authcoin_{}.db", uuid::Uuid::new_v4()))
}

fn config(path: PathBuf) -> AuthCoinConfig {
    AuthCoinConfig {
        registry: RegistryConfig {
            owner: "owner".to_string(),
        },
        ledger: LedgerConfig {
            path,
            node_id: "test-node".to_string(),
        },
        logging: LoggingConfig::default(),
        verifiers: vec![VerifierBinding {
            content_type: "ed25519".to_string(),
            scheme: "ed25519".to_string(),
        }],
    }
}

fn ed25519() -> ContentType {
    ContentType::from_label("ed25519").unwrap()
}

fn eir_tx(signer: &Ed25519Signer, name: &str) -> Transaction {
    Transaction::RegisterEir(
        EirRequest::new(signer.public_content(), ed25519(), vec![name.to_string()])
            .sign_with(|d| signer.sign_digest(d)),
    )
}

#[test]
fn test_open_registers_genesis_verifiers_once() {
    let path = temp_db();
    let cfg = config(path.clone());

    {
        let host = LedgerHost::open(&cfg).expect("open fresh ledger");
        assert!(host.registry().get_signature_verifier(&ed25519()).is_some());
        assert_eq!(host.ledger().len().unwrap(), 1);
    }

    let host = LedgerHost::open(&cfg).expect("reopen ledger");
    assert_eq!(host.ledger().len().unwrap(), 1);
    assert_eq!(host.registry().get_signature_verifier_types().len(), 1);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_state_survives_reopen() {
    let path = temp_db();
    let cfg = config(path.clone());
    let anyone = AccountId::new("client");
    let alice = Ed25519Signer::from_seed([1u8; 32]);
    let bob = Ed25519Signer::from_seed([2u8; 32]);
    let session = SessionId::from_label("s1").unwrap();

    {
        let mut host = LedgerHost::open(&cfg).expect("open");
        host.submit(&anyone, eir_tx(&alice, "alice")).expect("alice");
        host.submit(&anyone, eir_tx(&bob, "bob")).expect("bob");

        let alice_id = *host
            .registry()
            .get_eir_by_content(&alice.public_content())
            .unwrap()
            .id();
        let bob_id = *host
            .registry()
            .get_eir_by_content(&bob.public_content())
            .unwrap()
            .id();

        let challenge = ChallengeRequest::new(
            ChallengeId::from_label("c1").unwrap(),
            session,
            "sign-content",
            b"nonce".to_vec(),
            alice_id,
            bob_id,
        )
        .sign_with(|d| alice.sign_digest(d));
        let receipt = host
            .submit(&anyone, Transaction::RegisterChallengeRecord(challenge))
            .expect("challenge");
        assert!(receipt
            .events
            .iter()
            .any(|e| matches!(e, RegistryEvent::NewVae { .. })));

        let revoke = Transaction::RevokeEir {
            id: bob_id,
            signature: bob.sign_digest(&revocation_digest(&bob_id)),
        };
        host.submit(&anyone, revoke).expect("revoke");
    }

    let host = LedgerHost::open(&cfg).expect("reopen");
    let registry = host.registry();
    assert_eq!(registry.get_eir_count(), 2);
    assert_eq!(registry.get_vae_count(), 1);
    let vae = registry.get_vae(&session).unwrap();
    assert_eq!(vae.challenges_count(), 1);
    assert_eq!(vae.creator(), &anyone);
    let bob_eir = registry.get_eir_by_content(&bob.public_content()).unwrap();
    assert!(bob_eir.is_revoked());
    assert_eq!(host.ledger().len().unwrap(), 5);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_rejected_transaction_is_not_appended() {
    let path = temp_db();
    let mut host = LedgerHost::open(&config(path.clone())).expect("open");
    let alice = Ed25519Signer::from_seed([1u8; 32]);

    host.submit(&AccountId::new("client"), eir_tx(&alice, "alice"))
        .expect("first registration");
    let before = host.ledger().len().unwrap();

    let err = host
        .submit(&AccountId::new("client"), eir_tx(&alice, "alice"))
        .unwrap_err();
    assert!(matches!(
        err,
        HostError::Rejected(RegistryError::DuplicateError { .. })
    ));

    let err = host
        .submit(
            &AccountId::new("mallory"),
            Transaction::RegisterSignatureVerifier {
                scheme: VerifierKind::Dummy,
                content_type: ed25519(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        HostError::Rejected(RegistryError::AccessDenied { .. })
    ));

    assert_eq!(host.ledger().len().unwrap(), before);
    assert_eq!(host.registry().get_eir_count(), 1);
    assert_eq!(
        host.registry()
            .get_signature_verifier(&ed25519())
            .unwrap()
            .scheme(),
        "ed25519"
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_receipts_chain_in_order() {
    let path = temp_db();
    let mut host = LedgerHost::open(&config(path.clone())).expect("open");
    let client = AccountId::new("client");

    let first = host
        .submit(&client, eir_tx(&Ed25519Signer::from_seed([1u8; 32]), "a"))
        .expect("a");
    let second = host
        .submit(&client, eir_tx(&Ed25519Signer::from_seed([2u8; 32]), "b"))
        .expect("b");

    assert_eq!(second.seq_no, first.seq_no + 1);
    assert_eq!(host.ledger().metrics().ledger_entries_appended_total, 3);
    assert_eq!(host.ledger().metrics().ledger_startup_checks_total, 1);
    let stored = host.ledger().get_entry_by_seq_no(second.seq_no).unwrap();
    assert_eq!(stored.prev_tx_hash, first.tx_hash);
    assert_eq!(stored.tx_id, second.tx_id);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_undecodable_payload_fails_replay() {
    let path = temp_db();
    {
        let mut ledger = TransactionLedger::open(&path, "test-node").expect("open");
        let entry = LedgerEntry::new("owner", b"not json".to_vec(), ledger.latest_hash().unwrap(), 1);
        ledger.append_entry(entry).expect("append");
    }

    let result = LedgerHost::open(&config(path.clone()));
    assert!(matches!(result, Err(HostError::Encoding(_))));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_unknown_genesis_scheme_rejected() {
    let path = temp_db();
    let mut cfg = config(path.clone());
    cfg.verifiers.push(VerifierBinding {
        content_type: "dsa".to_string(),
        scheme: "dsa".to_string(),
    });

    assert!(matches!(
        LedgerHost::open(&cfg),
        Err(HostError::Config(_))
    ));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_committed_events_are_not_retained() {
    let path = temp_db();
    let mut host = LedgerHost::open(&config(path.clone())).expect("open");
    let client = AccountId::new("client");

    for i in 0..20u8 {
        let receipt = host
            .submit(&client, eir_tx(&Ed25519Signer::from_seed([i + 1; 32]), "party"))
            .expect("register");
        assert!(matches!(receipt.events.as_slice(), [RegistryEvent::NewEir { .. }]));
    }

    assert_eq!(host.registry().get_eir_count(), 20);
    assert!(host.registry().events().is_empty());

    let reopened = LedgerHost::open(&config(path.clone())).expect("reopen");
    assert!(reopened.registry().events().is_empty());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_rsa_and_secp256k1_identities_through_genesis() {
    let path = temp_db();
    let mut cfg = config(path.clone());
    cfg.verifiers = AuthCoinConfig::default_config().verifiers;
    let mut host = LedgerHost::open(&cfg).expect("open");
    let client = AccountId::new("client");

    let rsa_type = ContentType::from_label("rsa").unwrap();
    let rsa = RsaSigner::from_seed([31u8; 32], 1024).unwrap();
    let request = EirRequest::new(rsa.public_content(), rsa_type, vec!["rsa".into()])
        .sign_with(|d| rsa.sign_digest(d).unwrap());
    host.submit(&client, Transaction::RegisterEir(request))
        .expect("rsa identity");

    let k1_type = ContentType::from_label("secp256k1").unwrap();
    let k1 = Secp256k1Signer::from_seed([32u8; 32]).unwrap();
    let request = EirRequest::new(k1.public_content(), k1_type, vec!["k1".into()])
        .sign_with(|d| k1.sign_digest(d).unwrap());
    host.submit(&client, Transaction::RegisterEir(request))
        .expect("secp256k1 identity");

    let rsa_id = *host
        .registry()
        .get_eir_by_content(&rsa.public_content())
        .unwrap()
        .id();
    let wrong = Transaction::RevokeEir {
        id: rsa_id,
        signature: k1.sign_digest(&revocation_digest(&rsa_id)).unwrap(),
    };
    host.submit(&client, wrong).expect("rejected signature still commits");
    assert!(!host.registry().get_eir(&rsa_id).unwrap().is_revoked());

    let revoke = Transaction::RevokeEir {
        id: rsa_id,
        signature: rsa.sign_digest(&revocation_digest(&rsa_id)).unwrap(),
    };
    host.submit(&client, revoke).expect("revoke");
    assert!(host.registry().get_eir(&rsa_id).unwrap().is_revoked());
    assert_eq!(host.registry().get_eir_count(), 2);

    let _ = std::fs::remove_file(&path);
}
