//! Full-path tests: seal → encode → relay forward → decode → open.

use std::sync::Arc;

use amora_crypto::{codec, identity::MessagingIdentity, seal};
use amora_relay::metrics::RelayMetrics;
use amora_relay::registry::ConnectionRegistry;
use amora_relay::session::Session;

fn join_frame(identifier: &amora_crypto::pubkey::Pubkey) -> String {
    format!(r#"{{"type":"join","identifier":"{}"}}"#, identifier)
}

#[tokio::test]
async fn test_sealed_envelope_survives_relay_transit() {
    let alice = MessagingIdentity::generate();
    let bob = MessagingIdentity::generate();

    let registry = Arc::new(ConnectionRegistry::new(8));
    let metrics = Arc::new(RelayMetrics::new().unwrap());

    let (mut alice_session, _alice_rx) =
        Session::new(registry.clone(), metrics.clone(), 64 * 1024);
    let (mut bob_session, mut bob_rx) = Session::new(registry.clone(), metrics.clone(), 64 * 1024);

    assert!(alice_session.handle_text(&join_frame(&alice.public())).is_none());
    assert!(bob_session.handle_text(&join_frame(&bob.public())).is_none());

    // Alice seals and frames a message for Bob
    let sealed = seal::seal(b"hey you", &bob.public()).unwrap();
    let envelope = codec::encode(&sealed);
    let frame = format!(
        r#"{{"type":"message","recipient":"{}","envelope":"{}","sender":"{}"}}"#,
        bob.public(),
        envelope,
        alice.public()
    );
    // The relay never sees plaintext
    assert!(!frame.contains("hey you"));

    assert!(alice_session.handle_text(&frame).is_none());

    // Bob receives the frame verbatim, with the accompanying fields intact
    let delivered = bob_rx.recv().await.unwrap();
    assert_eq!(delivered, frame);

    let value: serde_json::Value = serde_json::from_str(&delivered).unwrap();
    assert_eq!(
        value["sender"].as_str().unwrap(),
        alice.public().to_string()
    );

    let received = codec::decode(value["envelope"].as_str().unwrap()).unwrap();
    assert_eq!(seal::open(&received, &bob).unwrap(), b"hey you");
}

#[tokio::test]
async fn test_envelope_for_someone_else_does_not_open() {
    let bob = MessagingIdentity::generate();
    let eve = MessagingIdentity::generate();

    let sealed = seal::seal(b"for bob only", &bob.public()).unwrap();
    let transit = codec::decode(&codec::encode(&sealed)).unwrap();

    // The relay could hand the envelope to anyone; only Bob can open it
    assert!(seal::open(&transit, &eve).is_err());
    assert_eq!(seal::open(&transit, &bob).unwrap(), b"for bob only");
}
