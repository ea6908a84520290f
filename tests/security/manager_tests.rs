use saslkit::security::{
    DelegationIdentifier, HmacAlgorithm, KeyGenerator, ManualClock, MemorySecretManager,
    SecretManager, SecretSettings, ServingState, TokenIdentifier, create_password,
};
use saslkit::util::SeededEntropy;
use std::sync::Arc;
use std::time::Duration;

const KIND: &str = "HDFS_DELEGATION_TOKEN";

fn manager(clock: &Arc<ManualClock>, lifetime: Duration) -> MemorySecretManager {
    let settings = SecretSettings::new(HmacAlgorithm::HmacSha256, 256).unwrap();
    MemorySecretManager::with_parts(
        KIND,
        KeyGenerator::with_entropy(settings, SeededEntropy::new(99)),
        lifetime,
        Arc::clone(clock) as Arc<dyn saslkit::security::Clock>,
    )
    .unwrap()
}

#[test]
fn issued_token_verifies_until_expiry() {
    crate::common::init_test_logging();
    test_phase!("issued_token_verifies_until_expiry");
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let mgr = manager(&clock, Duration::from_secs(3600));

    let mut id = mgr.create_identifier();
    id.set_owner("alice");
    let password = mgr.create_password(&mut id).unwrap();
    mgr.verify_token(&id, &password).unwrap();

    clock.advance(Duration::from_secs(3600));
    mgr.verify_token(&id, &password).unwrap();

    clock.advance(Duration::from_millis(1));
    let err = mgr.verify_token(&id, &password).unwrap_err();
    assert_with_log!(
        err.is_invalid_token(),
        "expired token is invalid",
        true,
        err.is_invalid_token()
    );
    test_complete!("issued_token_verifies_until_expiry");
}

#[test]
fn identifier_received_over_the_wire_verifies() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock, Duration::from_secs(60));
    let mut id = mgr.create_identifier();
    id.set_owner("bob");
    let password = mgr.create_password(&mut id).unwrap();

    let wire = id.to_bytes();
    let received = DelegationIdentifier::from_bytes(&wire).unwrap();
    assert_eq!(received.kind(), KIND);
    assert_eq!(received.owner(), "bob");
    mgr.verify_token(&received, &password).unwrap();
}

#[test]
fn password_is_hmac_of_identifier_bytes() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock, Duration::from_secs(60));
    let mut id = mgr.create_identifier();
    let password = mgr.create_password(&mut id).unwrap();

    // The same derivation under an unrelated key must not match.
    let other = mgr.generate_secret().unwrap();
    assert_ne!(create_password(&id.to_bytes(), &other).unwrap(), password);
}

#[test]
fn identifiers_get_distinct_sequence_numbers() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock, Duration::from_secs(60));
    let mut sequences = Vec::new();
    for _ in 0..5 {
        let mut id = mgr.create_identifier();
        mgr.create_password(&mut id).unwrap();
        sequences.push(id.sequence());
    }
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    assert_eq!(mgr.token_count(), 5);
}

#[test]
fn standby_is_distinguishable_from_rejection() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock, Duration::from_secs(60));
    let mut id = mgr.create_identifier();
    mgr.create_password(&mut id).unwrap();

    mgr.set_serving_state(ServingState::Standby);
    let standby = mgr.retriable_retrieve_password(&id).unwrap_err();
    assert!(standby.is_standby());
    assert!(!standby.is_invalid_token());

    mgr.set_serving_state(ServingState::Active);
    let unknown = DelegationIdentifier::new(KIND, "nobody");
    let rejected = mgr.retriable_retrieve_password(&unknown).unwrap_err();
    assert!(rejected.is_invalid_token());
    assert!(!rejected.is_retriable());
}

#[test]
fn rolled_keys_coexist() {
    let clock = Arc::new(ManualClock::new(0));
    let mgr = manager(&clock, Duration::from_secs(60));

    let mut first = mgr.create_identifier();
    let first_password = mgr.create_password(&mut first).unwrap();
    mgr.roll_master_key().unwrap();
    let mut second = mgr.create_identifier();
    let second_password = mgr.create_password(&mut second).unwrap();

    assert_eq!(first.master_key_id(), 1);
    assert_eq!(second.master_key_id(), 2);
    mgr.verify_token(&first, &first_password).unwrap();
    mgr.verify_token(&second, &second_password).unwrap();
    assert!(mgr.verify_token(&first, &second_password).is_err());
}
