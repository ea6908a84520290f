use saslkit::security::{
    HmacAlgorithm, KeyGenerator, ManualClock, MemorySecretManager, Password, SecretKey,
    SecretManager, SecretSettings, create_password,
};
use saslkit::util::SeededEntropy;
use std::sync::{Arc, Barrier};
use std::time::Duration;

const THREADS: usize = 8;
const ROUNDS: usize = 200;

#[test]
fn concurrent_derivations_match_serial_results() {
    crate::common::init_test_logging();
    test_phase!("concurrent_derivations_match_serial_results");
    let settings = SecretSettings::new(HmacAlgorithm::HmacSha256, 256).unwrap();
    let keygen = KeyGenerator::with_entropy(settings, SeededEntropy::new(2024));
    let keys: Vec<SecretKey> = (0..THREADS).map(|_| keygen.generate_key().unwrap()).collect();

    let expected: Vec<Vec<Password>> = keys
        .iter()
        .enumerate()
        .map(|(t, key)| {
            (0..ROUNDS)
                .map(|r| create_password(format!("{t}:{r}").as_bytes(), key).unwrap())
                .collect()
        })
        .collect();

    let barrier = Barrier::new(THREADS);
    let observed: Vec<Vec<Password>> = std::thread::scope(|s| {
        let handles: Vec<_> = keys
            .iter()
            .enumerate()
            .map(|(t, key)| {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    (0..ROUNDS)
                        .map(|r| create_password(format!("{t}:{r}").as_bytes(), key).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_with_log!(
        observed == expected,
        "no cross-contamination between concurrent derivations",
        true,
        observed == expected
    );
    test_complete!("concurrent_derivations_match_serial_results");
}

#[test]
fn shared_manager_issues_unique_sequences() {
    let settings = SecretSettings::new(HmacAlgorithm::HmacSha1, 64).unwrap();
    let mgr = MemorySecretManager::with_parts(
        "TEST",
        KeyGenerator::with_entropy(settings, SeededEntropy::new(8)),
        Duration::from_secs(60),
        Arc::new(ManualClock::new(0)),
    )
    .unwrap();
    let barrier = Barrier::new(THREADS);

    let mut sequences: Vec<u64> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    (0..ROUNDS / 10)
                        .map(|_| {
                            let mut id = mgr.create_identifier();
                            let password = mgr.create_password(&mut id).unwrap();
                            mgr.verify_token(&id, &password).unwrap();
                            id.sequence()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    sequences.sort_unstable();
    sequences.dedup();
    assert_eq!(sequences.len(), THREADS * (ROUNDS / 10));
    assert_eq!(mgr.token_count(), THREADS * (ROUNDS / 10));
}

#[test]
fn concurrent_key_generation_serializes() {
    let settings = SecretSettings::new(HmacAlgorithm::HmacSha256, 128).unwrap();
    let keygen = KeyGenerator::with_entropy(settings, SeededEntropy::new(5));
    let barrier = Barrier::new(THREADS);

    let mut keys: Vec<Vec<u8>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    (0..ROUNDS)
                        .map(|_| keygen.generate_key().unwrap().as_bytes().to_vec())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    // A seeded source yields the same stream regardless of interleaving.
    let serial = KeyGenerator::with_entropy(settings, SeededEntropy::new(5));
    let mut expected: Vec<Vec<u8>> = (0..THREADS * ROUNDS)
        .map(|_| serial.generate_key().unwrap().as_bytes().to_vec())
        .collect();
    keys.sort_unstable();
    expected.sort_unstable();
    assert_eq!(keys, expected);
}
