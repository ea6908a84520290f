//! Property tests for password derivation.

use proptest::prelude::*;
use saslkit::security::{HmacAlgorithm, SecretKey, create_password};

// ─── Strategies ─────────────────────────────────────────────────────────────

fn arb_algorithm() -> impl Strategy<Value = HmacAlgorithm> {
    prop::sample::select(HmacAlgorithm::ALL.to_vec())
}

fn arb_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..128)
}

// ─── Properties ─────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn derivation_is_deterministic(
        algorithm in arb_algorithm(),
        key in arb_bytes(),
        identifier in arb_bytes(),
    ) {
        let key = SecretKey::new(algorithm, key);
        let a = create_password(&identifier, &key).unwrap();
        let b = create_password(&identifier, &key).unwrap();
        prop_assert_eq!(a.as_bytes(), b.as_bytes());
        prop_assert_eq!(a.len(), algorithm.output_len());
    }

    #[test]
    fn changing_identifier_changes_password(
        algorithm in arb_algorithm(),
        key in arb_bytes(),
        identifier in prop::collection::vec(any::<u8>(), 1..64),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let key = SecretKey::new(algorithm, key);
        let mut altered = identifier.clone();
        let at = index.index(altered.len());
        altered[at] ^= flip;
        let original = create_password(&identifier, &key).unwrap();
        let changed = create_password(&altered, &key).unwrap();
        prop_assert_ne!(original, changed);
    }

    #[test]
    fn changing_key_changes_password(
        algorithm in arb_algorithm(),
        key in prop::collection::vec(any::<u8>(), 1..64),
        identifier in arb_bytes(),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut altered = key.clone();
        let at = index.index(altered.len());
        altered[at] ^= flip;
        let original = create_password(&identifier, &SecretKey::new(algorithm, key)).unwrap();
        let changed = create_password(&identifier, &SecretKey::new(algorithm, altered)).unwrap();
        prop_assert_ne!(original, changed);
    }
}
