use saslkit::security::{
    HmacAlgorithm, KeyGenerator, Password, SecretError, SecretKey, SecretSettings,
    create_password,
};
use saslkit::util::SeededEntropy;
use saslkit::{Configuration, config::keys};

#[test]
fn each_algorithm_produces_its_digest_length() {
    for algorithm in HmacAlgorithm::ALL {
        let key = SecretKey::new(algorithm, b"0123456789abcdef".to_vec());
        let password = create_password(b"identifier", &key).unwrap();
        assert_eq!(password.len(), algorithm.output_len(), "{algorithm}");
    }
}

#[test]
fn same_bytes_under_different_algorithms_differ() {
    let sha1 = create_password(b"id", &SecretKey::new(HmacAlgorithm::HmacSha1, b"k".to_vec()))
        .unwrap();
    let sha256 =
        create_password(b"id", &SecretKey::new(HmacAlgorithm::HmacSha256, b"k".to_vec()))
            .unwrap();
    assert_ne!(sha1, sha256);
}

#[test]
fn empty_identifier_and_key_are_accepted() {
    let key = SecretKey::new(HmacAlgorithm::HmacSha256, Vec::new());
    let password = create_password(b"", &key).unwrap();
    assert_eq!(password.len(), 32);
}

#[test]
fn verify_against_wrong_key_fails() {
    let settings = SecretSettings::new(HmacAlgorithm::HmacSha256, 256).unwrap();
    let keygen = KeyGenerator::with_entropy(settings, SeededEntropy::new(11));
    let right = keygen.generate_key().unwrap();
    let wrong = keygen.generate_key().unwrap();

    let password = create_password(b"token", &right).unwrap();
    assert!(password.verify(b"token", &right).unwrap());
    assert!(!password.verify(b"token", &wrong).unwrap());
}

#[test]
fn truncated_password_never_matches() {
    let key = SecretKey::new(HmacAlgorithm::HmacSha1, b"k".to_vec());
    let password = create_password(b"id", &key).unwrap();
    let truncated = Password::from_bytes(&password.as_bytes()[..password.len() - 1]);
    assert_ne!(truncated, password);
}

#[test]
fn settings_from_configuration_drive_generated_keys() {
    let conf = Configuration::new()
        .with(keys::SECRET_MANAGER_ALGORITHM_KEY, "hmacsha512")
        .with(keys::SECRET_MANAGER_KEY_LENGTH_KEY, "512");
    let settings = SecretSettings::from_config(&conf).unwrap();
    let key = KeyGenerator::with_settings(settings).generate_key().unwrap();
    assert_eq!(key.algorithm(), HmacAlgorithm::HmacSha512);
    assert_eq!(key.len(), 64);
    assert_eq!(create_password(b"x", &key).unwrap().len(), 64);
}

#[test]
fn unsupported_algorithm_names_the_value() {
    let conf = Configuration::new().with(keys::SECRET_MANAGER_ALGORITHM_KEY, "HmacMD5");
    let err = SecretSettings::from_config(&conf).unwrap_err();
    assert!(matches!(err, SecretError::UnknownAlgorithm(ref name) if name == "HmacMD5"));
    assert!(err.to_string().contains("HmacMD5"));
}
