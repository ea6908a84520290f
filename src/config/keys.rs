//! Well-known configuration keys and their built-in defaults.

/// Configuration key for the SASL mechanism name.
pub const SASL_MECHANISM_KEY: &str = "hadoop.security.sasl.mechanism";

/// Built-in SASL mechanism used when nothing else is configured.
pub const SASL_MECHANISM_DEFAULT: &str = "DIGEST-MD5";

/// Environment variable that overrides the SASL mechanism.
pub const SASL_MECHANISM_ENV: &str = "HADOOP_SASL_MECHANISM";

/// Configuration key for the secret manager's HMAC algorithm.
pub const SECRET_MANAGER_ALGORITHM_KEY: &str =
    "hadoop.security.secret-manager.key-generator.algorithm";

/// Default HMAC algorithm for token passwords.
pub const SECRET_MANAGER_ALGORITHM_DEFAULT: &str = "HmacSHA1";

/// Configuration key for the generated secret key length, in bits.
pub const SECRET_MANAGER_KEY_LENGTH_KEY: &str = "hadoop.security.secret-manager.key-length";

/// Default secret key length, in bits.
pub const SECRET_MANAGER_KEY_LENGTH_DEFAULT: u32 = 64;

/// Conventional key naming the customized callback handler class.
pub const CUSTOMIZED_CALLBACK_HANDLER_CLASS_KEY: &str =
    "hadoop.security.sasl.CustomizedCallbackHandler.class";
