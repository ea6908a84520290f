//! Random secret key generation.
//!
//! Entropy sources are not assumed reentrant, so each [`KeyGenerator`] keeps
//! its source behind a mutex and concurrent `generate_key` calls serialize
//! on it.
//!
//! [`KeyGenerator::new`] uses the process-wide [`SecretSettings::current`]
//! selection, the same one [`create_secret_key`](super::create_secret_key)
//! tags restored keys with. A generator built with explicit settings only
//! round-trips through `create_secret_key` when those settings match it.

use crate::security::error::SecretError;
use crate::security::key::SecretKey;
use crate::security::settings::SecretSettings;
use crate::util::{EntropySource, OsEntropy};
use core::fmt;
use parking_lot::Mutex;
use zeroize::Zeroizing;

/// Generates secret keys of the configured algorithm and length.
pub struct KeyGenerator {
    settings: SecretSettings,
    source: Mutex<Box<dyn EntropySource>>,
}

impl KeyGenerator {
    /// Creates a generator backed by OS entropy, using the process-wide
    /// settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(SecretSettings::current())
    }

    /// Creates a generator backed by OS entropy with explicit settings.
    #[must_use]
    pub fn with_settings(settings: SecretSettings) -> Self {
        Self::with_entropy(settings, OsEntropy)
    }

    /// Creates a generator over an explicit entropy source.
    #[must_use]
    pub fn with_entropy(settings: SecretSettings, source: impl EntropySource) -> Self {
        Self {
            settings,
            source: Mutex::new(Box::new(source)),
        }
    }

    /// The settings keys are generated with.
    #[must_use]
    pub const fn settings(&self) -> SecretSettings {
        self.settings
    }

    /// Generates a new random secret key.
    pub fn generate_key(&self) -> Result<SecretKey, SecretError> {
        let mut bytes = Zeroizing::new(vec![0u8; self.settings.key_length_bytes()]);
        self.source.lock().fill_bytes(&mut bytes)?;
        Ok(SecretKey::new(self.settings.algorithm(), bytes.to_vec()))
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyGenerator")
            .field("settings", &self.settings)
            .field("source", &self.source.lock().source_id())
            .finish()
    }
}
