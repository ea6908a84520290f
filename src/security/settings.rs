//! Selected HMAC algorithm and key length.
//!
//! A process selects one algorithm and key length for token secrets. The
//! selection is frozen the first time it is read: call
//! [`SecretSettings::install`] during startup, before any secret manager is
//! built, or the built-in defaults (`HmacSHA1`, 64 bits) are used.
//! [`KeyGenerator::new`](super::KeyGenerator::new) and
//! [`create_secret_key`](super::create_secret_key) both read it, so a
//! generated key persisted as raw bytes restores with the same algorithm.

use crate::config::{Configuration, keys};
use crate::security::algorithm::HmacAlgorithm;
use crate::security::error::SecretError;
use crate::security::key::SecretKey;
use std::sync::OnceLock;
use tracing::info;

static SELECTED: OnceLock<SecretSettings> = OnceLock::new();

/// HMAC algorithm and generated-key length for token secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecretSettings {
    algorithm: HmacAlgorithm,
    key_length_bits: u32,
}

impl SecretSettings {
    /// Creates settings, validating the key length.
    pub fn new(algorithm: HmacAlgorithm, key_length_bits: u32) -> Result<Self, SecretError> {
        if key_length_bits == 0 || key_length_bits % 8 != 0 {
            return Err(SecretError::InvalidKeyLength {
                bits: i64::from(key_length_bits),
            });
        }
        Ok(Self {
            algorithm,
            key_length_bits,
        })
    }

    /// Reads the algorithm and key length from configuration, falling back
    /// to the built-in defaults for missing entries.
    pub fn from_config(conf: &Configuration) -> Result<Self, SecretError> {
        let algorithm = HmacAlgorithm::from_name(conf.get_or(
            keys::SECRET_MANAGER_ALGORITHM_KEY,
            keys::SECRET_MANAGER_ALGORITHM_DEFAULT,
        ))?;
        let bits = conf.get_int(
            keys::SECRET_MANAGER_KEY_LENGTH_KEY,
            i64::from(keys::SECRET_MANAGER_KEY_LENGTH_DEFAULT),
        )?;
        let bits = u32::try_from(bits).map_err(|_| SecretError::InvalidKeyLength { bits })?;
        Self::new(algorithm, bits)
    }

    /// Installs the process-wide selection.
    ///
    /// Returns the rejected settings if a selection is already in place,
    /// either from an earlier install or from a read of
    /// [`current`](Self::current).
    pub fn install(settings: Self) -> Result<(), Self> {
        SELECTED.set(settings)?;
        info!(algorithm = %settings.algorithm, "Selected hash algorithm");
        info!(bits = settings.key_length_bits, "Selected hash key length");
        Ok(())
    }

    /// Returns the process-wide selection, freezing the defaults if nothing
    /// was installed.
    #[must_use]
    pub fn current() -> Self {
        *SELECTED.get_or_init(Self::default)
    }

    /// The selected HMAC algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> HmacAlgorithm {
        self.algorithm
    }

    /// Generated key length in bits.
    #[must_use]
    pub const fn key_length_bits(&self) -> u32 {
        self.key_length_bits
    }

    /// Generated key length in bytes.
    #[must_use]
    pub const fn key_length_bytes(&self) -> usize {
        (self.key_length_bits / 8) as usize
    }

    /// Wraps raw bytes as a key tagged with this algorithm.
    #[must_use]
    pub fn secret_key(&self, bytes: &[u8]) -> SecretKey {
        SecretKey::new(self.algorithm, bytes.to_vec())
    }
}

impl Default for SecretSettings {
    fn default() -> Self {
        Self {
            algorithm: HmacAlgorithm::HmacSha1,
            key_length_bits: keys::SECRET_MANAGER_KEY_LENGTH_DEFAULT,
        }
    }
}
