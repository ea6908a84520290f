//! Secret key material.
//!
//! A [`SecretKey`] is raw HMAC key bytes tagged with the algorithm they are
//! meant for. The bytes are wiped on drop and never appear in `Debug` or
//! `Display` output.

use crate::security::algorithm::HmacAlgorithm;
use core::fmt;
use zeroize::Zeroizing;

/// Symmetric key used to derive token passwords.
///
/// # Example
///
/// ```
/// use saslkit::security::{HmacAlgorithm, SecretKey};
///
/// let key = SecretKey::new(HmacAlgorithm::HmacSha256, vec![7u8; 32]);
/// assert_eq!(key.len(), 32);
/// assert!(!format!("{key:?}").contains("7, 7"));
/// ```
#[derive(Clone)]
pub struct SecretKey {
    algorithm: HmacAlgorithm,
    bytes: Zeroizing<Vec<u8>>,
}

impl SecretKey {
    /// Wraps raw key bytes for `algorithm`.
    ///
    /// No validation is performed; HMAC accepts keys of any length.
    #[must_use]
    pub fn new(algorithm: HmacAlgorithm, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            algorithm,
            bytes: Zeroizing::new(bytes.into()),
        }
    }

    /// The algorithm this key is tagged with.
    #[must_use]
    pub const fn algorithm(&self) -> HmacAlgorithm {
        self.algorithm
    }

    /// Returns the key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for a zero-length key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && crate::security::password::constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs.
        f.debug_struct("SecretKey")
            .field("algorithm", &self.algorithm)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey({}, {} bytes)", self.algorithm, self.bytes.len())
    }
}
