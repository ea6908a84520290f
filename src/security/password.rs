//! Token passwords derived as `HMAC(secret_key, identifier_bytes)`.
//!
//! Derivation is a pure function of its two inputs. Every call builds its own
//! HMAC context and drops it before returning, so concurrent callers never
//! share digest state.

use crate::security::error::SecretError;
use crate::security::key::SecretKey;
use crate::security::settings::SecretSettings;
use core::fmt;
use zeroize::Zeroizing;

/// A derived token password.
///
/// Equality is constant-time. `Debug` shows only a short prefix.
#[derive(Clone)]
pub struct Password {
    bytes: Zeroizing<Vec<u8>>,
}

impl Password {
    /// Wraps raw password bytes, e.g. ones presented by a client.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.into()),
        }
    }

    /// Returns the password bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copies the password bytes out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Password length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for an empty password.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Recomputes the password for `identifier` under `key` and compares.
    pub fn verify(&self, identifier: &[u8], key: &SecretKey) -> Result<bool, SecretError> {
        let computed = create_password(identifier, key)?;
        Ok(self == &computed)
    }
}

impl PartialEq for Password {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for Password {}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bytes.as_slice() {
            [a, b, ..] => write!(f, "Password({a:02x}{b:02x}..)"),
            _ => write!(f, "Password(..)"),
        }
    }
}

/// Compute HMAC of the identifier using the secret key and return the output
/// as the password.
///
/// The HMAC algorithm is the one `key` is tagged with.
///
/// # Example
///
/// ```
/// use saslkit::security::{create_password, HmacAlgorithm, SecretKey};
///
/// let key = SecretKey::new(HmacAlgorithm::HmacSha256, b"master".to_vec());
/// let p1 = create_password(b"token-1", &key).unwrap();
/// let p2 = create_password(b"token-1", &key).unwrap();
/// assert_eq!(p1, p2);
/// assert_ne!(p1, create_password(b"token-2", &key).unwrap());
/// ```
pub fn create_password(identifier: &[u8], key: &SecretKey) -> Result<Password, SecretError> {
    let digest = key.algorithm().mac(key.as_bytes(), identifier)?;
    Ok(Password::from_bytes(digest))
}

/// Converts raw bytes to a secret key tagged with the process-wide selected
/// algorithm (see [`SecretSettings::current`]).
#[must_use]
pub fn create_secret_key(key: &[u8]) -> SecretKey {
    SecretSettings::current().secret_key(key)
}

/// Constant-time comparison to prevent timing attacks.
///
/// Lengths are public; only content comparison is constant-time.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b) {
        diff |= x ^ y;
    }
    diff == 0
}
