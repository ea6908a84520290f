//! HMAC algorithm selection.
//!
//! Names follow the JCA convention (`HmacSHA1`, `HmacSHA256`, ...) and parse
//! case-insensitively, so existing configuration files keep working.

use crate::security::error::SecretError;
use core::fmt;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};
use std::str::FromStr;

/// A supported HMAC algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HmacAlgorithm {
    /// HMAC over SHA-1 (20-byte output).
    #[default]
    HmacSha1,
    /// HMAC over SHA-256 (32-byte output).
    HmacSha256,
    /// HMAC over SHA-384 (48-byte output).
    HmacSha384,
    /// HMAC over SHA-512 (64-byte output).
    HmacSha512,
}

impl HmacAlgorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 4] = [
        Self::HmacSha1,
        Self::HmacSha256,
        Self::HmacSha384,
        Self::HmacSha512,
    ];

    /// Canonical algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HmacSha1 => "HmacSHA1",
            Self::HmacSha256 => "HmacSHA256",
            Self::HmacSha384 => "HmacSHA384",
            Self::HmacSha512 => "HmacSHA512",
        }
    }

    /// Digest output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::HmacSha1 => 20,
            Self::HmacSha256 => 32,
            Self::HmacSha384 => 48,
            Self::HmacSha512 => 64,
        }
    }

    /// Looks up an algorithm by name.
    pub fn from_name(name: &str) -> Result<Self, SecretError> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|alg| alg.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| SecretError::UnknownAlgorithm(name.to_string()))
    }

    /// Computes `HMAC(key, message)` with a context that lives only for this call.
    pub(crate) fn mac(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, SecretError> {
        match self {
            Self::HmacSha1 => mac_with::<Hmac<Sha1>>(key, message),
            Self::HmacSha256 => mac_with::<Hmac<Sha256>>(key, message),
            Self::HmacSha384 => mac_with::<Hmac<Sha384>>(key, message),
            Self::HmacSha512 => mac_with::<Hmac<Sha512>>(key, message),
        }
    }
}

fn mac_with<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, SecretError> {
    let mut mac =
        <M as KeyInit>::new_from_slice(key).map_err(|e| SecretError::InvalidKey(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

impl fmt::Display for HmacAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HmacAlgorithm {
    type Err = SecretError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
