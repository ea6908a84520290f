//! Security-related error types.
//!
//! [`SecretError`] covers key material and algorithm selection.
//! [`TokenError`] is what token-consuming callers see: a permanent
//! rejection ([`TokenError::InvalidToken`]) is kept distinct from the
//! transient "try again" conditions ([`TokenError::Standby`],
//! [`TokenError::Retriable`]).

use crate::config::ConfigError;
use crate::util::EntropyError;
use thiserror::Error;

/// Errors from key generation, algorithm selection, and HMAC setup.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The configured HMAC algorithm is not supported.
    #[error("can't find HMAC algorithm {0:?}")]
    UnknownAlgorithm(String),
    /// The configured key length is not usable.
    #[error("invalid key length {bits} bits: must be a positive multiple of 8")]
    InvalidKeyLength {
        /// The rejected length.
        bits: i64,
    },
    /// The HMAC primitive rejected the key.
    #[error("invalid key to HMAC computation: {0}")]
    InvalidKey(String),
    /// Every master key id has been used.
    #[error("master key id space exhausted")]
    KeyIdsExhausted,
    /// The key generator's entropy source failed.
    #[error(transparent)]
    Entropy(#[from] EntropyError),
    /// Reading settings from configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors surfaced when retrieving or verifying token passwords.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token is unknown, expired, revoked, or its password does not match.
    #[error("invalid token: {0}")]
    InvalidToken(String),
    /// The secret manager is not serving reads; the client may fail over.
    #[error("operation category READ is not supported in state standby: {0}")]
    Standby(String),
    /// The secret store is temporarily unavailable; the client may retry here.
    #[error("retriable token failure: {0}")]
    Retriable(String),
    /// Key material could not be produced.
    #[error(transparent)]
    Secret(#[from] SecretError),
    /// Any other I/O-class failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TokenError {
    /// Creates an invalid-token error.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    /// Creates a standby error.
    #[must_use]
    pub fn standby(msg: impl Into<String>) -> Self {
        Self::Standby(msg.into())
    }

    /// Creates a retriable error.
    #[must_use]
    pub fn retriable(msg: impl Into<String>) -> Self {
        Self::Retriable(msg.into())
    }

    /// Returns `true` if the token was rejected permanently.
    #[must_use]
    pub const fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken(_))
    }

    /// Returns `true` if the server is in standby.
    #[must_use]
    pub const fn is_standby(&self) -> bool {
        matches!(self, Self::Standby(_))
    }

    /// Returns `true` if the caller may retry here or on another server.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Standby(_) | Self::Retriable(_))
    }
}
