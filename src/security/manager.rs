//! The server-side secret manager contract.
//!
//! Each token type has a [`SecretManager`] that mints passwords for new
//! identifiers and looks up the password for a presented identifier. The
//! shared pieces (random key generation and HMAC derivation) are provided
//! methods built on [`KeyGenerator`] and [`create_password`].
//!
//! [`create_password`]: crate::security::create_password

use crate::security::error::{SecretError, TokenError};
use crate::security::key::SecretKey;
use crate::security::keygen::KeyGenerator;
use crate::security::password::Password;

/// The non-secret, identifying portion of a token.
pub trait TokenIdentifier: Send + Sync {
    /// The token kind, e.g. `"HDFS_DELEGATION_TOKEN"`.
    fn kind(&self) -> &str;

    /// Serializes the identifier. Passwords are derived over these bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

/// The server-side secret manager for one token type.
///
/// # Thread safety
///
/// Implementations are shared across worker threads. Key generation goes
/// through [`key_generator`](Self::key_generator), which serializes callers;
/// password derivation needs no lock.
pub trait SecretManager: Send + Sync {
    /// The token identifier type this manager issues.
    type Identifier: TokenIdentifier;

    /// Creates the password for the given identifier.
    ///
    /// Implementations may modify `identifier` before deriving the password,
    /// for example to stamp the issue date or a sequence number.
    fn create_password(&self, identifier: &mut Self::Identifier) -> Result<Password, SecretError>;

    /// Retrieves the password for the given identifier.
    ///
    /// Implementations check dates or registries so that expired, revoked
    /// and unknown identifiers fail with [`TokenError::InvalidToken`].
    fn retrieve_password(&self, identifier: &Self::Identifier) -> Result<Password, TokenError>;

    /// Same as [`retrieve_password`](Self::retrieve_password), except that
    /// implementations may also fail with [`TokenError::Standby`] or
    /// [`TokenError::Retriable`] when the failure is temporary and the
    /// client should fail over or retry.
    fn retriable_retrieve_password(
        &self,
        identifier: &Self::Identifier,
    ) -> Result<Password, TokenError> {
        self.retrieve_password(identifier)
    }

    /// Creates an empty token identifier.
    fn create_identifier(&self) -> Self::Identifier;

    /// No-op if the manager is available for reading tokens; fails with
    /// [`TokenError::Standby`] otherwise.
    fn check_available_for_read(&self) -> Result<(), TokenError> {
        Ok(())
    }

    /// The key generator owned by this manager.
    fn key_generator(&self) -> &KeyGenerator;

    /// Generates a new random secret key.
    fn generate_secret(&self) -> Result<SecretKey, SecretError> {
        self.key_generator().generate_key()
    }

    /// Checks that `password` is the one on record for `identifier`.
    fn verify_token(
        &self,
        identifier: &Self::Identifier,
        password: &Password,
    ) -> Result<(), TokenError> {
        let stored = self.retrieve_password(identifier)?;
        if &stored == password {
            Ok(())
        } else {
            Err(TokenError::invalid(format!(
                "token ({}) has invalid password",
                identifier.kind()
            )))
        }
    }
}
