//! Token secrets and the secret manager contract.
//!
//! This module provides the primitives a token-issuing service needs to mint
//! and verify token passwords. A password is `HMAC(secret_key, identifier)`
//! where the identifier is the serialized, non-secret half of a token.
//!
//! # Design Principles
//!
//! 1. **Pure derivation**: [`create_password`] is a function of its inputs; no
//!    digest state is shared between callers
//! 2. **Interface-first**: [`SecretManager`] lets each token type plug in its
//!    own identifier and storage
//! 3. **Frozen selection**: the algorithm and key length are chosen once per
//!    process through [`SecretSettings`]
//! 4. **Fail closed**: unknown, expired and revoked tokens are
//!    [`TokenError::InvalidToken`]; temporary conditions are reported separately
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     SecretManager                        │
//! │  ┌─────────────────────────────────────────────────────┐ │
//! │  │                    KeyGenerator                     │ │
//! │  │  • SecretSettings (algorithm, key length)          │ │
//! │  │  • EntropySource behind a mutex                    │ │
//! │  └─────────────────────────────────────────────────────┘ │
//! │                          │ SecretKey                     │
//! │                          ▼                               │
//! │  ┌─────────────────────────────────────────────────────┐ │
//! │  │                  create_password                    │ │
//! │  │  • HMAC(key, identifier.to_bytes()) → Password      │ │
//! │  └─────────────────────────────────────────────────────┘ │
//! │                          │                               │
//! │                          ▼                               │
//! │  ┌─────────────────────────────────────────────────────┐ │
//! │  │          retrieve_password / verify_token           │ │
//! │  │  • InvalidToken | Standby | Retriable               │ │
//! │  └─────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use saslkit::config::Configuration;
//! use saslkit::security::{MemorySecretManager, SecretManager, SecretSettings};
//! use std::time::Duration;
//!
//! // Once, at startup, before any manager exists.
//! let _ = SecretSettings::install(SecretSettings::from_config(&Configuration::new()).unwrap());
//!
//! let mgr = MemorySecretManager::new("EXAMPLE_TOKEN", Duration::from_secs(3600)).unwrap();
//!
//! let mut id = mgr.create_identifier();
//! id.set_owner("alice");
//! let password = mgr.create_password(&mut id).unwrap();
//! mgr.verify_token(&id, &password).unwrap();
//! ```

pub mod algorithm;
pub mod error;
pub mod key;
pub mod keygen;
pub mod manager;
pub mod memory;
pub mod password;
pub mod settings;

pub use algorithm::HmacAlgorithm;
pub use error::{SecretError, TokenError};
pub use key::SecretKey;
pub use keygen::KeyGenerator;
pub use manager::{SecretManager, TokenIdentifier};
pub use memory::{
    Clock, DelegationIdentifier, ManualClock, MemorySecretManager, ServingState, SystemClock,
};
pub use password::{Password, create_password, create_secret_key};
pub use settings::SecretSettings;
