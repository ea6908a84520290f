//! saslkit: pluggable SASL callback handlers, mechanism selection, and HMAC
//! token secrets for a distributed platform's security layer.
//!
//! # Overview
//!
//! The crate answers two runtime questions for the components that sit in
//! front of an authenticated RPC connection:
//!
//! - **Which pluggable behavior applies?** [`callback::CallbackHandlerRegistry`]
//!   maps a configuration key to a resolved callback handler, and
//!   [`mechanism::MechanismResolver`] picks the negotiation mechanism from the
//!   environment and configuration.
//! - **How is token password material minted and verified?** The
//!   [`security`] module derives passwords as `HMAC(secret_key, identifier)`
//!   and defines the [`security::SecretManager`] contract that token-issuing
//!   services implement.
//!
//! The three components are independent; none calls into another.
//!
//! # Module Structure
//!
//! - [`config`]: Key/value configuration with typed accessors and environment sources
//! - [`callback`]: Callback handler capability, class table, adapter, and registry
//! - [`mechanism`]: Once-per-process mechanism resolution
//! - [`security`]: Keys, passwords, key generation, the secret manager contract, and an in-memory manager
//! - [`util`]: Entropy sources
//! - `test_logging`: tracing bootstrap and assertion macros for tests (feature `test-internals`)

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod callback;
pub mod config;
pub mod mechanism;
pub mod security;
pub mod util;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_logging;

pub use callback::{
    Callback, CallbackError, CallbackHandler, CallbackHandlerRegistry, CallbackSlot,
    ClassDescriptor, ClassRegistry, DefaultHandler, HandlerBinding, RegistryError,
    UnsupportedCallback,
};
pub use config::{ConfigError, Configuration, EnvSource, MapEnv, ProcessEnv};
pub use mechanism::{Mechanism, MechanismError, MechanismResolver};
pub use security::{
    DelegationIdentifier, HmacAlgorithm, KeyGenerator, MemorySecretManager, Password,
    SecretError, SecretKey, SecretManager, SecretSettings, ServingState, TokenError,
    TokenIdentifier, create_password, create_secret_key,
};
