//! SASL mechanism selection.
//!
//! The mechanism can be set in two places: the `HADOOP_SASL_MECHANISM`
//! environment variable and the `hadoop.security.sasl.mechanism`
//! configuration entry (which defaults to `DIGEST-MD5`). When the
//! environment variable is set it must agree with the configuration value;
//! a disagreement is a hard error naming both sources.
//!
//! [`MechanismResolver::get_mechanism`] resolves on first use under a lock
//! and memoizes the result. A failed resolution caches nothing, so a later
//! call reads both sources again. Once memoized, reads take no lock.
//! [`MechanismResolver::eager`] resolves at construction instead.

use crate::config::{Configuration, EnvSource, ProcessEnv, keys};
use core::fmt;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::debug;

/// A negotiation mechanism name, e.g. `DIGEST-MD5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mechanism(Arc<str>);

impl Mechanism {
    /// The built-in default mechanism.
    #[must_use]
    pub fn default_mechanism() -> Self {
        Self::from(keys::SASL_MECHANISM_DEFAULT)
    }

    /// The mechanism name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is the built-in default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        MechanismResolver::is_default_mechanism(&self.0)
    }
}

impl From<&str> for Mechanism {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for Mechanism {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for Mechanism {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Mechanism {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Mechanism {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mechanism resolution failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MechanismError {
    /// The environment and configuration name different mechanisms.
    #[error(
        "SASL Mechanism mismatched: env {env_var} is {env_value} but conf {conf_key} is {conf_value}"
    )]
    Mismatch {
        /// The environment variable consulted.
        env_var: &'static str,
        /// Its value.
        env_value: String,
        /// The configuration key consulted.
        conf_key: &'static str,
        /// Its value, or the default when absent.
        conf_value: String,
    },
}

/// Resolves and memoizes the effective SASL mechanism.
pub struct MechanismResolver {
    env: Arc<dyn EnvSource>,
    conf: Configuration,
    resolved: OnceLock<Mechanism>,
    init: Mutex<()>,
}

impl MechanismResolver {
    /// Creates a resolver over an environment source and configuration.
    /// Nothing is read until [`get_mechanism`](Self::get_mechanism).
    #[must_use]
    pub fn new(env: impl EnvSource, conf: Configuration) -> Self {
        Self {
            env: Arc::new(env),
            conf,
            resolved: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Creates a resolver reading the process environment.
    #[must_use]
    pub fn from_process_env(conf: Configuration) -> Self {
        Self::new(ProcessEnv, conf)
    }

    /// Creates a resolver and resolves immediately, so a conflict surfaces
    /// at construction.
    pub fn eager(env: impl EnvSource, conf: Configuration) -> Result<Self, MechanismError> {
        let resolver = Self::new(env, conf);
        resolver.get_mechanism()?;
        Ok(resolver)
    }

    /// Returns the effective mechanism, resolving it on first use.
    pub fn get_mechanism(&self) -> Result<Mechanism, MechanismError> {
        if let Some(mechanism) = self.resolved.get() {
            return Ok(mechanism.clone());
        }
        let _init = self.init.lock();
        if let Some(mechanism) = self.resolved.get() {
            return Ok(mechanism.clone());
        }
        let mechanism = self.compute()?;
        Ok(self.resolved.get_or_init(|| mechanism).clone())
    }

    /// Returns `true` if `mechanism` is the built-in default.
    #[must_use]
    pub fn is_default_mechanism(mechanism: &str) -> bool {
        mechanism == keys::SASL_MECHANISM_DEFAULT
    }

    /// Returns `true` once a mechanism has been memoized.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Forgets the memoized mechanism; the next call resolves again.
    pub fn reset(&mut self) {
        self.resolved.take();
    }

    fn compute(&self) -> Result<Mechanism, MechanismError> {
        let env_value = self.env.var(keys::SASL_MECHANISM_ENV);
        debug!(
            name = keys::SASL_MECHANISM_ENV,
            value = ?env_value,
            "sasl mechanism (env)"
        );
        let conf_value = self
            .conf
            .get_or(keys::SASL_MECHANISM_KEY, keys::SASL_MECHANISM_DEFAULT);
        debug!(
            name = keys::SASL_MECHANISM_KEY,
            value = conf_value,
            "sasl mechanism (conf)"
        );

        let effective = match env_value {
            Some(env_value) if env_value != conf_value => {
                return Err(MechanismError::Mismatch {
                    env_var: keys::SASL_MECHANISM_ENV,
                    env_value,
                    conf_key: keys::SASL_MECHANISM_KEY,
                    conf_value: conf_value.to_owned(),
                });
            }
            Some(env_value) => Mechanism::from(env_value),
            None => Mechanism::from(conf_value),
        };
        debug!(mechanism = %effective, "sasl mechanism (effective)");
        Ok(effective)
    }
}

impl fmt::Debug for MechanismResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MechanismResolver")
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}
