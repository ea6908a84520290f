//! Configuration store with typed accessors.
//!
//! The security layer treats configuration as an opaque string key/value
//! store. [`Configuration`] keeps entries in a `BTreeMap` so iteration and
//! debug output are stable, and offers the typed accessors the resolvers
//! need (`get_or`, `get_int`, `get_class`, ...).
//!
//! # Example
//!
//! ```
//! use saslkit::config::{keys, Configuration};
//!
//! let mut conf = Configuration::new();
//! conf.set(keys::SECRET_MANAGER_KEY_LENGTH_KEY, "128");
//!
//! assert_eq!(conf.get_u32(keys::SECRET_MANAGER_KEY_LENGTH_KEY, 64).unwrap(), 128);
//! assert_eq!(conf.get_or(keys::SASL_MECHANISM_KEY, keys::SASL_MECHANISM_DEFAULT), "DIGEST-MD5");
//! ```

pub mod env;
#[cfg(feature = "config-file")]
pub mod file;
pub mod keys;

pub use env::{EnvSource, MapEnv, ProcessEnv};

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while reading or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value exists but cannot be parsed as the requested type.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// The configuration key.
        key: String,
        /// The raw value found.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Reading a configuration file failed.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// A configuration file is not valid TOML.
    #[cfg(feature = "config-file")]
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    fn invalid(key: &str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// String key/value configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    entries: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its previous value.
    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the raw value for `key`, or `default` when absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value for `key` with surrounding whitespace removed.
    ///
    /// Blank values count as absent.
    #[must_use]
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Returns the value of `key` parsed as a signed integer.
    pub fn get_int(&self, key: &str, default: i64) -> Result<i64, ConfigError> {
        match self.get_trimmed(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| ConfigError::invalid(key, raw, e)),
        }
    }

    /// Returns the value of `key` parsed as an unsigned 32-bit integer.
    pub fn get_u32(&self, key: &str, default: u32) -> Result<u32, ConfigError> {
        match self.get_trimmed(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid(key, raw, e)),
        }
    }

    /// Returns the class name configured for `key`, or `default`.
    #[must_use]
    pub fn get_class<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_trimmed(key).unwrap_or(default)
    }

    /// Returns `true` if `key` has a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut conf = Self::new();
        for (k, v) in iter {
            conf.set(k, v);
        }
        conf
    }
}
