//! Environment variable sources.
//!
//! Resolvers read the environment through [`EnvSource`] so tests can supply
//! a fixed environment instead of mutating the process one.

use std::collections::HashMap;
use std::ffi::OsString;
use tracing::warn;

/// A read-only view of environment variables.
pub trait EnvSource: Send + Sync + 'static {
    /// Returns the value of `name`, or `None` if unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
///
/// A set variable whose value is not valid Unicode is returned lossily
/// (invalid sequences become U+FFFD) rather than reported as unset, so it
/// still takes part in comparisons and shows up in their errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|value| decode(name, value))
    }
}

fn decode(name: &str, value: OsString) -> String {
    value.into_string().unwrap_or_else(|raw| {
        let lossy = raw.to_string_lossy().into_owned();
        warn!(name, value = %lossy, "environment variable is not valid unicode");
        lossy
    })
}

/// An in-memory environment.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
