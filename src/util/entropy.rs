//! Entropy source abstraction for key generation.
//!
//! This module provides an OS-backed source for production and a seeded
//! deterministic source for tests. Sources take `&mut self`; callers that
//! share one across threads guard it with a lock.

use crate::util::DetRng;
use thiserror::Error;

/// The operating system could not supply random bytes.
#[derive(Debug, Error)]
#[error("entropy source {source_id} failed: {message}")]
pub struct EntropyError {
    source_id: &'static str,
    message: String,
}

impl EntropyError {
    /// Creates an entropy error for the given source.
    #[must_use]
    pub fn new(source_id: &'static str, message: impl Into<String>) -> Self {
        Self {
            source_id,
            message: message.into(),
        }
    }
}

/// Core trait for entropy providers.
pub trait EntropySource: Send + 'static {
    /// Fill a buffer with entropy bytes.
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), EntropyError>;

    /// Stable identifier for tracing and diagnostics.
    fn source_id(&self) -> &'static str;
}

/// OS-backed entropy source for production use.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(dest).map_err(|e| EntropyError::new("os", e.to_string()))
    }

    fn source_id(&self) -> &'static str {
        "os"
    }
}

/// Deterministic entropy source for tests.
#[derive(Debug, Clone)]
pub struct SeededEntropy {
    rng: DetRng,
    seed: u64,
}

impl SeededEntropy {
    /// Create a deterministic entropy source from a seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            rng: DetRng::new(seed),
            seed,
        }
    }

    /// The seed this source was created from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

impl EntropySource for SeededEntropy {
    fn fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.rng.fill_bytes(dest);
        Ok(())
    }

    fn source_id(&self) -> &'static str {
        "seeded"
    }
}
