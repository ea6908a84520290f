//! Logging bootstrap and assertion helpers for tests.
//!
//! ```ignore
//! saslkit::test_logging::init_test_logging();
//! saslkit::test_phase!("registry_resolves_default");
//! saslkit::assert_with_log!(binding.is_default(), "default binding", true, binding.is_default());
//! saslkit::test_complete!("registry_resolves_default");
//! ```
//!
//! `RUST_LOG` overrides the default filter (`saslkit=debug`).

use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "saslkit=debug";

/// Installs a test-writer fmt subscriber. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Logs the start of a test phase.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        ::tracing::info!(phase = %$name, "test phase start")
    };
}

/// Logs the successful end of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        ::tracing::info!(test = %$name, "test complete")
    };
}

/// Asserts `cond`, logging the expectation and the observed value first.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {{
        let ok = $cond;
        ::tracing::debug!(
            what = %$msg,
            expected = ?$expected,
            actual = ?$actual,
            ok,
            "assertion"
        );
        assert!(ok, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    }};
}
