//! Shared helpers for integration tests.

#![allow(dead_code)]

pub use saslkit::test_logging::init_test_logging;

macro_rules! test_phase {
    ($name:expr) => {
        saslkit::test_phase!($name)
    };
}

macro_rules! test_complete {
    ($name:expr) => {
        saslkit::test_complete!($name)
    };
}

macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        saslkit::assert_with_log!($cond, $msg, $expected, $actual)
    };
}
