//! Adapter for classes that handle callbacks without implementing
//! [`CallbackHandler`].
//!
//! The `handle_callbacks` method is located and type-checked once, when the
//! adapter is built. A class without it cannot be adapted at all, so a bad
//! configuration fails at first resolution instead of on every call.

use super::class::{ClassDescriptor, HandleCallbacksFn, Instance, InvocationError, MethodLookup};
use super::{CallbackError, CallbackHandler, CallbackSlot};
use core::fmt;
use std::io;
use thiserror::Error;
use tracing::debug;

/// Name of the method a delegate must expose.
pub const HANDLE_CALLBACKS: &str = "handle_callbacks";

/// A delegate class cannot be adapted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The class has no method with the expected name.
    #[error("Failed to get method {method} from {class}")]
    MissingMethod {
        /// The delegate class.
        class: String,
        /// The method looked up.
        method: &'static str,
    },
    /// The class has a method with the expected name but another signature.
    #[error("Method {method} of {class} does not take (callbacks, name, password)")]
    SignatureMismatch {
        /// The delegate class.
        class: String,
        /// The method looked up.
        method: &'static str,
    },
}

/// Forwards callbacks to a delegate's `handle_callbacks` method.
pub struct DelegatingHandler {
    class: String,
    receiver: Instance,
    method: HandleCallbacksFn,
}

impl DelegatingHandler {
    /// Wraps `receiver`, an instance of `descriptor`'s class.
    pub fn new(descriptor: &ClassDescriptor, receiver: Instance) -> Result<Self, AdapterError> {
        let class = descriptor.name().to_owned();
        let method = match descriptor.method::<HandleCallbacksFn>(HANDLE_CALLBACKS) {
            MethodLookup::Found(method) => method,
            MethodLookup::Missing => {
                return Err(AdapterError::MissingMethod {
                    class,
                    method: HANDLE_CALLBACKS,
                });
            }
            MethodLookup::Mismatch => {
                return Err(AdapterError::SignatureMismatch {
                    class,
                    method: HANDLE_CALLBACKS,
                });
            }
        };
        debug!(class = %class, "adapted delegate callback handler");
        Ok(Self {
            class,
            receiver,
            method,
        })
    }

    /// The delegate's class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// The wrapped delegate.
    #[must_use]
    pub fn receiver(&self) -> &Instance {
        &self.receiver
    }

    fn invocation_failure(&self, source: io::Error) -> CallbackError {
        CallbackError::Io {
            method: format!("{}::{HANDLE_CALLBACKS}", self.class),
            source,
        }
    }
}

impl CallbackHandler for DelegatingHandler {
    fn handle_callbacks(
        &self,
        callbacks: &mut [CallbackSlot],
        name: &str,
        password: &[u8],
    ) -> Result<(), CallbackError> {
        (self.method)(&*self.receiver, callbacks, name, password).map_err(|err| match err {
            InvocationError::Unsupported(unsupported) => CallbackError::Unsupported(unsupported),
            InvocationError::Access(msg) => self.invocation_failure(io::Error::other(msg)),
            InvocationError::Failed(cause) => self.invocation_failure(io::Error::other(cause)),
        })
    }
}

impl fmt::Debug for DelegatingHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingHandler")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}
