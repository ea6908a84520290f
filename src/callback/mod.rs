//! Pluggable SASL callback handlers.
//!
//! A negotiation layer collects [`Callback`]s (requests for credential
//! material and the like) and hands them to a [`CallbackHandler`]. Which
//! handler applies is a deployment decision: a configuration key names a
//! class, and [`CallbackHandlerRegistry`] resolves that name once, caching the
//! resulting [`HandlerBinding`].
//!
//! # Handler kinds
//!
//! | Binding | Source | Behavior |
//! |---------|--------|----------|
//! | default | nothing configured, or construction failed | rejects any non-empty callback list |
//! | native | class implements [`CallbackHandler`] | called directly |
//! | adapted | class exposes a `handle_callbacks` method | called through [`DelegatingHandler`] |
//!
//! Classes are described ahead of time in a [`ClassRegistry`], which stands in
//! for run-time class loading.

pub mod adapter;
pub mod class;
pub mod registry;

pub use adapter::{AdapterError, DelegatingHandler, HANDLE_CALLBACKS};
pub use class::{
    ClassDescriptor, ClassRegistry, HandleCallbacksFn, Instance, InstantiationError,
    InvocationError, MethodLookup,
};
pub use registry::{BindingKind, CallbackHandlerRegistry, HandlerBinding, RegistryError};

use core::any::Any;
use core::fmt;
use std::io;
use thiserror::Error;

/// An opaque negotiation request serviced by a [`CallbackHandler`].
///
/// Handlers classify callbacks by downcasting:
///
/// ```
/// use saslkit::callback::Callback;
///
/// #[derive(Debug)]
/// struct NameCallback(Option<String>);
/// impl Callback for NameCallback {}
///
/// let mut cb: Box<dyn Callback> = Box::new(NameCallback(None));
/// if let Some(name) = cb.downcast_mut::<NameCallback>() {
///     name.0 = Some("alice".into());
/// }
/// assert_eq!(cb.downcast_ref::<NameCallback>().unwrap().0.as_deref(), Some("alice"));
/// ```
pub trait Callback: Any + Send + fmt::Debug {
    /// The run-time type name reported in unsupported-callback errors.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Callback {
    /// Returns `true` if the callback is a `T`.
    #[must_use]
    pub fn is<T: Callback>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    /// Downcasts to a concrete callback type.
    #[must_use]
    pub fn downcast_ref<T: Callback>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }

    /// Mutably downcasts to a concrete callback type.
    pub fn downcast_mut<T: Callback>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut::<T>()
    }
}

/// One entry of a callback list. `None` is an absent callback.
pub type CallbackSlot = Option<Box<dyn Callback>>;

/// A callback kind the handler cannot service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported callback: {callback}")]
pub struct UnsupportedCallback {
    callback: String,
}

impl UnsupportedCallback {
    /// Reported for an absent callback.
    pub const UNKNOWN: &'static str = "unknown";

    /// Creates the error for the callback in `slot`.
    #[must_use]
    pub fn for_slot(slot: &CallbackSlot) -> Self {
        Self::new(slot.as_deref().map_or(Self::UNKNOWN, Callback::type_name))
    }

    /// Creates the error naming a callback type directly.
    #[must_use]
    pub fn new(callback: impl Into<String>) -> Self {
        Self {
            callback: callback.into(),
        }
    }

    /// The offending callback's type name, or `"unknown"`.
    #[must_use]
    pub fn callback(&self) -> &str {
        &self.callback
    }
}

/// Errors returned by [`CallbackHandler::handle_callbacks`].
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The handler does not service a callback in the list.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedCallback),
    /// Forwarding to a delegate failed.
    #[error("Failed to invoke {method}")]
    Io {
        /// The delegate method that was invoked.
        method: String,
        /// The original failure.
        #[source]
        source: io::Error,
    },
}

impl CallbackError {
    /// Returns `true` for an unsupported-callback failure.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }

    /// Returns `true` for an I/O-class forwarding failure.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Services a list of callbacks for the named principal.
pub trait CallbackHandler: Send + Sync {
    /// Handles `callbacks`, filling in what it can.
    ///
    /// Fails with [`CallbackError::Unsupported`] on the first callback it
    /// does not recognize.
    fn handle_callbacks(
        &self,
        callbacks: &mut [CallbackSlot],
        name: &str,
        password: &[u8],
    ) -> Result<(), CallbackError>;
}

/// The built-in handler: accepts an empty list and rejects anything else.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultHandler;

impl DefaultHandler {
    /// The class name configuration uses to select this handler.
    pub const CLASS_NAME: &'static str = "saslkit.callback.DefaultHandler";
}

impl CallbackHandler for DefaultHandler {
    fn handle_callbacks(
        &self,
        callbacks: &mut [CallbackSlot],
        _name: &str,
        _password: &[u8],
    ) -> Result<(), CallbackError> {
        match callbacks.first() {
            None => Ok(()),
            Some(first) => Err(UnsupportedCallback::for_slot(first).into()),
        }
    }
}
