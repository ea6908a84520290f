//! Named class descriptors.
//!
//! Rust has no run-time class loading, so a deployment registers every class
//! configuration may name ahead of time. A [`ClassDescriptor`] carries a
//! no-argument constructor, an optional cast to [`CallbackHandler`] for
//! classes that implement it natively, and a method table that
//! [`DelegatingHandler`](super::DelegatingHandler) searches when a class does
//! not.

use super::{CallbackHandler, CallbackSlot, UnsupportedCallback};
use core::any::Any;
use core::fmt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// A constructed, type-erased object.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// The type-erased body of a `handle_callbacks` method.
///
/// The first argument is the receiver the method was looked up on.
pub type HandleCallbacksFn = Arc<
    dyn Fn(&(dyn Any + Send + Sync), &mut [CallbackSlot], &str, &[u8]) -> Result<(), InvocationError>
        + Send
        + Sync,
>;

type Constructor = Arc<dyn Fn() -> Result<Instance, InstantiationError> + Send + Sync>;
type HandlerCast = Arc<dyn Fn(Instance) -> Option<Arc<dyn CallbackHandler>> + Send + Sync>;

/// A constructor failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to instantiate {class}: {reason}")]
pub struct InstantiationError {
    class: String,
    reason: String,
}

impl InstantiationError {
    /// Creates an instantiation error.
    #[must_use]
    pub fn new(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// The class that failed to construct.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }
}

/// Failure raised by a method invoked through a method table.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The method rejected a callback. Propagated unchanged.
    #[error(transparent)]
    Unsupported(#[from] UnsupportedCallback),
    /// The receiver could not be accessed as the method's declaring type.
    #[error("illegal access: {0}")]
    Access(String),
    /// The method body failed.
    #[error("invocation failed")]
    Failed(#[source] Box<dyn StdError + Send + Sync>),
}

impl InvocationError {
    /// Wraps an arbitrary failure from a method body.
    pub fn failed(cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Failed(cause.into())
    }
}

/// Outcome of [`ClassDescriptor::method`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodLookup<M> {
    /// The method exists with the expected type.
    Found(M),
    /// No method has that name.
    Missing,
    /// A method has that name but a different signature.
    Mismatch,
}

/// A registered class: constructor, optional handler cast, and methods.
#[derive(Clone)]
pub struct ClassDescriptor {
    name: Arc<str>,
    constructor: Constructor,
    as_handler: Option<HandlerCast>,
    methods: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ClassDescriptor {
    /// Describes a plain class with a no-argument constructor.
    pub fn new<T, F>(name: impl Into<Arc<str>>, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T, InstantiationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            constructor: Arc::new(move || constructor().map(|v| Arc::new(v) as Instance)),
            as_handler: None,
            methods: HashMap::new(),
        }
    }

    /// Describes a class that implements [`CallbackHandler`] itself.
    pub fn handler<T, F>(name: impl Into<Arc<str>>, constructor: F) -> Self
    where
        T: CallbackHandler + Any,
        F: Fn() -> Result<T, InstantiationError> + Send + Sync + 'static,
    {
        let mut desc = Self::new(name, constructor);
        desc.as_handler = Some(Arc::new(|instance: Instance| {
            instance
                .downcast::<T>()
                .ok()
                .map(|h| h as Arc<dyn CallbackHandler>)
        }));
        desc
    }

    /// Adds a method under `name`. The body may be any type; callers look it
    /// up by the type they expect.
    #[must_use]
    pub fn with_method(mut self, name: impl Into<String>, body: impl Any + Send + Sync) -> Self {
        self.methods.insert(name.into(), Arc::new(body));
        self
    }

    /// Adds a [`HANDLE_CALLBACKS`](super::HANDLE_CALLBACKS) method declared on `T`.
    #[must_use]
    pub fn with_handle_callbacks<T, F>(self, body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &mut [CallbackSlot], &str, &[u8]) -> Result<(), InvocationError>
            + Send
            + Sync
            + 'static,
    {
        let declaring = std::any::type_name::<T>();
        let erased: HandleCallbacksFn = Arc::new(
            move |receiver: &(dyn Any + Send + Sync),
                  callbacks: &mut [CallbackSlot],
                  name: &str,
                  password: &[u8]| {
                let this = receiver.downcast_ref::<T>().ok_or_else(|| {
                    InvocationError::Access(format!("receiver is not a {declaring}"))
                })?;
                body(this, callbacks, name, password)
            },
        );
        self.with_method(super::HANDLE_CALLBACKS, erased)
    }

    /// The class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the no-argument constructor.
    pub fn instantiate(&self) -> Result<Instance, InstantiationError> {
        (self.constructor)()
    }

    /// Views `instance` as a native handler, if this class is one.
    #[must_use]
    pub fn as_callback_handler(&self, instance: &Instance) -> Option<Arc<dyn CallbackHandler>> {
        self.as_handler
            .as_ref()
            .and_then(|cast| cast(Arc::clone(instance)))
    }

    /// Looks up a method body by name and expected type.
    #[must_use]
    pub fn method<M: Any + Clone>(&self, name: &str) -> MethodLookup<M> {
        match self.methods.get(name) {
            None => MethodLookup::Missing,
            Some(body) => body
                .downcast_ref::<M>()
                .cloned()
                .map_or(MethodLookup::Mismatch, MethodLookup::Found),
        }
    }

    /// Returns `true` if a method of any type is registered under `name`.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("native_handler", &self.as_handler.is_some())
            .field("methods", &methods)
            .finish_non_exhaustive()
    }
}

/// The table of classes configuration may name.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, ClassDescriptor>>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class, replacing any previous class of the same name.
    pub fn register(&self, descriptor: ClassDescriptor) {
        self.classes
            .write()
            .insert(descriptor.name().to_owned(), descriptor);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(self, descriptor: ClassDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ClassDescriptor> {
        self.classes.read().get(name).cloned()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}
