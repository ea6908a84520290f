//! Concurrent cache of resolved callback handlers.
//!
//! # Resolution
//!
//! ```text
//! resolve(key, conf)
//!     │
//!     ├─ cached? ──────────────────────────────► binding         (shared read)
//!     │
//!     └─ miss: serialize with other misses, re-check, then
//!          class = conf[key] or DefaultHandler
//!          ├─ DefaultHandler ──────────────────► default
//!          ├─ unknown class / ctor fails ──────► default         (warn)
//!          ├─ implements CallbackHandler ──────► native
//!          ├─ has handle_callbacks ────────────► adapted
//!          └─ neither ─────────────────────────► RegistryError::Adapter
//! ```
//!
//! Every binding is inserted before it is returned, so all callers racing on
//! a cold key observe the same handler. Readers are never blocked by a miss in
//! progress; only the final insert takes the cache lock exclusively.
//!
//! Misses serialize on a reentrant lock and hold no cache lock while a
//! constructor runs, so a handler constructor may itself resolve another key
//! through the same registry.

use super::adapter::{AdapterError, DelegatingHandler};
use super::class::ClassRegistry;
use super::{CallbackError, CallbackHandler, CallbackSlot, DefaultHandler};
use crate::config::Configuration;
use core::fmt;
use parking_lot::{ReentrantMutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Resolution failed with no safe fallback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The configured class cannot serve as a callback handler.
    #[error("{key}: {source}")]
    Adapter {
        /// The configuration key being resolved.
        key: String,
        /// Why the class could not be adapted.
        #[source]
        source: AdapterError,
    },
}

/// How a binding's handler was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// The built-in [`DefaultHandler`].
    Default,
    /// A class implementing [`CallbackHandler`] directly.
    Native {
        /// The configured class name.
        class: Arc<str>,
    },
    /// A class wrapped in a [`DelegatingHandler`].
    Adapted {
        /// The configured class name.
        class: Arc<str>,
    },
}

/// A resolved, immutable handler for one configuration key.
#[derive(Clone)]
pub struct HandlerBinding {
    handler: Arc<dyn CallbackHandler>,
    kind: BindingKind,
}

impl HandlerBinding {
    fn new(handler: Arc<dyn CallbackHandler>, kind: BindingKind) -> Self {
        Self { handler, kind }
    }

    /// The resolved handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn CallbackHandler> {
        &self.handler
    }

    /// How the handler was obtained.
    #[must_use]
    pub fn kind(&self) -> &BindingKind {
        &self.kind
    }

    /// Returns `true` for the built-in default handler.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.kind == BindingKind::Default
    }

    /// The configured class name, or [`DefaultHandler::CLASS_NAME`].
    #[must_use]
    pub fn class_name(&self) -> &str {
        match &self.kind {
            BindingKind::Default => DefaultHandler::CLASS_NAME,
            BindingKind::Native { class } | BindingKind::Adapted { class } => class,
        }
    }

    /// Returns `true` if both bindings share one handler object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl CallbackHandler for HandlerBinding {
    fn handle_callbacks(
        &self,
        callbacks: &mut [CallbackSlot],
        name: &str,
        password: &[u8],
    ) -> Result<(), CallbackError> {
        self.handler.handle_callbacks(callbacks, name, password)
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Maps configuration keys to resolved callback handlers.
///
/// The cache is owned by the registry instance; share the registry (for
/// example behind an `Arc`) to share resolutions.
pub struct CallbackHandlerRegistry {
    classes: Arc<ClassRegistry>,
    default: HandlerBinding,
    cache: RwLock<HashMap<String, HandlerBinding>>,
    miss: ReentrantMutex<()>,
}

impl CallbackHandlerRegistry {
    /// Creates an empty registry resolving class names against `classes`.
    #[must_use]
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self {
            classes,
            default: HandlerBinding::new(Arc::new(DefaultHandler), BindingKind::Default),
            cache: RwLock::new(HashMap::new()),
            miss: ReentrantMutex::new(()),
        }
    }

    /// Returns the handler bound to `key`, resolving it on first use.
    ///
    /// Instantiation failures fall back to the default handler and are only
    /// logged. A class that neither implements [`CallbackHandler`] nor exposes
    /// `handle_callbacks` is an error, and nothing is cached for `key`.
    pub fn resolve(&self, key: &str, conf: &Configuration) -> Result<HandlerBinding, RegistryError> {
        if let Some(binding) = self.get(key) {
            return Ok(binding);
        }

        let _miss = self.miss.lock();
        if let Some(binding) = self.get(key) {
            return Ok(binding);
        }
        let binding = self.bind(key, conf)?;
        // A nested resolve of the same key on this thread may have won.
        let binding = self
            .cache
            .write()
            .entry(key.to_owned())
            .or_insert(binding)
            .clone();
        Ok(binding)
    }

    /// Returns the cached binding for `key` without resolving.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<HandlerBinding> {
        self.cache.read().get(key).cloned()
    }

    /// Drops every cached binding.
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Number of cached bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// The shared default binding.
    #[must_use]
    pub fn default_binding(&self) -> &HandlerBinding {
        &self.default
    }

    /// The class table names are resolved against.
    #[must_use]
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    fn bind(&self, key: &str, conf: &Configuration) -> Result<HandlerBinding, RegistryError> {
        let class = conf.get_class(key, DefaultHandler::CLASS_NAME);
        info!(key, class, "resolving callback handler");
        if class == DefaultHandler::CLASS_NAME {
            return Ok(self.default.clone());
        }

        let Some(descriptor) = self.classes.lookup(class) else {
            warn!(
                key,
                class,
                fallback = DefaultHandler::CLASS_NAME,
                "callback handler class not found"
            );
            return Ok(self.default.clone());
        };
        let instance = match descriptor.instantiate() {
            Ok(instance) => instance,
            Err(error) => {
                warn!(
                    key,
                    class,
                    fallback = DefaultHandler::CLASS_NAME,
                    error = %error,
                    "failed to create a new instance"
                );
                return Ok(self.default.clone());
            }
        };

        let class: Arc<str> = Arc::from(class);
        if let Some(handler) = descriptor.as_callback_handler(&instance) {
            return Ok(HandlerBinding::new(handler, BindingKind::Native { class }));
        }
        let adapter =
            DelegatingHandler::new(&descriptor, instance).map_err(|source| RegistryError::Adapter {
                key: key.to_owned(),
                source,
            })?;
        Ok(HandlerBinding::new(
            Arc::new(adapter),
            BindingKind::Adapted { class },
        ))
    }
}

impl fmt::Debug for CallbackHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandlerRegistry")
            .field("classes", &self.classes.len())
            .field("cached", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::{ClassDescriptor, InstantiationError, UnsupportedCallback};
    use crate::config::keys;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, OnceLock, Weak, mpsc};
    use std::time::Duration;

    const KEY: &str = keys::CUSTOMIZED_CALLBACK_HANDLER_CLASS_KEY;

    struct Counting;

    impl CallbackHandler for Counting {
        fn handle_callbacks(
            &self,
            callbacks: &mut [CallbackSlot],
            _name: &str,
            _password: &[u8],
        ) -> Result<(), CallbackError> {
            if callbacks.len() > 1 {
                return Err(UnsupportedCallback::new("too many").into());
            }
            Ok(())
        }
    }

    fn registry_with(counter: &Arc<AtomicUsize>) -> CallbackHandlerRegistry {
        let ctor_calls = Arc::clone(counter);
        let classes = ClassRegistry::new()
            .with(ClassDescriptor::handler("demo.Counting", move || {
                ctor_calls.fetch_add(1, Ordering::SeqCst);
                Ok(Counting)
            }))
            .with(ClassDescriptor::new::<(), _>("demo.Broken", || {
                Err(InstantiationError::new("demo.Broken", "missing dependency"))
            }))
            .with(ClassDescriptor::new("demo.Inert", || Ok(0_u32)))
            .with(
                ClassDescriptor::new("demo.Delegate", || Ok(()))
                    .with_handle_callbacks(|_: &(), _, _, _| Ok(())),
            );
        CallbackHandlerRegistry::new(Arc::new(classes))
    }

    fn conf(class: &str) -> Configuration {
        Configuration::new().with(KEY, class)
    }

    #[test]
    fn unconfigured_key_resolves_to_default() {
        let registry = registry_with(&Arc::new(AtomicUsize::new(0)));
        let binding = registry.resolve(KEY, &Configuration::new()).unwrap();
        assert!(binding.is_default());
        assert!(binding.ptr_eq(registry.default_binding()));
        assert_eq!(binding.class_name(), DefaultHandler::CLASS_NAME);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn explicit_default_class_resolves_to_default() {
        let registry = registry_with(&Arc::new(AtomicUsize::new(0)));
        let binding = registry
            .resolve(KEY, &conf(DefaultHandler::CLASS_NAME))
            .unwrap();
        assert!(binding.is_default());
    }

    #[test]
    fn native_class_used_directly() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&counter);
        let binding = registry.resolve(KEY, &conf("demo.Counting")).unwrap();
        assert_eq!(
            binding.kind(),
            &BindingKind::Native {
                class: Arc::from("demo.Counting")
            }
        );
        binding.handle_callbacks(&mut [None], "", &[]).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cached_binding_is_reused() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&counter);
        let cfg = conf("demo.Counting");
        let first = registry.resolve(KEY, &cfg).unwrap();
        let second = registry.resolve(KEY, &Configuration::new()).unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(registry.get(KEY).unwrap().ptr_eq(&first));
    }

    #[test]
    fn construction_failure_falls_back_to_default() {
        let registry = registry_with(&Arc::new(AtomicUsize::new(0)));
        let binding = registry.resolve(KEY, &conf("demo.Broken")).unwrap();
        assert!(binding.is_default());
    }

    #[test]
    fn unknown_class_falls_back_to_default() {
        let registry = registry_with(&Arc::new(AtomicUsize::new(0)));
        let binding = registry.resolve(KEY, &conf("demo.Nowhere")).unwrap();
        assert!(binding.is_default());
    }

    #[test]
    fn delegate_class_is_adapted() {
        let registry = registry_with(&Arc::new(AtomicUsize::new(0)));
        let binding = registry.resolve(KEY, &conf("  demo.Delegate ")).unwrap();
        assert!(matches!(binding.kind(), BindingKind::Adapted { .. }));
        assert_eq!(binding.class_name(), "demo.Delegate");
        binding.handle_callbacks(&mut [], "bob", b"pw").unwrap();
    }

    #[test]
    fn class_without_method_is_an_error_and_not_cached() {
        let registry = registry_with(&Arc::new(AtomicUsize::new(0)));
        let err = registry.resolve(KEY, &conf("demo.Inert")).unwrap_err();
        let RegistryError::Adapter { key, source } = err;
        assert_eq!(key, KEY);
        assert!(matches!(source, AdapterError::MissingMethod { .. }));
        assert!(registry.get(KEY).is_none());
    }

    #[test]
    fn clear_forces_reinstantiation() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&counter);
        let cfg = conf("demo.Counting");
        let before = registry.resolve(KEY, &cfg).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        let after = registry.resolve(KEY, &cfg).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(!before.ptr_eq(&after));
    }

    #[test]
    fn keys_resolve_independently() {
        let registry = registry_with(&Arc::new(AtomicUsize::new(0)));
        let cfg = Configuration::new()
            .with("a.class", "demo.Counting")
            .with("b.class", "demo.Delegate");
        let a = registry.resolve("a.class", &cfg).unwrap();
        let b = registry.resolve("b.class", &cfg).unwrap();
        assert!(!a.ptr_eq(&b));
        assert_eq!(registry.len(), 2);
    }

    struct Outer {
        inner: HandlerBinding,
    }

    impl CallbackHandler for Outer {
        fn handle_callbacks(
            &self,
            callbacks: &mut [CallbackSlot],
            name: &str,
            password: &[u8],
        ) -> Result<(), CallbackError> {
            self.inner.handle_callbacks(callbacks, name, password)
        }
    }

    #[test]
    fn constructor_may_resolve_through_same_registry() {
        let counter = Arc::new(AtomicUsize::new(0));
        let slot: Arc<OnceLock<Weak<CallbackHandlerRegistry>>> = Arc::new(OnceLock::new());
        let cfg = Configuration::new()
            .with("outer.class", "demo.Outer")
            .with("inner.class", "demo.Counting");

        let registry = {
            let slot = Arc::clone(&slot);
            let inner_cfg = cfg.clone();
            let ctor_calls = Arc::clone(&counter);
            let classes = ClassRegistry::new()
                .with(ClassDescriptor::handler("demo.Counting", move || {
                    ctor_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Counting)
                }))
                .with(ClassDescriptor::handler("demo.Outer", move || {
                    let registry = slot
                        .get()
                        .and_then(Weak::upgrade)
                        .ok_or_else(|| InstantiationError::new("demo.Outer", "no registry"))?;
                    let inner = registry
                        .resolve("inner.class", &inner_cfg)
                        .map_err(|e| InstantiationError::new("demo.Outer", e.to_string()))?;
                    Ok(Outer { inner })
                }));
            Arc::new(CallbackHandlerRegistry::new(Arc::new(classes)))
        };
        slot.set(Arc::downgrade(&registry)).unwrap();

        let (tx, rx) = mpsc::channel();
        let worker = Arc::clone(&registry);
        let worker_cfg = cfg.clone();
        std::thread::spawn(move || {
            let _ = tx.send(worker.resolve("outer.class", &worker_cfg));
        });
        let outer = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("nested resolve did not finish")
            .unwrap();

        assert_eq!(outer.class_name(), "demo.Outer");
        let inner = registry.get("inner.class").unwrap();
        assert_eq!(inner.class_name(), "demo.Counting");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 2);
        outer.handle_callbacks(&mut [None], "", &[]).unwrap();
    }

    #[test]
    fn concurrent_first_resolution_installs_one_binding() {
        const THREADS: usize = 16;
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = registry_with(&counter);
        let cfg = conf("demo.Counting");
        let barrier = Barrier::new(THREADS);

        let bindings: Vec<HandlerBinding> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        registry.resolve(KEY, &cfg).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
        let cached = registry.get(KEY).unwrap();
        assert!(bindings.iter().all(|b| b.ptr_eq(&cached)));
    }
}
