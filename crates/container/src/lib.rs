//! Socle Container - process-wide service binding store
//!
//! This crate provides the container every other part of the runtime hangs
//! off: a mutable mapping from a binding key (type identity plus an optional
//! qualifier) to either a singleton instance or a factory invoked fresh on
//! every resolution. System aspects receive the container during bootstrap
//! and add or override bindings through the same API.
//!
//! The container is built for single-threaded bootstrap use and carries no
//! internal locking. Once bootstrap hands it back, callers that want to keep
//! mutating it concurrently must bring their own discipline.
//!
//! # Examples
//!
//! ```rust
//! use socle_container::Container;
//!
//! let mut container = Container::new();
//! container.register(42u32);
//!
//! let value = container.resolve::<u32>().unwrap();
//! assert_eq!(*value, 42);
//! ```

pub mod domain;
pub mod error;

pub use domain::{DomainModel, DomainType};
pub use error::{ContainerError, Result};

// Used by the `domain_type!` macro expansion.
#[doc(hidden)]
pub use inventory;

use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Boxed error type carried by factories and aspect configuration.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Identifier a value or factory is stored under: a type identity plus an
/// optional string qualifier for multiple bindings of the same type.
///
/// The type name is carried for diagnostics only and takes no part in
/// identity.
#[derive(Debug, Clone)]
pub struct BindingKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<Cow<'static, str>>,
}

impl BindingKey {
    /// Key for the plain type identity of `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            qualifier: None,
        }
    }

    /// Key for `T` under an explicit qualifier.
    pub fn qualified<T: Any>(qualifier: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            qualifier: Some(qualifier.into()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }
}

impl PartialEq for BindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for BindingKey {}

impl Hash for BindingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{}#{}", self.type_name, qualifier),
            None => f.write_str(self.type_name),
        }
    }
}

type Shared = Arc<dyn Any + Send + Sync>;
type FactoryFn = dyn Fn(&Container) -> std::result::Result<Shared, BoxError> + Send + Sync;

/// One slot in the container: a singleton, or a factory invoked per
/// resolution. The container never memoizes factory products.
enum Binding {
    Instance(Shared),
    Factory(Arc<FactoryFn>),
}

/// Process-wide service registry.
///
/// Created once per bootstrap run and alive for as long as the caller keeps
/// it. A key maps to at most one binding at a time; plain registration
/// overwrites, while [`Container::register_instance`] can forbid override.
#[derive(Default)]
pub struct Container {
    bindings: HashMap<BindingKey, Binding>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` as a singleton under its own type identity,
    /// unconditionally overwriting any previous binding.
    pub fn register<T: Any + Send + Sync>(&mut self, value: T) {
        let key = BindingKey::of::<T>();
        tracing::debug!("binding singleton for {key}");
        self.bindings.insert(key, Binding::Instance(Arc::new(value)));
    }

    /// Binds a factory under the type identity of its product. Every
    /// resolution invokes the factory fresh; side-effecting factories (such
    /// as one opening a connection) produce a new result per call.
    pub fn register_factory<T, F>(&mut self, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.put_factory(BindingKey::of::<T>(), factory);
    }

    /// Binds a factory under `T` plus an explicit qualifier.
    pub fn register_factory_named<T, F>(&mut self, qualifier: impl Into<Cow<'static, str>>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.put_factory(BindingKey::qualified::<T>(qualifier), factory);
    }

    /// Binds `value` as a singleton, failing with
    /// [`ContainerError::DuplicateBinding`] when the key is already bound and
    /// `allow_override` is false. Failure leaves the container untouched.
    pub fn register_instance<T: Any + Send + Sync>(
        &mut self,
        value: T,
        allow_override: bool,
    ) -> Result<()> {
        self.put_instance(BindingKey::of::<T>(), Arc::new(value), allow_override)
    }

    /// Qualified form of [`Container::register_instance`].
    pub fn register_instance_named<T: Any + Send + Sync>(
        &mut self,
        qualifier: impl Into<Cow<'static, str>>,
        value: T,
        allow_override: bool,
    ) -> Result<()> {
        self.put_instance(BindingKey::qualified::<T>(qualifier), Arc::new(value), allow_override)
    }

    /// Resolves the binding under the type identity of `T`: the singleton
    /// instance, or a fresh factory product.
    pub fn resolve<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.resolve_key(&BindingKey::of::<T>())
    }

    /// Resolves the binding under `T` plus an explicit qualifier.
    pub fn resolve_named<T: Any + Send + Sync>(&self, qualifier: impl Into<Cow<'static, str>>) -> Result<Arc<T>> {
        self.resolve_key(&BindingKey::qualified::<T>(qualifier))
    }

    /// Resolves an explicit key.
    pub fn resolve_key<T: Any + Send + Sync>(&self, key: &BindingKey) -> Result<Arc<T>> {
        match self.bindings.get(key) {
            None => Err(ContainerError::UnboundKey { key: key.to_string() }),
            Some(Binding::Instance(shared)) => Self::downcast(key, shared.clone()),
            Some(Binding::Factory(factory)) => {
                let produced = factory(self).map_err(|source| ContainerError::Factory {
                    key: key.to_string(),
                    source,
                })?;
                Self::downcast(key, produced)
            }
        }
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.contains_key(&BindingKey::of::<T>())
    }

    pub fn contains_key(&self, key: &BindingKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// All currently bound keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &BindingKey> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn put_instance(&mut self, key: BindingKey, value: Shared, allow_override: bool) -> Result<()> {
        if !allow_override && self.bindings.contains_key(&key) {
            return Err(ContainerError::DuplicateBinding { key: key.to_string() });
        }
        tracing::debug!("binding singleton for {key}");
        self.bindings.insert(key, Binding::Instance(value));
        Ok(())
    }

    fn put_factory<T, F>(&mut self, key: BindingKey, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        tracing::debug!("binding factory for {key}");
        let erased = move |container: &Container| -> std::result::Result<Shared, BoxError> {
            let value = factory(container)?;
            Ok(Arc::new(value) as Shared)
        };
        self.bindings.insert(key, Binding::Factory(Arc::new(erased)));
    }

    fn downcast<T: Any + Send + Sync>(key: &BindingKey, shared: Shared) -> Result<Arc<T>> {
        shared.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
            key: key.to_string(),
            expected: type_name::<T>(),
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq)]
    struct Greeter {
        greeting: String,
    }

    #[test]
    fn registered_singleton_resolves_to_same_instance() {
        let mut container = Container::new();
        container.register(Greeter {
            greeting: "hello".to_string(),
        });

        let first = container.resolve::<Greeter>().expect("singleton resolves");
        let second = container.resolve::<Greeter>().expect("singleton resolves again");
        assert!(
            Arc::ptr_eq(&first, &second),
            "singleton identity must be preserved across resolutions"
        );
        assert_eq!(first.greeting, "hello");
    }

    #[test]
    fn re_registration_overwrites() {
        let mut container = Container::new();
        container.register(1u64);
        container.register(2u64);

        let value = container.resolve::<u64>().expect("overwritten binding resolves");
        assert_eq!(*value, 2);
    }

    #[test]
    fn factory_is_invoked_fresh_per_resolution() {
        let mut container = Container::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        container.register_factory(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)));

        let first = container.resolve::<usize>().expect("first product");
        let second = container.resolve::<usize>().expect("second product");
        assert_eq!(calls.load(Ordering::SeqCst), 2, "factory must run once per call");
        assert_ne!(*first, *second, "products are not cached");
    }

    #[test]
    fn factory_can_resolve_other_bindings() {
        let mut container = Container::new();
        container.register(7u32);
        container.register_factory(move |c| {
            let base = c.resolve::<u32>()?;
            Ok(u64::from(*base) * 2)
        });

        let value = container.resolve::<u64>().expect("dependent factory resolves");
        assert_eq!(*value, 14);
    }

    #[test]
    fn factory_failure_wraps_cause() {
        let mut container = Container::new();
        container.register_factory::<u8, _>(|_| Err("connection refused".into()));

        let err = container.resolve::<u8>().expect_err("factory fault surfaces");
        assert!(matches!(err, ContainerError::Factory { .. }));
    }

    #[test]
    fn duplicate_instance_registration_is_rejected() {
        let mut container = Container::new();
        container
            .register_instance("first".to_string(), false)
            .expect("first registration succeeds");
        let err = container
            .register_instance("second".to_string(), false)
            .expect_err("duplicate must be rejected");
        assert!(matches!(err, ContainerError::DuplicateBinding { .. }));

        // Rejection is a reported failure only, never a side effect.
        let kept = container.resolve::<String>().expect("original binding intact");
        assert_eq!(*kept, "first");
    }

    #[test]
    fn instance_registration_with_override_allowed_replaces() {
        let mut container = Container::new();
        container
            .register_instance("first".to_string(), true)
            .expect("first registration succeeds");
        container
            .register_instance("second".to_string(), true)
            .expect("override succeeds");

        let value = container.resolve::<String>().expect("binding resolves");
        assert_eq!(*value, "second");
    }

    #[test]
    fn unbound_key_is_an_error() {
        let container = Container::new();
        let err = container.resolve::<Greeter>().expect_err("nothing bound");
        assert!(matches!(err, ContainerError::UnboundKey { .. }));
    }

    #[test]
    fn qualified_keys_are_distinct_from_plain_keys() {
        let mut container = Container::new();
        container.register(10i32);
        container
            .register_instance_named("limit", 99i32, false)
            .expect("qualified registration succeeds");

        assert_eq!(*container.resolve::<i32>().unwrap(), 10);
        assert_eq!(*container.resolve_named::<i32>("limit").unwrap(), 99);
    }

    #[test]
    fn binding_key_display_includes_qualifier() {
        let plain = BindingKey::of::<Greeter>();
        let qualified = BindingKey::qualified::<Greeter>("audit");
        assert!(plain.to_string().ends_with("Greeter"));
        assert!(qualified.to_string().ends_with("Greeter#audit"));
    }
}
