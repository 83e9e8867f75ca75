//! Domain model lookup: maps short entity names to registered type handles
//! within a configured namespace.
//!
//! Entity types are declared once, at link time, through [`domain_type!`];
//! the resolver never reaches for reflection and never fails. An unknown or
//! malformed name is simply absent.

use std::any::{Any, TypeId};

/// Handle for one registered entity type: its fully-qualified name, its type
/// identity, and a constructor producing a default-initialized instance.
pub struct DomainType {
    name: &'static str,
    type_id: fn() -> TypeId,
    construct: fn() -> Box<dyn Any + Send + Sync>,
}

impl DomainType {
    pub const fn new(
        name: &'static str,
        type_id: fn() -> TypeId,
        construct: fn() -> Box<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            name,
            type_id,
            construct,
        }
    }

    /// Fully-qualified name, namespace prefix included.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Constructs a boxed default instance of the registered type.
    pub fn construct(&self) -> Box<dyn Any + Send + Sync> {
        (self.construct)()
    }
}

inventory::collect!(DomainType);

/// Registers an entity type under a fully-qualified name so that
/// [`DomainModel::find`] can hand out its [`DomainType`] handle.
///
/// The type must implement [`Default`].
///
/// ```ignore
/// #[derive(Default)]
/// struct Order;
///
/// socle_container::domain_type!(Order, "sales.Order");
/// ```
#[macro_export]
macro_rules! domain_type {
    ($ty:ty, $name:expr) => {
        $crate::inventory::submit! {
            $crate::domain::DomainType::new(
                $name,
                || ::std::any::TypeId::of::<$ty>(),
                || ::std::boxed::Box::new(<$ty as ::std::default::Default>::default()),
            )
        }
    };
}

/// Name-based entity resolver over a single configured namespace prefix.
///
/// Stateless apart from the prefix captured at construction; registered into
/// the container as a singleton during bootstrap.
#[derive(Debug, Clone)]
pub struct DomainModel {
    prefix: String,
}

impl DomainModel {
    /// Captures the namespace prefix. A missing or empty namespace means
    /// names resolve without qualification.
    pub fn new(namespace: Option<&str>) -> Self {
        let prefix = match namespace {
            Some(ns) if !ns.is_empty() => format!("{ns}."),
            _ => String::new(),
        };
        Self { prefix }
    }

    /// Looks up the type handle registered under prefix + `name`.
    ///
    /// Total and side-effect free: an unknown name yields `None`, never an
    /// error. This distinguishes "absent by design" from infrastructure
    /// failure.
    pub fn find(&self, name: &str) -> Option<&'static DomainType> {
        let full = format!("{}{}", self.prefix, name);
        inventory::iter::<DomainType>().find(|ty| ty.name == full)
    }
}
