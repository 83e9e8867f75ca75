//! The connection capability and the link-time driver table.
//!
//! The bootstrap core neither opens nor understands connections; it holds an
//! endpoint string and forwards it to whichever registered driver accepts
//! it. The capability is bound in the container as a factory, so every
//! resolution may yield a fresh connection.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use socle_container::{BoxError, Container};

use crate::settings::Settings;

/// A live connection produced by a driver. Opaque to the bootstrap core;
/// only the driver that produced it knows the concrete handle type.
pub struct Connection {
    raw: Box<dyn Any + Send + Sync>,
}

impl Connection {
    pub fn new<C: Any + Send + Sync>(raw: C) -> Self {
        Self { raw: Box::new(raw) }
    }

    /// Borrows the driver-specific handle, when the caller knows its type.
    pub fn downcast_ref<C: Any>(&self) -> Option<&C> {
        self.raw.downcast_ref()
    }

    pub fn into_raw(self) -> Box<dyn Any + Send + Sync> {
        self.raw
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Connection(..)")
    }
}

/// Produces a live [`Connection`] on demand.
pub type ConnectionFactory =
    Arc<dyn Fn(&Container) -> std::result::Result<Connection, BoxError> + Send + Sync>;

/// External collaborator supplying the actual connect call.
pub trait ConnectionDriver: Send + Sync {
    /// Whether this driver understands the endpoint format.
    fn accepts(&self, endpoint: &str) -> bool;

    /// Opens a fresh connection to `endpoint`, consulting `settings` for
    /// driver-specific options.
    fn connect(&self, endpoint: &str, settings: &Settings)
    -> std::result::Result<Connection, BoxError>;
}

/// Link-time driver registration; see [`driver!`].
pub struct DriverRegistration {
    name: &'static str,
    build: fn() -> Box<dyn ConnectionDriver>,
}

impl DriverRegistration {
    pub const fn new(name: &'static str, build: fn() -> Box<dyn ConnectionDriver>) -> Self {
        Self { name, build }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn build(&self) -> Box<dyn ConnectionDriver> {
        (self.build)()
    }
}

inventory::collect!(DriverRegistration);

/// Registers a connection driver with the endpoint dispatch table.
///
/// ```ignore
/// socle_runtime::driver!("memory", MemoryDriver::default());
/// ```
#[macro_export]
macro_rules! driver {
    ($name:expr, $driver:expr) => {
        $crate::inventory::submit! {
            $crate::connection::DriverRegistration::new($name, || {
                ::std::boxed::Box::new($driver)
                    as ::std::boxed::Box<dyn $crate::connection::ConnectionDriver>
            })
        }
    };
}

/// First registered driver accepting `endpoint`, if any.
pub fn driver_for(endpoint: &str) -> Option<Box<dyn ConnectionDriver>> {
    inventory::iter::<DriverRegistration>()
        .map(DriverRegistration::build)
        .find(|driver| driver.accepts(endpoint))
}

/// All registered drivers, for diagnostics.
pub fn registered_drivers() -> impl Iterator<Item = &'static DriverRegistration> {
    inventory::iter::<DriverRegistration>()
}
