//! Socle Runtime - bootstrap orchestration for a pluggable application.
//!
//! This crate builds the process-wide service container, discovers and
//! activates system aspects found in an external plugin directory, and wires
//! up the namespaced domain model resolver. Three entry points, increasing
//! in configurability:
//!
//! - [`setup`] - endpoint string only; settings and plugins come from the
//!   working directory.
//! - [`setup_with_plugins`] - explicit connection factory, plugin directory,
//!   settings, and optional parent loading context.
//! - [`setup_with_aspects`] - no discovery; the caller supplies the aspect
//!   sequence directly.
//!
//! Bootstrap is synchronous, sequential, and one-shot: all work runs to
//! completion before the container is handed back, failures propagate to the
//! caller, and nothing is retried. A hung aspect blocks bootstrap
//! indefinitely - this is expected to be a short, operator-observed step.

pub mod aspect;
pub mod connection;
pub mod error;
pub mod loader;
pub mod settings;

pub use aspect::{AspectDeclaration, HostAspect, SystemAspect};
pub use connection::{Connection, ConnectionDriver, ConnectionFactory, DriverRegistration};
pub use error::{BootstrapError, Result};
pub use loader::{LoadContext, scan_archives};
pub use settings::{SETTINGS_FILE, Settings};

// Used by the `host_aspect!` and `driver!` macro expansions.
#[doc(hidden)]
pub use inventory;

use std::path::Path;
use std::sync::Arc;

use socle_container::{Container, DomainModel};

/// Minimal bootstrap: a connection endpoint string is all that is needed.
///
/// Loads the optional [`SETTINGS_FILE`] from the working directory (absent
/// file means empty configuration), derives a connection factory from the
/// first registered driver accepting the endpoint, and treats the working
/// directory as the plugin root.
pub fn setup(endpoint: &str) -> Result<Container> {
    let settings = Settings::load(Path::new(SETTINGS_FILE))?;
    let factory = connection_factory(endpoint, &settings)?;
    setup_with_plugins(factory, Path::new("."), settings, None)
}

/// Builds the per-resolution connection factory for `endpoint`.
///
/// The factory captures the endpoint and a snapshot of the settings; each
/// invocation asks the driver for a fresh connection.
pub fn connection_factory(endpoint: &str, settings: &Settings) -> Result<ConnectionFactory> {
    let driver = connection::driver_for(endpoint).ok_or_else(|| BootstrapError::NoDriver {
        endpoint: endpoint.to_string(),
    })?;
    let endpoint = endpoint.to_string();
    let settings = settings.clone();
    Ok(Arc::new(move |_container: &Container| {
        driver.connect(&endpoint, &settings)
    }))
}

/// Plugin-directory bootstrap: discovery over `plugins_dir`, then delegation
/// to [`setup_with_aspects`] with the enumerated aspects.
///
/// Host-declared aspects activate before archive-declared ones. The loading
/// context stays open for the whole activation sequence - aspects resolve
/// dependent symbols through it while configuring - and is closed exactly
/// once, after the last activation returns or fails.
pub fn setup_with_plugins(
    factory: ConnectionFactory,
    plugins_dir: &Path,
    settings: Settings,
    parent: Option<Arc<LoadContext>>,
) -> Result<Container> {
    let locations = scan_archives(plugins_dir)?;
    tracing::info!(
        dir = %plugins_dir.display(),
        candidates = locations.len(),
        "discovered plugin archives"
    );

    let context = match parent {
        Some(parent) => LoadContext::chained(locations, parent),
        None => LoadContext::isolated(locations),
    }?;

    let result = context.declared_aspects().and_then(|declared| {
        let mut aspects = aspect::host_aspects();
        aspects.extend(declared);
        setup_with_aspects(factory, settings, aspects)
    });
    context.close();
    result
}

/// Core bootstrap: an already-produced aspect sequence, no discovery.
///
/// Builds the container, registers the settings singleton, binds the
/// connection capability to `factory`, registers the [`DomainModel`] built
/// from the `namespace` settings key (default empty), then activates each
/// aspect in order. The first activation failure aborts the rest;
/// registrations already applied are not rolled back, and the partially
/// populated container is discarded with the error.
pub fn setup_with_aspects(
    factory: ConnectionFactory,
    settings: Settings,
    aspects: impl IntoIterator<Item = Box<dyn SystemAspect>>,
) -> Result<Container> {
    let mut container = Container::new();
    let namespace = settings.get("namespace").map(str::to_owned);

    container.register(settings);
    container.register_factory(move |resolver| factory(resolver));
    container.register_instance(DomainModel::new(namespace.as_deref()), false)?;

    for (index, mut aspect) in aspects.into_iter().enumerate() {
        tracing::debug!(index, "activating system aspect");
        aspect
            .configure(&mut container)
            .map_err(|source| BootstrapError::AspectActivation { index, source })?;
    }

    tracing::info!(bindings = container.len(), "bootstrap complete");
    Ok(container)
}
