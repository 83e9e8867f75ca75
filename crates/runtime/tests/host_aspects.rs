//! Host-declared aspects: link-time registrations picked up by the
//! plugin-directory entry point ahead of any archive-declared aspect.
//!
//! Kept in its own test binary so the inventory submission does not leak
//! into the zero-aspect expectations of the other suites.

use std::sync::Arc;

use socle_container::{BoxError, Container};
use socle_runtime::{
    Connection, ConnectionFactory, Settings, SystemAspect, host_aspect, setup_with_plugins,
};
use tempfile::TempDir;

#[derive(Default)]
struct TaggingAspect;

impl SystemAspect for TaggingAspect {
    fn configure(&mut self, container: &mut Container) -> Result<(), BoxError> {
        container.register_instance_named("activated-by", "host".to_string(), false)?;
        Ok(())
    }
}

host_aspect!(TaggingAspect);

fn noop_factory() -> ConnectionFactory {
    Arc::new(|_container| Ok(Connection::new(())))
}

#[test]
fn host_declared_aspects_activate_without_any_archives() {
    let plugins = TempDir::new().unwrap();

    let container = setup_with_plugins(noop_factory(), plugins.path(), Settings::new(), None)
        .expect("bootstrap succeeds");

    let tag = container
        .resolve_named::<String>("activated-by")
        .expect("host aspect ran");
    assert_eq!(*tag, "host");
}
