//! End-to-end behavior of the bootstrap entry points, driven through the
//! core variant and an empty plugin directory.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use socle_container::{BoxError, Container, ContainerError, DomainModel};
use socle_runtime::{
    BootstrapError, Connection, ConnectionFactory, Settings, SystemAspect, setup_with_aspects,
    setup_with_plugins,
};
use tempfile::TempDir;

struct ProbeConn {
    serial: usize,
}

fn counting_factory() -> (ConnectionFactory, Arc<AtomicUsize>) {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = opened.clone();
    let factory: ConnectionFactory = Arc::new(move |_container| {
        let serial = counter.fetch_add(1, Ordering::SeqCst);
        Ok(Connection::new(ProbeConn { serial }))
    });
    (factory, opened)
}

struct RegistersX;

impl SystemAspect for RegistersX {
    fn configure(&mut self, container: &mut Container) -> Result<(), BoxError> {
        container.register_instance_named("X", 41u32, false)?;
        Ok(())
    }
}

struct FailsToActivate;

impl SystemAspect for FailsToActivate {
    fn configure(&mut self, _container: &mut Container) -> Result<(), BoxError> {
        Err("refusing to configure".into())
    }
}

static SECOND_ASPECT_RAN: AtomicBool = AtomicBool::new(false);

struct RecordsActivation;

impl SystemAspect for RecordsActivation {
    fn configure(&mut self, _container: &mut Container) -> Result<(), BoxError> {
        SECOND_ASPECT_RAN.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn core_bootstrap_registers_the_standard_bindings() {
    let (factory, _) = counting_factory();
    let mut settings = Settings::new();
    settings.set("namespace", "app");

    let container =
        setup_with_aspects(factory, settings.clone(), Vec::new()).expect("bootstrap succeeds");

    let bound_settings = container.resolve::<Settings>().expect("settings are bound");
    assert_eq!(*bound_settings, settings);
    container
        .resolve::<DomainModel>()
        .expect("domain model is bound");
    container
        .resolve::<Connection>()
        .expect("connection capability is bound");
}

#[test]
fn connection_capability_yields_a_fresh_connection_per_resolution() {
    let (factory, opened) = counting_factory();
    let container =
        setup_with_aspects(factory, Settings::new(), Vec::new()).expect("bootstrap succeeds");

    let first = container.resolve::<Connection>().expect("first connection");
    let second = container.resolve::<Connection>().expect("second connection");

    assert_eq!(opened.load(Ordering::SeqCst), 2, "factory runs once per resolution");
    let first_serial = first.downcast_ref::<ProbeConn>().expect("probe handle").serial;
    let second_serial = second.downcast_ref::<ProbeConn>().expect("probe handle").serial;
    assert_ne!(first_serial, second_serial, "connections are not cached");
}

#[test]
fn aspects_can_register_bindings_the_caller_resolves() {
    let (factory, _) = counting_factory();
    let aspects: Vec<Box<dyn SystemAspect>> = vec![Box::new(RegistersX)];

    let container =
        setup_with_aspects(factory, Settings::new(), aspects).expect("bootstrap succeeds");

    let value = container
        .resolve_named::<u32>("X")
        .expect("aspect-registered binding resolves");
    assert_eq!(*value, 41);
}

#[test]
fn first_activation_failure_aborts_the_remaining_sequence() {
    let (factory, _) = counting_factory();
    let aspects: Vec<Box<dyn SystemAspect>> =
        vec![Box::new(FailsToActivate), Box::new(RecordsActivation)];

    let err = setup_with_aspects(factory, Settings::new(), aspects)
        .expect_err("failing aspect aborts bootstrap");

    match err {
        BootstrapError::AspectActivation { index, .. } => assert_eq!(index, 0),
        other => panic!("expected AspectActivation, got {other:?}"),
    }
    assert!(
        !SECOND_ASPECT_RAN.load(Ordering::SeqCst),
        "aspects after the failing one must never activate"
    );
}

#[test]
fn later_aspects_can_override_earlier_bindings() {
    struct BindsPort(u16);
    impl SystemAspect for BindsPort {
        fn configure(&mut self, container: &mut Container) -> Result<(), BoxError> {
            container.register(self.0);
            Ok(())
        }
    }

    let (factory, _) = counting_factory();
    let aspects: Vec<Box<dyn SystemAspect>> = vec![Box::new(BindsPort(80)), Box::new(BindsPort(8080))];

    let container =
        setup_with_aspects(factory, Settings::new(), aspects).expect("bootstrap succeeds");
    assert_eq!(*container.resolve::<u16>().unwrap(), 8080, "last registration wins");
}

#[test]
fn duplicate_forbidden_registration_inside_an_aspect_surfaces_as_activation_failure() {
    struct BindsTwice;
    impl SystemAspect for BindsTwice {
        fn configure(&mut self, container: &mut Container) -> Result<(), BoxError> {
            container.register_instance(1i64, false)?;
            container.register_instance(2i64, false)?;
            Ok(())
        }
    }

    let (factory, _) = counting_factory();
    let aspects: Vec<Box<dyn SystemAspect>> = vec![Box::new(BindsTwice)];

    let err = setup_with_aspects(factory, Settings::new(), aspects)
        .expect_err("duplicate binding aborts activation");
    let BootstrapError::AspectActivation { source, .. } = err else {
        panic!("expected AspectActivation");
    };
    let cause = source
        .downcast::<ContainerError>()
        .expect("cause is the container error");
    assert!(matches!(*cause, ContainerError::DuplicateBinding { .. }));
}

#[test]
fn empty_plugin_directory_matches_a_zero_aspect_bootstrap() {
    let plugins = TempDir::new().unwrap();

    let (factory, _) = counting_factory();
    let via_plugins = setup_with_plugins(factory, plugins.path(), Settings::new(), None)
        .expect("bootstrap over empty directory succeeds");

    let (factory, _) = counting_factory();
    let via_aspects =
        setup_with_aspects(factory, Settings::new(), Vec::new()).expect("zero-aspect bootstrap");

    let mut plugin_keys: Vec<String> = via_plugins.keys().map(ToString::to_string).collect();
    let mut aspect_keys: Vec<String> = via_aspects.keys().map(ToString::to_string).collect();
    plugin_keys.sort();
    aspect_keys.sort();
    assert_eq!(
        plugin_keys, aspect_keys,
        "an empty plugin directory must leave the container unchanged"
    );
}
