//! The system aspect activation contract, for aspects compiled into the host
//! and aspects shipped as external plugin archives.

use socle_container::{BoxError, Container};

/// Runtime version the host was compiled against. Archives record it in
/// their declaration; discovery rejects a mismatch before any activation.
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Well-known symbol a plugin archive exports its declaration under.
pub const DECLARATION_SYMBOL: &[u8] = b"socle_aspect_declaration";

/// Externally supplied unit that, given the container, adds or overrides
/// bindings.
///
/// Activation runs sequentially during bootstrap; a returned error aborts
/// the remaining sequence without rolling back registrations already made.
pub trait SystemAspect: Send {
    fn configure(&mut self, container: &mut Container) -> Result<(), BoxError>;
}

/// Declaration exported by a plugin archive under [`DECLARATION_SYMBOL`].
/// Produced by [`declare_aspects!`]; not meant to be written by hand.
#[repr(C)]
pub struct AspectDeclaration {
    pub core_version: &'static str,
    pub aspects: fn() -> Vec<Box<dyn SystemAspect>>,
}

/// Declares the aspects a plugin archive ships, exporting them under the
/// well-known symbol the loader enumerates.
///
/// ```ignore
/// use socle_runtime::declare_aspects;
///
/// declare_aspects!(AuditAspect::default());
/// ```
#[macro_export]
macro_rules! declare_aspects {
    ($($aspect:expr),+ $(,)?) => {
        #[unsafe(no_mangle)]
        #[allow(non_upper_case_globals)]
        pub static socle_aspect_declaration: $crate::aspect::AspectDeclaration =
            $crate::aspect::AspectDeclaration {
                core_version: $crate::aspect::CORE_VERSION,
                aspects: || {
                    vec![$(
                        ::std::boxed::Box::new($aspect)
                            as ::std::boxed::Box<dyn $crate::aspect::SystemAspect>,
                    )+]
                },
            };
    };
}

/// Link-time registration of an aspect compiled into the host application.
/// Host aspects activate before any archive-declared aspect.
pub struct HostAspect {
    build: fn() -> Box<dyn SystemAspect>,
}

impl HostAspect {
    pub const fn new(build: fn() -> Box<dyn SystemAspect>) -> Self {
        Self { build }
    }

    pub fn build(&self) -> Box<dyn SystemAspect> {
        (self.build)()
    }
}

inventory::collect!(HostAspect);

/// Registers a host-compiled aspect with the bootstrap sequence.
///
/// The expression must be constructible without captured state.
///
/// ```ignore
/// socle_runtime::host_aspect!(MetricsAspect::default());
/// ```
#[macro_export]
macro_rules! host_aspect {
    ($aspect:expr) => {
        $crate::inventory::submit! {
            $crate::aspect::HostAspect::new(|| {
                ::std::boxed::Box::new($aspect)
                    as ::std::boxed::Box<dyn $crate::aspect::SystemAspect>
            })
        }
    };
}

/// Builds every host-declared aspect, one instance each.
pub fn host_aspects() -> Vec<Box<dyn SystemAspect>> {
    inventory::iter::<HostAspect>()
        .map(HostAspect::build)
        .collect()
}
