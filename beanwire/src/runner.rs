//! Runners executing actual application logic.

use beanwire_di::register_type;
use beanwire_di::types::{TypeDescriptor, TypeDescriptorBuilder};
pub use beanwire_di::ErrorPtr;
#[cfg(test)]
use mockall::automock;

/// Name under which the [ApplicationRunner] capability is registered.
pub const APPLICATION_RUNNER: &str = "ApplicationRunner";

/// Runs application logic. Runners are run by the [Application](crate::application::Application),
/// which discovers them among beans resolvable as [APPLICATION_RUNNER]. Bean types declare the
/// capability in their descriptors:
///
/// ```text
/// .implements::<dyn ApplicationRunner, _>(APPLICATION_RUNNER, |runner| {
///     runner as InstancePtr<dyn ApplicationRunner>
/// })
/// ```
#[cfg_attr(test, automock)]
pub trait ApplicationRunner: Send + Sync {
    /// Runs any application code.
    fn run(&self) -> Result<(), ErrorPtr>;

    /// Returns the priority for this runner. Higher priorities get run first. Default 0.
    fn priority(&self) -> i8 {
        0
    }
}

/// Descriptor of the [ApplicationRunner] capability. Registered statically, so it's present in
/// every registry created with
/// [TypeRegistry::from_static](beanwire_di::type_registry::TypeRegistry::from_static); custom
/// registries need to register it explicitly.
pub fn runner_descriptor() -> TypeDescriptor {
    TypeDescriptorBuilder::<dyn ApplicationRunner>::capability(APPLICATION_RUNNER).build()
}

register_type!(runner_descriptor);
