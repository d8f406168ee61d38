//! Registries of [TypeDescriptor]s. The ambient registry, created with
//! [TypeRegistry::from_static], contains built-in types and every type registered with
//! [register_type](crate::register_type) without an artifact tag. Artifact registries
//! ([TypeRegistry::for_artifact]) contain built-ins and types tagged with the given artifact
//! locator, isolated from the ambient ones.

pub mod builtin;

use crate::types::{TypeDescriptor, TypeRef};
use fxhash::FxHashMap;
use itertools::Itertools;
use std::any::TypeId;
use std::sync::Arc;
use tracing::debug;

/// Something which can resolve type names into descriptors.
pub trait TypeLookup {
    fn lookup_type(&self, name: &str) -> Option<TypeRef>;
}

impl<L: TypeLookup + ?Sized> TypeLookup for &L {
    #[inline]
    fn lookup_type(&self, name: &str) -> Option<TypeRef> {
        (**self).lookup_type(name)
    }
}

/// Collection of type descriptors addressable by name and by Rust [TypeId].
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    by_name: FxHashMap<String, TypeRef>,
    by_type_id: FxHashMap<TypeId, TypeRef>,
}

impl TypeRegistry {
    /// Creates a registry with built-in types only.
    pub fn new() -> Self {
        let mut registry = Self::default();
        for descriptor in builtin::descriptors() {
            registry.register(descriptor);
        }

        registry
    }

    /// Creates a registry with built-in types and statically registered types without an
    /// artifact tag.
    pub fn from_static() -> Self {
        Self::with_registrations(None)
    }

    /// Creates a registry with built-in types and statically registered types tagged with given
    /// artifact locator.
    pub fn for_artifact(locator: &str) -> Self {
        Self::with_registrations(Some(locator))
    }

    fn with_registrations(artifact: Option<&str>) -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<internal::TypeRegistration>
            .into_iter()
            .filter(|registration| registration.artifact == artifact)
        {
            registry.register((registration.register)());
        }

        debug!(
            artifact = artifact.unwrap_or("<ambient>"),
            types = registry.len(),
            "Collected static type registrations."
        );

        registry
    }

    /// Registers a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> TypeRef {
        let descriptor = Arc::new(descriptor);
        if let Some(type_id) = descriptor.type_id() {
            self.by_type_id.insert(type_id, descriptor.clone());
        }

        if let Some(previous) = self
            .by_name
            .insert(descriptor.name().to_string(), descriptor.clone())
        {
            debug!(name = previous.name(), "Replaced type registration.");
        }

        descriptor
    }

    /// Builder-style version of [TypeRegistry::register].
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    #[inline]
    pub fn by_name(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).cloned()
    }

    #[inline]
    pub fn by_type_id(&self, type_id: TypeId) -> Option<TypeRef> {
        self.by_type_id.get(&type_id).cloned()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Registered type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.by_name.keys().map(String::as_str).sorted().collect()
    }
}

impl TypeLookup for TypeRegistry {
    #[inline]
    fn lookup_type(&self, name: &str) -> Option<TypeRef> {
        self.by_name(name)
    }
}

/// Registers a type descriptor factory (`fn() -> TypeDescriptor`) statically, optionally tagged
/// with an artifact locator.
///
/// ```
/// use beanwire_di::register_type;
/// use beanwire_di::types::{TypeDescriptor, TypeDescriptorBuilder};
///
/// struct Clock;
///
/// fn clock() -> TypeDescriptor {
///     TypeDescriptorBuilder::<Clock>::class("Clock")
///         .constructor(&[], |_| Ok(Clock))
///         .build()
/// }
///
/// register_type!(clock);
/// register_type!(artifact = "plugins/clock", clock);
/// ```
#[macro_export]
macro_rules! register_type {
    (artifact = $artifact:literal, $register:path) => {
        $crate::type_registry::internal::submit! {
            $crate::type_registry::internal::TypeRegistration {
                artifact: Some($artifact),
                register: $register,
            }
        }
    };
    ($register:path) => {
        $crate::type_registry::internal::submit! {
            $crate::type_registry::internal::TypeRegistration {
                artifact: None,
                register: $register,
            }
        }
    };
}

#[doc(hidden)]
pub mod internal {
    use crate::types::TypeDescriptor;
    use inventory::collect;

    pub use inventory::submit;

    pub struct TypeRegistration {
        pub artifact: Option<&'static str>,
        pub register: fn() -> TypeDescriptor,
    }

    collect!(TypeRegistration);
}

#[cfg(test)]
mod tests {
    use crate::type_registry::builtin::{PROPERTIES, RUNNABLE, SEQUENCE, STRING, TYPE};
    use crate::type_registry::{TypeLookup, TypeRegistry};
    use crate::types::{TypeDescriptor, TypeDescriptorBuilder, TypeKind};
    use std::any::TypeId;

    struct Local;

    struct Tagged;

    fn local() -> TypeDescriptor {
        TypeDescriptorBuilder::<Local>::class("Local").build()
    }

    fn tagged() -> TypeDescriptor {
        TypeDescriptorBuilder::<Tagged>::class("Tagged").build()
    }

    crate::register_type!(local);
    crate::register_type!(artifact = "registry-test", tagged);

    #[test]
    fn should_contain_builtins() {
        let registry = TypeRegistry::new();
        for name in [STRING, TYPE, PROPERTIES, SEQUENCE, RUNNABLE, "i32", "[String]"] {
            assert!(registry.lookup_type(name).is_some(), "missing {name}");
        }

        assert!(matches!(
            registry.by_type_id(TypeId::of::<String>()).unwrap().kind(),
            TypeKind::Text
        ));
    }

    #[test]
    fn should_replace_registrations() {
        let registry = TypeRegistry::new()
            .with(TypeDescriptorBuilder::<Local>::class("Local").build())
            .with(TypeDescriptorBuilder::<Local>::class("Local").core().build());

        assert!(registry.by_name("Local").unwrap().is_core());
        assert!(registry.by_type_id(TypeId::of::<Local>()).unwrap().is_core());
    }

    #[test]
    fn should_separate_artifact_registrations() {
        let ambient = TypeRegistry::from_static();
        assert!(ambient.by_name("Local").is_some());
        assert!(ambient.by_name("Tagged").is_none());

        let artifact = TypeRegistry::for_artifact("registry-test");
        assert!(artifact.by_name("Tagged").is_some());
        assert!(artifact.by_name("Local").is_none());
        assert!(artifact.by_name(STRING).is_some());
    }
}
