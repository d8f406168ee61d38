//! Instance caching policies. Each bean factory creates its own [Scope] from the bean's
//! [ScopeKind] and routes every instance request through it. [SingletonScope] runs the creation
//! closure under its lock, so concurrent first requests yield one shared instance and a failed
//! creation leaves nothing behind. [PrototypeScope] never caches.
//!
//! [Scope::stored_instance] exposes the cached instance without creating one.

use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

pub type ScopePtr = Box<dyn Scope + Send + Sync>;

/// Creates a new instance when the scope needs one.
pub type InstanceCreator<'a> = &'a dyn Fn() -> Result<InstanceAnyPtr, ContextError>;

/// Name of the [SingletonScope].
pub const SINGLETON: &str = "SINGLETON";

/// Name of the [PrototypeScope].
pub const PROTOTYPE: &str = "PROTOTYPE";

/// A scope containing bean instances. See module documentation for information on scopes.
pub trait Scope: Debug {
    /// Returns an instance, using `create` if the scope has none to reuse.
    fn instance(&self, create: InstanceCreator) -> Result<InstanceAnyPtr, ContextError>;

    /// Returns the stored instance, if any.
    fn stored_instance(&self) -> Option<InstanceAnyPtr>;
}

/// Scope holding a single, lazily created instance. Concurrent first requests result in a single
/// creation.
#[derive(Debug, Default)]
pub struct SingletonScope {
    instance: Mutex<Option<InstanceAnyPtr>>,
}

impl Scope for SingletonScope {
    fn instance(&self, create: InstanceCreator) -> Result<InstanceAnyPtr, ContextError> {
        let mut instance = self.instance.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(instance) = instance.as_ref() {
            return Ok(instance.clone());
        }

        let created = create()?;
        *instance = Some(created.clone());

        Ok(created)
    }

    fn stored_instance(&self) -> Option<InstanceAnyPtr> {
        self.instance
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A scope which creates a new instance on each request.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PrototypeScope;

impl Scope for PrototypeScope {
    #[inline]
    fn instance(&self, create: InstanceCreator) -> Result<InstanceAnyPtr, ContextError> {
        create()
    }

    #[inline]
    fn stored_instance(&self) -> Option<InstanceAnyPtr> {
        None
    }
}

/// Scope declared by a bean.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ScopeKind {
    Singleton,
    #[default]
    Prototype,
}

impl ScopeKind {
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            ScopeKind::Singleton => SINGLETON,
            ScopeKind::Prototype => PROTOTYPE,
        }
    }

    pub fn create_scope(self) -> ScopePtr {
        match self {
            ScopeKind::Singleton => Box::<SingletonScope>::default(),
            ScopeKind::Prototype => Box::<PrototypeScope>::default(),
        }
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[error("Unknown scope: {0}")]
pub struct UnknownScope(pub String);

impl FromStr for ScopeKind {
    type Err = UnknownScope;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.eq_ignore_ascii_case(SINGLETON) {
            Ok(ScopeKind::Singleton)
        } else if name.eq_ignore_ascii_case(PROTOTYPE) {
            Ok(ScopeKind::Prototype)
        } else {
            Err(UnknownScope(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ContextError;
    use crate::instance_provider::{InstanceAnyPtr, InstancePtr};
    use crate::scope::{ScopeKind, PROTOTYPE};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn counting_creator(
        counter: &AtomicUsize,
    ) -> impl Fn() -> Result<InstanceAnyPtr, ContextError> + '_ {
        move || {
            let count = counter.fetch_add(1, Ordering::SeqCst);
            Ok(InstancePtr::new(count) as InstanceAnyPtr)
        }
    }

    #[test]
    fn should_support_singletons() {
        let counter = AtomicUsize::new(0);
        let scope = ScopeKind::Singleton.create_scope();
        let create = counting_creator(&counter);

        assert!(scope.stored_instance().is_none());

        let first = scope.instance(&create).unwrap();
        let second = scope.instance(&create).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(scope.stored_instance().is_some());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn should_support_prototypes() {
        let counter = AtomicUsize::new(0);
        let scope = ScopeKind::Prototype.create_scope();
        let create = counting_creator(&counter);

        let first = scope.instance(&create).unwrap();
        let second = scope.instance(&create).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(scope.stored_instance().is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn should_not_store_failed_singletons() {
        let scope = ScopeKind::Singleton.create_scope();
        let failing = || -> Result<InstanceAnyPtr, ContextError> {
            Err(ContextError::UnknownBeanReference {
                identifier: "missing".to_string(),
            })
        };

        assert!(scope.instance(&failing).is_err());
        assert!(scope.stored_instance().is_none());
    }

    #[test]
    fn should_create_singleton_once_under_contention() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scope = Arc::new(ScopeKind::Singleton.create_scope());
        let barrier = Arc::new(Barrier::new(8));

        let handles = (0..8)
            .map(|_| {
                let counter = counter.clone();
                let scope = scope.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    scope.instance(&counting_creator(&counter)).unwrap()
                })
            })
            .collect::<Vec<_>>();

        let instances = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(instances
            .iter()
            .all(|instance| Arc::ptr_eq(instance, &instances[0])));
    }

    #[test]
    fn should_parse_scope_names() {
        assert_eq!("singleton".parse::<ScopeKind>().unwrap(), ScopeKind::Singleton);
        assert_eq!(PROTOTYPE.parse::<ScopeKind>().unwrap(), ScopeKind::Prototype);
        assert!("request".parse::<ScopeKind>().is_err());
        assert_eq!(ScopeKind::default(), ScopeKind::Prototype);
    }
}
