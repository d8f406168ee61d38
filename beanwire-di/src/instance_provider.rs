use crate::error::ContextError;
use std::any::Any;
use std::sync::Arc;

pub type InstancePtr<T> = Arc<T>;

/// Type-erased bean instance. Sized types are stored directly, capability views are stored as
/// `Arc<dyn Trait>` inside the erased pointer.
pub type InstanceAnyPtr = InstancePtr<dyn Any + Send + Sync + 'static>;

/// Downcasts an erased instance to a concrete type.
#[inline]
pub fn downcast_instance<T: Send + Sync + 'static>(
    instance: InstanceAnyPtr,
) -> Option<InstancePtr<T>> {
    instance.downcast::<T>().ok()
}

/// Extracts a capability view (`Arc<dyn Trait>`) from an erased instance.
#[inline]
pub fn downcast_capability<I: ?Sized + Send + Sync + 'static>(
    instance: InstanceAnyPtr,
) -> Option<InstancePtr<I>> {
    instance
        .downcast::<InstancePtr<I>>()
        .ok()
        .map(|view| InstancePtr::clone(&*view))
}

/// Wraps a capability view into an erased instance, so it can be later extracted with
/// [downcast_capability].
#[inline]
pub fn capability_instance<I: ?Sized + Send + Sync + 'static>(
    view: InstancePtr<I>,
) -> InstanceAnyPtr {
    Arc::new(view)
}

/// Generic provider for bean instances.
pub trait BeanProvider {
    /// Returns the bean closest to the given type, viewed as that type.
    fn get_bean_by_type(&self, type_name: &str) -> Result<Option<InstanceAnyPtr>, ContextError>;

    /// Returns the bean with given identifier, optionally viewed as given type. A bean which
    /// cannot be viewed as the requested type is reported as `None`.
    fn get_bean(
        &self,
        identifier: &str,
        type_name: Option<&str>,
    ) -> Result<Option<InstanceAnyPtr>, ContextError>;
}

/// Helper trait for [BeanProvider] providing strongly-typed access.
pub trait TypedBeanProvider {
    /// Returns the bean with given identifier downcast to `T`.
    fn bean<T: Send + Sync + 'static>(
        &self,
        identifier: &str,
    ) -> Result<Option<InstancePtr<T>>, ContextError>;

    /// Typesafe version of [BeanProvider::get_bean_by_type].
    fn bean_by_type<T: Send + Sync + 'static>(
        &self,
        type_name: &str,
    ) -> Result<Option<InstancePtr<T>>, ContextError>;

    /// Returns the bean with given identifier as a capability view registered under `type_name`.
    fn capability<I: ?Sized + Send + Sync + 'static>(
        &self,
        identifier: &str,
        type_name: &str,
    ) -> Result<Option<InstancePtr<I>>, ContextError>;
}

impl<P: BeanProvider + ?Sized> TypedBeanProvider for P {
    fn bean<T: Send + Sync + 'static>(
        &self,
        identifier: &str,
    ) -> Result<Option<InstancePtr<T>>, ContextError> {
        self.get_bean(identifier, None)
            .map(|instance| instance.and_then(downcast_instance))
    }

    fn bean_by_type<T: Send + Sync + 'static>(
        &self,
        type_name: &str,
    ) -> Result<Option<InstancePtr<T>>, ContextError> {
        self.get_bean_by_type(type_name)
            .map(|instance| instance.and_then(downcast_instance))
    }

    fn capability<I: ?Sized + Send + Sync + 'static>(
        &self,
        identifier: &str,
        type_name: &str,
    ) -> Result<Option<InstancePtr<I>>, ContextError> {
        self.get_bean(identifier, Some(type_name))
            .map(|instance| instance.and_then(downcast_capability))
    }
}
