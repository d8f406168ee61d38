//! Properties are producers of values used to wire beans together: constants, references to
//! other beans or properties holders, lists and the beans themselves. Every operation receives the
//! [Context] it resolves against.

mod constant;
mod list;
mod preresolved;
mod properties_reference;
mod reference;

pub use constant::ConstantProperty;
pub use list::ListProperty;
pub use preresolved::PreresolvedBean;
pub use properties_reference::PropertiesReference;
pub use reference::BeanReference;

use crate::context::Context;
use crate::distance::convert_instance;
use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use crate::types::TypeRef;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

/// Polymorphic value producer.
pub trait Property: Debug + Send + Sync {
    /// Produces the value in its current type.
    fn value(&self, context: &Context) -> Result<InstanceAnyPtr, ContextError>;

    /// Current type of the value, if known. References to missing beans have no type.
    fn value_type(&self, context: &Context) -> Result<Option<TypeRef>, ContextError>;

    /// Checks if the value can be viewed as `target`.
    fn is_resolvable_as(&self, context: &Context, target: &TypeRef) -> Result<bool, ContextError>;

    /// Produces the value viewed as `target`. Fails with [ContextError::InvalidMorphTarget] if
    /// [Property::is_resolvable_as] is false.
    fn value_as(&self, context: &Context, target: &TypeRef)
        -> Result<InstanceAnyPtr, ContextError>;
}

pub type PropertyPtr = Arc<dyn Property>;

/// A [Property] registered in a [Context] under a unique identifier - a bean.
pub trait ReferencableProperty: Property {
    fn identifier(&self) -> &str;

    /// Prepares the bean after the context is assembled, e.g. eagerly creates it.
    fn initialize(&self, context: &Context) -> Result<(), ContextError>;
}

pub type ReferencablePropertyPtr = Arc<dyn ReferencableProperty>;

impl PartialEq for dyn ReferencableProperty {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier()
    }
}

impl Eq for dyn ReferencableProperty {}

impl PartialOrd for dyn ReferencableProperty {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for dyn ReferencableProperty {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identifier().cmp(other.identifier())
    }
}

/// Views an instance of a resolved bean type as another type.
pub(crate) fn view_as(
    context: &Context,
    property: &str,
    instance: InstanceAnyPtr,
    from: &TypeRef,
    to: &TypeRef,
) -> Result<InstanceAnyPtr, ContextError> {
    convert_instance(context, instance, from, to).ok_or_else(|| ContextError::InvalidMorphTarget {
        property: property.to_string(),
        from: from.name().to_string(),
        to: to.name().to_string(),
    })
}

pub(crate) fn invalid_morph_target(property: &str, from: &str, to: &TypeRef) -> ContextError {
    ContextError::InvalidMorphTarget {
        property: property.to_string(),
        from: from.to_string(),
        to: to.name().to_string(),
    }
}
