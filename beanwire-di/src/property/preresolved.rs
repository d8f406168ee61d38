use crate::context::Context;
use crate::distance::is_assignable;
use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use crate::property::{invalid_morph_target, view_as, Property, ReferencableProperty};
use crate::types::TypeRef;

/// A bean created outside of the container and registered with its known type.
#[derive(Debug)]
pub struct PreresolvedBean {
    identifier: String,
    instance: InstanceAnyPtr,
    value_type: TypeRef,
}

impl PreresolvedBean {
    pub fn new(
        identifier: impl Into<String>,
        instance: InstanceAnyPtr,
        value_type: TypeRef,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            instance,
            value_type,
        }
    }
}

impl Property for PreresolvedBean {
    fn value(&self, _context: &Context) -> Result<InstanceAnyPtr, ContextError> {
        Ok(self.instance.clone())
    }

    fn value_type(&self, _context: &Context) -> Result<Option<TypeRef>, ContextError> {
        Ok(Some(self.value_type.clone()))
    }

    fn is_resolvable_as(&self, context: &Context, target: &TypeRef) -> Result<bool, ContextError> {
        Ok(is_assignable(context, target, &self.value_type))
    }

    fn value_as(
        &self,
        context: &Context,
        target: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        if !self.is_resolvable_as(context, target)? {
            return Err(invalid_morph_target(
                &self.identifier,
                self.value_type.name(),
                target,
            ));
        }

        view_as(
            context,
            &self.identifier,
            self.instance.clone(),
            &self.value_type,
            target,
        )
    }
}

impl ReferencableProperty for PreresolvedBean {
    #[inline]
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn initialize(&self, _context: &Context) -> Result<(), ContextError> {
        Ok(())
    }
}
