use crate::context::Context;
use crate::distance::is_assignable;
use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use crate::property::{invalid_morph_target, view_as, Property};
use crate::type_registry::builtin::PROPERTIES;
use crate::types::TypeRef;

/// A reference to the key/value map of a properties holder.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PropertiesReference {
    identifier: String,
}

impl PropertiesReference {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl Property for PropertiesReference {
    fn value(&self, context: &Context) -> Result<InstanceAnyPtr, ContextError> {
        let holder = context.properties_holder(&self.identifier).ok_or_else(|| {
            ContextError::UnknownPropertiesReference {
                identifier: self.identifier.clone(),
            }
        })?;

        Ok(holder.properties()? as InstanceAnyPtr)
    }

    fn value_type(&self, context: &Context) -> Result<Option<TypeRef>, ContextError> {
        context.require_type(PROPERTIES, &self.identifier).map(Some)
    }

    fn is_resolvable_as(&self, context: &Context, target: &TypeRef) -> Result<bool, ContextError> {
        let properties = context.require_type(PROPERTIES, &self.identifier)?;
        Ok(is_assignable(context, target, &properties))
    }

    fn value_as(
        &self,
        context: &Context,
        target: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        if self.is_resolvable_as(context, target)? {
            let properties = context.require_type(PROPERTIES, &self.identifier)?;
            view_as(
                context,
                &self.identifier,
                self.value(context)?,
                &properties,
                target,
            )
        } else {
            Err(invalid_morph_target(&self.identifier, PROPERTIES, target))
        }
    }
}
