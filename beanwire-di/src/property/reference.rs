use crate::context::Context;
use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use crate::property::{invalid_morph_target, Property};
use crate::types::TypeRef;

/// A reference to a bean registered in the current context or one of its ancestors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BeanReference {
    identifier: String,
}

impl BeanReference {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    fn unknown(&self) -> ContextError {
        ContextError::UnknownBeanReference {
            identifier: self.identifier.clone(),
        }
    }
}

impl Property for BeanReference {
    fn value(&self, context: &Context) -> Result<InstanceAnyPtr, ContextError> {
        context
            .get_bean_reference(&self.identifier)
            .ok_or_else(|| self.unknown())?
            .value()
    }

    fn value_type(&self, context: &Context) -> Result<Option<TypeRef>, ContextError> {
        match context.get_bean_reference(&self.identifier) {
            Some(bean) => bean.value_type(),
            None => Ok(None),
        }
    }

    fn is_resolvable_as(&self, context: &Context, target: &TypeRef) -> Result<bool, ContextError> {
        match context.get_bean_reference(&self.identifier) {
            Some(bean) => bean.is_resolvable_as(target),
            None => Ok(false),
        }
    }

    fn value_as(
        &self,
        context: &Context,
        target: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        let bean = context
            .get_bean_reference(&self.identifier)
            .ok_or_else(|| self.unknown())?;

        if bean.is_resolvable_as(target)? {
            bean.value_as(target)
        } else {
            let from = bean.value_type()?;
            Err(invalid_morph_target(
                &self.identifier,
                from.as_ref().map(|from| from.name()).unwrap_or("<unknown>"),
                target,
            ))
        }
    }
}
