use crate::coercion::{create_from_string, is_creatable_from_string};
use crate::context::Context;
use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use crate::property::{invalid_morph_target, Property};
use crate::type_registry::builtin::STRING;
use crate::types::TypeRef;
use std::sync::{Mutex, PoisonError};

/// A property created from a raw string. The value is textual until the property is morphed into
/// another type. Conversion happens on first access and is cached.
#[derive(Debug)]
pub struct ConstantProperty {
    raw: String,
    value_type: Option<TypeRef>,
    value: Mutex<Option<InstanceAnyPtr>>,
}

impl ConstantProperty {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            value_type: None,
            value: Mutex::new(None),
        }
    }

    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Creates a new property with the same raw value, typed as `target`.
    pub fn morph(&self, context: &Context, target: TypeRef) -> Result<Self, ContextError> {
        if !self.is_resolvable_as(context, &target)? {
            return Err(invalid_morph_target(&self.raw, self.type_name(), &target));
        }

        Ok(Self {
            raw: self.raw.clone(),
            value_type: Some(target),
            value: Mutex::new(None),
        })
    }

    /// Unrestricted conversion of the raw value to `target`.
    pub fn convert(
        &self,
        context: &Context,
        target: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        create_from_string(context, target, &self.raw, false)
    }

    fn type_name(&self) -> &str {
        self.value_type
            .as_ref()
            .map(|value_type| value_type.name())
            .unwrap_or(STRING)
    }

    fn resolved_type(&self, context: &Context) -> Result<TypeRef, ContextError> {
        match &self.value_type {
            Some(value_type) => Ok(value_type.clone()),
            None => context.require_type(STRING, &self.raw),
        }
    }
}

impl Property for ConstantProperty {
    fn value(&self, context: &Context) -> Result<InstanceAnyPtr, ContextError> {
        let mut value = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = value.as_ref() {
            return Ok(value.clone());
        }

        let value_type = self.resolved_type(context)?;
        let created = create_from_string(context, &value_type, &self.raw, true)?;
        *value = Some(created.clone());

        Ok(created)
    }

    fn value_type(&self, context: &Context) -> Result<Option<TypeRef>, ContextError> {
        self.resolved_type(context).map(Some)
    }

    fn is_resolvable_as(&self, context: &Context, target: &TypeRef) -> Result<bool, ContextError> {
        Ok(is_creatable_from_string(context, target, &self.raw))
    }

    fn value_as(
        &self,
        context: &Context,
        target: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        if target.name() == self.type_name() {
            return self.value(context);
        }

        if self.is_resolvable_as(context, target)? {
            self.convert(context, target)
        } else {
            Err(invalid_morph_target(&self.raw, self.type_name(), target))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::ContextBuilder;
    use crate::context::Context;
    use crate::error::ContextError;
    use crate::instance_provider::downcast_instance;
    use crate::property::{ConstantProperty, Property};
    use crate::type_registry::{TypeLookup, TypeRegistry};
    use crate::types::{TypeDescriptorBuilder, TypeRef};
    use std::sync::Arc;

    struct Complex;

    fn context() -> Arc<Context> {
        ContextBuilder::new("test")
            .with_type_registry(
                TypeRegistry::new()
                    .with(TypeDescriptorBuilder::<Complex>::class("Complex").build()),
            )
            .assemble()
            .unwrap()
    }

    fn get(context: &Context, name: &str) -> TypeRef {
        context.lookup_type(name).unwrap()
    }

    #[test]
    fn should_coerce_constants() {
        let context = context();
        let property = ConstantProperty::new("42");

        let value = property.value_as(&context, &get(&context, "i32")).unwrap();
        assert_eq!(*downcast_instance::<i32>(value).unwrap(), 42);

        let value = property.value_as(&context, &get(&context, "String")).unwrap();
        assert_eq!(*downcast_instance::<String>(value).unwrap(), "42");

        let complex = get(&context, "Complex");
        assert!(!property.is_resolvable_as(&context, &complex).unwrap());
        assert!(matches!(
            property.value_as(&context, &complex),
            Err(ContextError::InvalidMorphTarget { .. })
        ));
    }

    #[test]
    fn should_cache_values() {
        let context = context();
        let property = ConstantProperty::new("text");

        let first = property.value(&context).unwrap();
        let second = property.value(&context).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn should_morph_independently() {
        let context = context();
        let property = ConstantProperty::new("7");
        let morphed = property.morph(&context, get(&context, "u8")).unwrap();

        assert_eq!(morphed.value_type(&context).unwrap().unwrap().name(), "u8");
        let value = morphed.value(&context).unwrap();
        assert_eq!(*downcast_instance::<u8>(value).unwrap(), 7);
        assert_eq!(
            property.value_type(&context).unwrap().unwrap().name(),
            "String"
        );

        assert!(property.morph(&context, get(&context, "bool")).is_err());
    }
}
