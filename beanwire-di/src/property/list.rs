use crate::context::Context;
use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use crate::property::{invalid_morph_target, Property, PropertyPtr};
use crate::type_registry::builtin::SEQUENCE;
use crate::type_registry::TypeLookup;
use crate::types::{TypeKind, TypeRef};
use std::sync::Arc;

/// An ordered list of element properties. Unbound lists produce generic sequences of their
/// elements' values; [ListProperty::morph] binds a list to a shape (a sequence or a typed array)
/// and an element type.
#[derive(Debug)]
pub struct ListProperty {
    elements: Vec<PropertyPtr>,
    shape: Option<TypeRef>,
    element_type: Option<TypeRef>,
}

impl ListProperty {
    pub fn new(elements: Vec<PropertyPtr>) -> Self {
        Self {
            elements,
            shape: None,
            element_type: None,
        }
    }

    #[inline]
    pub fn elements(&self) -> &[PropertyPtr] {
        &self.elements
    }

    /// Creates a new list with the same elements, bound to given shape and element type.
    pub fn morph(
        &self,
        context: &Context,
        shape: TypeRef,
        element_type: TypeRef,
    ) -> Result<Self, ContextError> {
        if !self.is_resolvable_as_element_type(context, &element_type)? {
            return Err(ContextError::InvalidElementType {
                type_name: element_type.name().to_string(),
            });
        }

        Ok(Self {
            elements: self.elements.clone(),
            shape: Some(shape),
            element_type: Some(element_type),
        })
    }

    /// Checks if every element can be viewed as `element_type`.
    pub fn is_resolvable_as_element_type(
        &self,
        context: &Context,
        element_type: &TypeRef,
    ) -> Result<bool, ContextError> {
        for element in &self.elements {
            if !element.is_resolvable_as(context, element_type)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn element_values(
        &self,
        context: &Context,
        element_type: Option<&TypeRef>,
    ) -> Result<Vec<InstanceAnyPtr>, ContextError> {
        self.elements
            .iter()
            .map(|element| match element_type {
                Some(element_type) => element.value_as(context, element_type),
                None => element.value(context),
            })
            .collect()
    }

    fn build(&self, context: &Context, shape: &TypeRef) -> Result<InstanceAnyPtr, ContextError> {
        match shape.kind() {
            TypeKind::Array { element, collect } => {
                let element_type = context.require_type(element, shape.name())?;
                let values = self.element_values(context, Some(&element_type))?;
                collect(values).ok_or_else(|| ContextError::InvalidElementType {
                    type_name: element.clone(),
                })
            }
            _ => Ok(Arc::new(self.element_values(context, self.element_type.as_ref())?)
                as InstanceAnyPtr),
        }
    }

    fn shape_name(&self) -> &str {
        self.shape
            .as_ref()
            .map(|shape| shape.name())
            .unwrap_or(SEQUENCE)
    }
}

impl Property for ListProperty {
    fn value(&self, context: &Context) -> Result<InstanceAnyPtr, ContextError> {
        match &self.shape {
            Some(shape) => self.build(context, shape),
            None => Ok(Arc::new(self.element_values(context, self.element_type.as_ref())?)
                as InstanceAnyPtr),
        }
    }

    fn value_type(&self, context: &Context) -> Result<Option<TypeRef>, ContextError> {
        match &self.shape {
            Some(shape) => Ok(Some(shape.clone())),
            None => context.require_type(SEQUENCE, "<list>").map(Some),
        }
    }

    fn is_resolvable_as(&self, context: &Context, target: &TypeRef) -> Result<bool, ContextError> {
        match target.kind() {
            TypeKind::Sequence => Ok(true),
            TypeKind::Array { element, .. } => match context.lookup_type(element) {
                Some(element_type) => self.is_resolvable_as_element_type(context, &element_type),
                None => Ok(false),
            },
            _ => Ok(false),
        }
    }

    fn value_as(
        &self,
        context: &Context,
        target: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        if self.is_resolvable_as(context, target)? {
            self.build(context, target)
        } else {
            Err(invalid_morph_target("<list>", self.shape_name(), target))
        }
    }
}
