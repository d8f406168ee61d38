//! Selection of the most specific constructor or operation applicable to a list of argument
//! properties.
//!
//! A callable is applicable when it takes as many parameters as there are arguments and every
//! argument can be resolved as the corresponding parameter type. Among applicable callables, the
//! one with the least parameter list according to [compare_parameter_types] wins; the first one
//! encountered wins ties.

use crate::context::Context;
use crate::distance::is_assignable;
use crate::error::ContextError;
use crate::property::PropertyPtr;
use crate::type_registry::TypeLookup;
use crate::types::{Callable, TypeRef};
use std::cmp::Ordering;

/// A callable chosen for given arguments, with resolved parameter types.
#[derive(Clone, Debug)]
pub struct SelectedCallable<'a> {
    pub callable: &'a Callable,
    pub parameter_types: Vec<TypeRef>,
}

/// Orders parameter lists by specificity: shorter lists first; for equal lengths the first
/// deciding position wins, where a type generalized by the other one comes first, and a textual
/// type comes after a non-textual one.
pub fn compare_parameter_types(
    lookup: &dyn TypeLookup,
    first: &[TypeRef],
    second: &[TypeRef],
) -> Ordering {
    match first.len().cmp(&second.len()) {
        Ordering::Equal => {}
        ordering => return ordering,
    }

    for (first, second) in first.iter().zip(second) {
        if first == second {
            continue;
        }

        if is_assignable(lookup, first, second) {
            return Ordering::Greater;
        }

        if is_assignable(lookup, second, first) {
            return Ordering::Less;
        }

        match (first.is_text(), second.is_text()) {
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
    }

    Ordering::Equal
}

/// Checks if every argument can be resolved as the parameter type at the same position.
pub fn is_applicable(
    context: &Context,
    arguments: &[PropertyPtr],
    parameter_types: &[TypeRef],
) -> Result<bool, ContextError> {
    if arguments.len() != parameter_types.len() {
        return Ok(false);
    }

    for (argument, parameter_type) in arguments.iter().zip(parameter_types) {
        if !argument.is_resolvable_as(context, parameter_type)? {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Finds the most specific callable applicable to `arguments`. Parameter types which cannot be
/// found are reported as [ContextError::TypeNotFound] for bean `identifier`.
pub fn select_callable<'a, I>(
    context: &Context,
    identifier: &str,
    candidates: I,
    arguments: &[PropertyPtr],
) -> Result<Option<SelectedCallable<'a>>, ContextError>
where
    I: IntoIterator<Item = &'a Callable>,
{
    let mut selected: Option<SelectedCallable<'a>> = None;

    for callable in candidates {
        if callable.parameters.len() != arguments.len() {
            continue;
        }

        let parameter_types = callable
            .parameters
            .iter()
            .map(|parameter| {
                context
                    .lookup_type(parameter)
                    .ok_or_else(|| ContextError::TypeNotFound {
                        identifier: identifier.to_string(),
                        type_name: parameter.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !is_applicable(context, arguments, &parameter_types)? {
            continue;
        }

        let more_specific = match &selected {
            Some(current) => {
                compare_parameter_types(context, &parameter_types, &current.parameter_types)
                    == Ordering::Less
            }
            None => true,
        };

        if more_specific {
            selected = Some(SelectedCallable {
                callable,
                parameter_types,
            });
        }
    }

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use crate::selector::compare_parameter_types;
    use crate::type_registry::TypeRegistry;
    use crate::types::{TypeDescriptorBuilder, TypeRef};
    use std::cmp::Ordering;
    use std::sync::Arc;

    trait Number: Send + Sync {}

    struct Integer;

    impl Number for Integer {}

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with(TypeDescriptorBuilder::<dyn Number>::capability("Number").build())
            .with(
                TypeDescriptorBuilder::<Integer>::class("Integer")
                    .implements::<dyn Number, _>("Number", |integer| integer as Arc<dyn Number>)
                    .build(),
            )
    }

    fn types(registry: &TypeRegistry, names: &[&str]) -> Vec<TypeRef> {
        names
            .iter()
            .map(|name| registry.by_name(name).unwrap())
            .collect()
    }

    #[test]
    fn should_prefer_shorter_lists() {
        let registry = registry();
        assert_eq!(
            compare_parameter_types(
                &registry,
                &types(&registry, &["Number"]),
                &types(&registry, &["Integer", "Integer"])
            ),
            Ordering::Less
        );
    }

    #[test]
    fn should_prefer_narrower_types() {
        let registry = registry();
        let integer = types(&registry, &["Integer"]);
        let number = types(&registry, &["Number"]);

        assert_eq!(
            compare_parameter_types(&registry, &integer, &number),
            Ordering::Less
        );
        assert_eq!(
            compare_parameter_types(&registry, &number, &integer),
            Ordering::Greater
        );
    }

    #[test]
    fn should_put_text_last() {
        let registry = registry();
        let text = types(&registry, &["String"]);
        let integer = types(&registry, &["Integer"]);

        assert_eq!(
            compare_parameter_types(&registry, &text, &integer),
            Ordering::Greater
        );
        assert_eq!(
            compare_parameter_types(&registry, &integer, &text),
            Ordering::Less
        );
    }

    #[test]
    fn should_decide_on_first_differing_position() {
        let registry = registry();
        assert_eq!(
            compare_parameter_types(
                &registry,
                &types(&registry, &["i32", "Integer"]),
                &types(&registry, &["i32", "Number"])
            ),
            Ordering::Less
        );
        assert_eq!(
            compare_parameter_types(
                &registry,
                &types(&registry, &["i32", "u8"]),
                &types(&registry, &["u8", "i32"])
            ),
            Ordering::Equal
        );
    }
}
