//! Creation of typed values from raw strings.
//!
//! Strategies are tried in order:
//! 1. identity for textual types,
//! 2. primitive parsing,
//! 3. type name resolution for type tokens,
//! 4. the static `parse` operation of the target type,
//! 5. a constructor taking a single textual argument.
//!
//! In probe mode, the last two strategies are only used for core types.

use crate::error::ContextError;
use crate::instance_provider::InstanceAnyPtr;
use crate::type_registry::TypeLookup;
use crate::types::{Arguments, TypeDescriptor, TypeKind};
use std::sync::Arc;
use tracing::trace;

/// Creates an instance of `target` from `raw`. With `core_only` set, user types are only
/// considered if they are marked as core.
pub fn create_from_string(
    lookup: &dyn TypeLookup,
    target: &TypeDescriptor,
    raw: &str,
    core_only: bool,
) -> Result<InstanceAnyPtr, ContextError> {
    let cannot_create = || ContextError::CannotCreateFromString {
        type_name: target.name().to_string(),
        value: raw.to_string(),
    };

    match target.kind() {
        TypeKind::Text => return Ok(Arc::new(raw.to_string())),
        TypeKind::Primitive(primitive) => {
            return primitive.parse(raw).map_err(|error| {
                trace!(%error, "Primitive parsing failed.");
                cannot_create()
            })
        }
        TypeKind::TypeToken => {
            return lookup
                .lookup_type(raw)
                .map(|descriptor| descriptor as InstanceAnyPtr)
                .ok_or_else(cannot_create)
        }
        _ => {}
    }

    if core_only && !target.is_core() {
        return Err(cannot_create());
    }

    if let Some(parse) = target.parser() {
        match parse(raw) {
            Ok(instance) => return Ok(instance),
            Err(error) => trace!(%error, type_name = target.name(), "Parse operation failed."),
        }
    }

    let constructor = target.constructors().iter().find(|constructor| {
        constructor.parameters.len() == 1
            && lookup
                .lookup_type(&constructor.parameters[0])
                .map(|parameter| parameter.is_text())
                .unwrap_or(false)
    });

    constructor
        .ok_or_else(cannot_create)?
        .invoke(
            None,
            &Arguments::new(vec![Arc::new(raw.to_string()) as InstanceAnyPtr]),
        )
        .map_err(|error| {
            trace!(%error, type_name = target.name(), "Textual constructor failed.");
            cannot_create()
        })
}

/// Checks if [create_from_string] would succeed in probe mode.
#[inline]
pub fn is_creatable_from_string(
    lookup: &dyn TypeLookup,
    target: &TypeDescriptor,
    raw: &str,
) -> bool {
    create_from_string(lookup, target, raw, true).is_ok()
}
