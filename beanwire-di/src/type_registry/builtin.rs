//! Built-in type descriptors, present in every registry.

use crate::activation::{ActiveBean, Runnable};
use crate::holder::Properties;
use crate::instance_provider::InstanceAnyPtr;
use crate::types::{Primitive, TypeDescriptor, TypeDescriptorBuilder, TypeKind, UNIT};
use std::any::TypeId;

/// Textual type.
pub const STRING: &str = "String";

/// Type tokens - instances are other type descriptors.
pub const TYPE: &str = "Type";

/// Key/value maps produced by properties references.
pub const PROPERTIES: &str = "Properties";

/// Generic ordered sequence of erased instances (`Vec<InstanceAnyPtr>`).
pub const SEQUENCE: &str = "Vec";

/// Capability run by active beans without an explicit activation operation.
pub const RUNNABLE: &str = "Runnable";

/// Capability of active beans which can be asked to stop.
pub const ACTIVE_BEAN: &str = "ActiveBean";

pub(crate) fn descriptors() -> Vec<TypeDescriptor> {
    let mut descriptors = vec![
        core(STRING, TypeId::of::<String>(), TypeKind::Text),
        core(TYPE, TypeId::of::<TypeDescriptor>(), TypeKind::TypeToken),
        core(PROPERTIES, TypeId::of::<Properties>(), TypeKind::Properties),
        core(
            SEQUENCE,
            TypeId::of::<Vec<InstanceAnyPtr>>(),
            TypeKind::Sequence,
        ),
        core(UNIT, TypeId::of::<()>(), TypeKind::Class),
        TypeDescriptorBuilder::<dyn Runnable>::capability(RUNNABLE)
            .core()
            .build(),
        TypeDescriptorBuilder::<dyn ActiveBean>::capability(ACTIVE_BEAN)
            .core()
            .build(),
        array::<String>(STRING),
    ];

    descriptors.extend(Primitive::ALL.into_iter().map(|primitive| {
        core(
            primitive.name(),
            primitive.type_id(),
            TypeKind::Primitive(primitive),
        )
    }));
    descriptors.extend(Primitive::ALL.into_iter().map(primitive_array));

    descriptors
}

fn core(name: &str, type_id: TypeId, kind: TypeKind) -> TypeDescriptor {
    let mut descriptor = TypeDescriptor::new(name, Some(type_id), kind);
    descriptor.mark_core();
    descriptor
}

fn primitive_array(primitive: Primitive) -> TypeDescriptor {
    let name = primitive.name();
    match primitive {
        Primitive::Bool => array::<bool>(name),
        Primitive::Char => array::<char>(name),
        Primitive::I8 => array::<i8>(name),
        Primitive::I16 => array::<i16>(name),
        Primitive::I32 => array::<i32>(name),
        Primitive::I64 => array::<i64>(name),
        Primitive::I128 => array::<i128>(name),
        Primitive::Isize => array::<isize>(name),
        Primitive::U8 => array::<u8>(name),
        Primitive::U16 => array::<u16>(name),
        Primitive::U32 => array::<u32>(name),
        Primitive::U64 => array::<u64>(name),
        Primitive::U128 => array::<u128>(name),
        Primitive::Usize => array::<usize>(name),
        Primitive::F32 => array::<f32>(name),
        Primitive::F64 => array::<f64>(name),
    }
}

fn array<E: Clone + Send + Sync + 'static>(element: &str) -> TypeDescriptor {
    TypeDescriptorBuilder::<Vec<E>>::array(element)
        .core()
        .build()
}
