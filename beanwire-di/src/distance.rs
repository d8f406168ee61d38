//! Generalization distance between types and conversions along the shortest generalization path.

use crate::instance_provider::InstanceAnyPtr;
use crate::type_registry::TypeLookup;
use crate::types::TypeDescriptor;

/// Distance reported for types which are not related.
pub const UNRELATED: usize = usize::MAX;

// generalization graphs are shallow, anything deeper is a registration loop
const MAX_DEPTH: usize = 64;

/// Returns the number of generalization steps needed to get from `subject` to `base`: 0 for the
/// same type, [UNRELATED] if `base` does not generalize `subject`.
pub fn type_distance(
    lookup: &dyn TypeLookup,
    subject: &TypeDescriptor,
    base: &TypeDescriptor,
) -> usize {
    distance_at(lookup, subject, base, 0)
}

fn distance_at(
    lookup: &dyn TypeLookup,
    subject: &TypeDescriptor,
    base: &TypeDescriptor,
    depth: usize,
) -> usize {
    if subject == base {
        return 0;
    }

    if depth >= MAX_DEPTH {
        return UNRELATED;
    }

    subject
        .generalizations()
        .filter_map(|generalization| lookup.lookup_type(&generalization.target))
        .map(|generalization| distance_at(lookup, &generalization, base, depth + 1))
        .min()
        .filter(|distance| *distance != UNRELATED)
        .map(|distance| distance + 1)
        .unwrap_or(UNRELATED)
}

/// Checks if instances of `subject` can be viewed as `base`.
#[inline]
pub fn is_assignable(
    lookup: &dyn TypeLookup,
    base: &TypeDescriptor,
    subject: &TypeDescriptor,
) -> bool {
    type_distance(lookup, subject, base) != UNRELATED
}

/// Converts an instance of `from` into an instance of `to`, following the shortest
/// generalization path. Returns `None` for unrelated types or instances of unexpected types.
pub fn convert_instance(
    lookup: &dyn TypeLookup,
    instance: InstanceAnyPtr,
    from: &TypeDescriptor,
    to: &TypeDescriptor,
) -> Option<InstanceAnyPtr> {
    if from == to {
        return Some(instance);
    }

    let (generalization, target, _) = from
        .generalizations()
        .filter_map(|generalization| {
            let target = lookup.lookup_type(&generalization.target)?;
            let distance = type_distance(lookup, &target, to);
            (distance != UNRELATED).then_some((generalization, target, distance))
        })
        .min_by_key(|(_, _, distance)| *distance)?;

    let converted = (generalization.convert)(instance)?;
    convert_instance(lookup, converted, &target, to)
}

#[cfg(test)]
mod tests {
    use crate::distance::{convert_instance, is_assignable, type_distance, UNRELATED};
    use crate::instance_provider::{downcast_capability, InstanceAnyPtr, InstancePtr};
    use crate::type_registry::TypeRegistry;
    use crate::types::{TypeDescriptorBuilder, TypeRef};
    use std::sync::Arc;

    trait Animal: Send + Sync {
        fn name(&self) -> String;
    }

    trait Pet: Animal {}

    #[derive(Clone)]
    struct Dog;

    impl Animal for Dog {
        fn name(&self) -> String {
            "dog".to_string()
        }
    }

    impl Pet for Dog {}

    struct Puppy {
        dog: Dog,
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
            .with(TypeDescriptorBuilder::<dyn Animal>::capability("Animal").build())
            .with(TypeDescriptorBuilder::<dyn Pet>::capability("Pet").build())
            .with(
                TypeDescriptorBuilder::<Dog>::class("Dog")
                    .implements::<dyn Pet, _>("Pet", |dog| dog as InstancePtr<dyn Pet>)
                    .implements::<dyn Animal, _>("Animal", |dog| dog as InstancePtr<dyn Animal>)
                    .build(),
            )
            .with(
                TypeDescriptorBuilder::<Puppy>::class("Puppy")
                    .extends::<Dog, _>("Dog", |puppy| Arc::new(puppy.dog.clone()))
                    .build(),
            )
    }

    fn get(registry: &TypeRegistry, name: &str) -> TypeRef {
        registry.by_name(name).unwrap()
    }

    #[test]
    fn should_compute_distances() {
        let registry = registry();
        let puppy = get(&registry, "Puppy");
        let dog = get(&registry, "Dog");
        let animal = get(&registry, "Animal");
        let text = get(&registry, "String");

        assert_eq!(type_distance(&registry, &puppy, &puppy), 0);
        assert_eq!(type_distance(&registry, &puppy, &dog), 1);
        assert_eq!(type_distance(&registry, &puppy, &animal), 2);
        assert_eq!(type_distance(&registry, &dog, &puppy), UNRELATED);
        assert_eq!(type_distance(&registry, &puppy, &text), UNRELATED);

        assert!(is_assignable(&registry, &animal, &dog));
        assert!(!is_assignable(&registry, &dog, &animal));
    }

    #[test]
    fn should_convert_along_shortest_path() {
        let registry = registry();
        let puppy = get(&registry, "Puppy");
        let animal = get(&registry, "Animal");

        let instance = Arc::new(Puppy { dog: Dog }) as InstanceAnyPtr;
        let converted = convert_instance(&registry, instance, &puppy, &animal).unwrap();
        let animal = downcast_capability::<dyn Animal>(converted).unwrap();
        assert_eq!(animal.name(), "dog");
    }

    #[test]
    fn should_not_convert_unrelated_types() {
        let registry = registry();
        let dog = get(&registry, "Dog");
        let text = get(&registry, "String");

        assert!(convert_instance(&registry, Arc::new(Dog), &dog, &text).is_none());
    }
}
