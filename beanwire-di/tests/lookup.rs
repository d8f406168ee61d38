use beanwire_di::builder::ContextBuilder;
use beanwire_di::context::Context;
use beanwire_di::definition::{ArgumentSpec, BeanSpec};
use beanwire_di::error::ContextError;
use beanwire_di::instance_provider::{
    downcast_capability, downcast_instance, BeanProvider, InstancePtr, TypedBeanProvider,
};
use beanwire_di::property::{ConstantProperty, Property};
use beanwire_di::scope::ScopeKind;
use beanwire_di::type_registry::{TypeLookup, TypeRegistry};
use beanwire_di::types::{TypeDescriptorBuilder, TypeRef};
use std::sync::Arc;

trait Animal: Send + Sync {
    fn name(&self) -> String;
}

#[derive(Clone, Debug, PartialEq)]
struct Dog {
    name: String,
}

impl Animal for Dog {
    fn name(&self) -> String {
        self.name.clone()
    }
}

struct Puppy {
    dog: Dog,
}

struct Complex;

fn types() -> TypeRegistry {
    TypeRegistry::new()
        .with(TypeDescriptorBuilder::<dyn Animal>::capability("Animal").build())
        .with(
            TypeDescriptorBuilder::<Dog>::class("Dog")
                .constructor(&["String"], |arguments| {
                    Ok(Dog {
                        name: arguments.value(0)?,
                    })
                })
                .implements::<dyn Animal, _>("Animal", |dog| dog as InstancePtr<dyn Animal>)
                .build(),
        )
        .with(
            TypeDescriptorBuilder::<Puppy>::class("Puppy")
                .constructor(&["String"], |arguments| {
                    Ok(Puppy {
                        dog: Dog {
                            name: arguments.value(0)?,
                        },
                    })
                })
                .extends::<Dog, _>("Dog", |puppy| Arc::new(puppy.dog.clone()))
                .build(),
        )
        .with(TypeDescriptorBuilder::<Complex>::class("Complex").build())
}

fn dog(identifier: &str, type_name: &str, name: &str) -> BeanSpec {
    BeanSpec::new(identifier, type_name)
        .with_scope(ScopeKind::Singleton)
        .with_argument(ArgumentSpec::constant(name))
}

fn animal_name(context: &Context, type_name: &str) -> Option<String> {
    context
        .get_bean_by_type(type_name)
        .unwrap()
        .and_then(downcast_capability::<dyn Animal>)
        .map(|animal| animal.name())
}

#[test]
fn should_prefer_closest_bean_by_type() {
    let context = ContextBuilder::new("distance")
        .with_type_registry(types())
        .with_bean(dog("puppy", "Puppy", "Bit"))
        .with_bean(dog("dog", "Dog", "Rex"))
        .build()
        .unwrap();

    let exact = context.bean_by_type::<Dog>("Dog").unwrap().unwrap();
    assert_eq!(exact.name, "Rex");
    assert_eq!(animal_name(&context, "Animal"), Some("Rex".to_string()));

    let puppy = context.bean_by_type::<Puppy>("Puppy").unwrap().unwrap();
    assert_eq!(puppy.dog.name, "Bit");
}

#[test]
fn should_view_generalized_beans() {
    let context = ContextBuilder::new("generalized")
        .with_type_registry(types())
        .with_bean(dog("puppy", "Puppy", "Bit"))
        .build()
        .unwrap();

    let dog = context.bean_by_type::<Dog>("Dog").unwrap().unwrap();
    assert_eq!(dog.name, "Bit");
    assert_eq!(animal_name(&context, "Animal"), Some("Bit".to_string()));

    assert!(context.get_bean_by_type("Complex").unwrap().is_none());
    assert!(context.get_bean("puppy", Some("Complex")).unwrap().is_none());
    assert!(matches!(
        context.get_bean_by_type("Unknown"),
        Err(ContextError::TypeNotFound { .. })
    ));
}

#[test]
fn should_delegate_to_parent() {
    let parent = ContextBuilder::new("parent")
        .with_type_registry(types())
        .with_bean(dog("x", "Dog", "Parent"))
        .with_bean(dog("shadowed", "Dog", "Parent"))
        .build()
        .unwrap();

    let child = ContextBuilder::new("child")
        .with_parent(parent.clone())
        .with_bean(dog("shadowed", "Dog", "Child"))
        .build()
        .unwrap();

    let from_child = child.bean::<Dog>("x").unwrap().unwrap();
    let from_parent = parent.bean::<Dog>("x").unwrap().unwrap();
    assert!(Arc::ptr_eq(&from_child, &from_parent));

    assert_eq!(child.bean::<Dog>("shadowed").unwrap().unwrap().name, "Child");
    assert_eq!(parent.bean::<Dog>("shadowed").unwrap().unwrap().name, "Parent");
    assert!(child.bean::<Dog>("missing").unwrap().is_none());
}

#[test]
fn should_delegate_by_type_to_parent() {
    let parent = ContextBuilder::new("parent")
        .with_type_registry(types())
        .with_bean(dog("dog", "Dog", "Rex"))
        .build()
        .unwrap();

    let child = ContextBuilder::new("child")
        .with_parent(parent)
        .build()
        .unwrap();

    assert_eq!(animal_name(&child, "Animal"), Some("Rex".to_string()));
}

#[test]
fn should_coerce_constants_round_trip() {
    let context = ContextBuilder::new("coercion")
        .with_type_registry(types())
        .build()
        .unwrap();

    let get = |name: &str| -> TypeRef { context.lookup_type(name).unwrap() };
    let constant = ConstantProperty::new("42");

    let integer = constant.value_as(&context, &get("i32")).unwrap();
    assert_eq!(*downcast_instance::<i32>(integer).unwrap(), 42);

    let text = constant.value_as(&context, &get("String")).unwrap();
    assert_eq!(*downcast_instance::<String>(text).unwrap(), "42");

    assert!(!constant.is_resolvable_as(&context, &get("Complex")).unwrap());
    assert!(matches!(
        constant.value_as(&context, &get("Complex")),
        Err(ContextError::InvalidMorphTarget { .. })
    ));
}
