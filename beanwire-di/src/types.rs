//! Runtime type descriptors. Since there is no reflection available, every type which takes part
//! in bean wiring needs to be described by a [TypeDescriptor]: its name, generalizations (a
//! superclass-like ancestor and any number of capabilities, usually trait objects), the ways to
//! construct it and the operations which can be invoked on it.
//!
//! Descriptors are created with a [TypeDescriptorBuilder]:
//!
//! ```
//! use beanwire_di::instance_provider::InstancePtr;
//! use beanwire_di::types::TypeDescriptorBuilder;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!     name: String,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         format!("Hello, {}!", self.name)
//!     }
//! }
//!
//! let descriptor = TypeDescriptorBuilder::<EnglishGreeter>::class("EnglishGreeter")
//!     .implements::<dyn Greeter, _>("Greeter", |greeter| greeter as InstancePtr<dyn Greeter>)
//!     .constructor(&["String"], |arguments| {
//!         Ok(EnglishGreeter {
//!             name: arguments.value::<String>(0)?,
//!         })
//!     })
//!     .build();
//!
//! assert_eq!(descriptor.name(), "EnglishGreeter");
//! assert_eq!(descriptor.constructors().len(), 1);
//! ```

use crate::error::ErrorPtr;
use crate::instance_provider::{
    capability_instance, downcast_capability, downcast_instance, InstanceAnyPtr, InstancePtr,
};
use derivative::Derivative;
use std::any::{type_name, TypeId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub type TypeRef = Arc<TypeDescriptor>;

/// Converts an instance of one type into an instance of its generalization. Returns `None` if
/// the instance is not of the expected type.
pub type ConvertFn = Arc<dyn Fn(InstanceAnyPtr) -> Option<InstanceAnyPtr> + Send + Sync>;

/// Invokes a [Callable] with an optional receiver and materialized arguments.
pub type InvokeFn =
    Arc<dyn Fn(Option<&InstanceAnyPtr>, &Arguments) -> Result<InstanceAnyPtr, ErrorPtr> + Send + Sync>;

/// Static `parse` operation of a type.
pub type ParseFn = Arc<dyn Fn(&str) -> Result<InstanceAnyPtr, ErrorPtr> + Send + Sync>;

/// Collects element instances into an array instance.
pub type CollectFn = Arc<dyn Fn(Vec<InstanceAnyPtr>) -> Option<InstanceAnyPtr> + Send + Sync>;

type UnwrapFn<T> = fn(InstanceAnyPtr) -> Option<InstancePtr<T>>;

/// Errors raised when reading [Arguments] or invoking [Callable]s.
#[derive(Error, Debug, Clone)]
pub enum InvocationError {
    #[error("Missing argument at position {0}")]
    MissingArgument(usize),
    #[error("Argument at position {index} is not a {expected}")]
    ArgumentMismatch {
        index: usize,
        expected: &'static str,
    },
    #[error("Missing or incompatible receiver for operation on {0}")]
    MissingReceiver(&'static str),
    #[error("Cannot read a character from an empty string")]
    EmptyCharacter,
}

/// Primitive types understood by string coercion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Primitive {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
}

impl Primitive {
    pub const ALL: [Primitive; 16] = [
        Primitive::Bool,
        Primitive::Char,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::I128,
        Primitive::Isize,
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::U128,
        Primitive::Usize,
        Primitive::F32,
        Primitive::F64,
    ];

    /// Registered type name of this primitive.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::Isize => "isize",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
        }
    }

    /// Parses a raw string into an instance of this primitive.
    pub fn parse(self, raw: &str) -> Result<InstanceAnyPtr, ErrorPtr> {
        match self {
            Primitive::Bool => parse_as::<bool>(raw),
            Primitive::Char => raw
                .chars()
                .next()
                .map(|value| Arc::new(value) as InstanceAnyPtr)
                .ok_or_else(|| Arc::new(InvocationError::EmptyCharacter) as ErrorPtr),
            Primitive::I8 => parse_as::<i8>(raw),
            Primitive::I16 => parse_as::<i16>(raw),
            Primitive::I32 => parse_as::<i32>(raw),
            Primitive::I64 => parse_as::<i64>(raw),
            Primitive::I128 => parse_as::<i128>(raw),
            Primitive::Isize => parse_as::<isize>(raw),
            Primitive::U8 => parse_as::<u8>(raw),
            Primitive::U16 => parse_as::<u16>(raw),
            Primitive::U32 => parse_as::<u32>(raw),
            Primitive::U64 => parse_as::<u64>(raw),
            Primitive::U128 => parse_as::<u128>(raw),
            Primitive::Usize => parse_as::<usize>(raw),
            Primitive::F32 => parse_as::<f32>(raw),
            Primitive::F64 => parse_as::<f64>(raw),
        }
    }

    /// Rust type identifier of this primitive.
    pub fn type_id(self) -> TypeId {
        match self {
            Primitive::Bool => TypeId::of::<bool>(),
            Primitive::Char => TypeId::of::<char>(),
            Primitive::I8 => TypeId::of::<i8>(),
            Primitive::I16 => TypeId::of::<i16>(),
            Primitive::I32 => TypeId::of::<i32>(),
            Primitive::I64 => TypeId::of::<i64>(),
            Primitive::I128 => TypeId::of::<i128>(),
            Primitive::Isize => TypeId::of::<isize>(),
            Primitive::U8 => TypeId::of::<u8>(),
            Primitive::U16 => TypeId::of::<u16>(),
            Primitive::U32 => TypeId::of::<u32>(),
            Primitive::U64 => TypeId::of::<u64>(),
            Primitive::U128 => TypeId::of::<u128>(),
            Primitive::Usize => TypeId::of::<usize>(),
            Primitive::F32 => TypeId::of::<f32>(),
            Primitive::F64 => TypeId::of::<f64>(),
        }
    }
}

fn parse_as<T>(raw: &str) -> Result<InstanceAnyPtr, ErrorPtr>
where
    T: FromStr + Send + Sync + 'static,
    T::Err: Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .map(|value| Arc::new(value) as InstanceAnyPtr)
        .map_err(|error| Arc::new(error) as ErrorPtr)
}

/// Kind of a described type, deciding how strings and lists are coerced into it.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum TypeKind {
    Text,
    Primitive(Primitive),
    /// Values are other [TypeDescriptor]s, resolved by name.
    TypeToken,
    /// Key/value maps loaded by properties holders.
    Properties,
    /// Generic ordered sequence of erased instances.
    Sequence,
    /// Typed array with a declared element type.
    Array {
        element: String,
        #[derivative(Debug = "ignore")]
        collect: CollectFn,
    },
    Class,
    Capability,
}

/// An edge from a type to one of its generalizations.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Generalization {
    pub target: String,
    #[derivative(Debug = "ignore")]
    pub convert: ConvertFn,
}

/// A constructor or an operation of a type.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Callable {
    /// Operation name, `None` for constructors.
    pub name: Option<String>,
    pub parameters: Vec<String>,
    pub return_type: String,
    pub is_static: bool,
    #[derivative(Debug = "ignore")]
    pub invoke: InvokeFn,
}

impl Callable {
    #[inline]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    #[inline]
    pub fn invoke(
        &self,
        receiver: Option<&InstanceAnyPtr>,
        arguments: &Arguments,
    ) -> Result<InstanceAnyPtr, ErrorPtr> {
        (self.invoke)(receiver, arguments)
    }
}

impl Display for Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}) -> {}",
            self.name.as_deref().unwrap_or("new"),
            self.parameters.join(", "),
            self.return_type
        )
    }
}

/// Runtime description of a type taking part in bean wiring.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct TypeDescriptor {
    name: String,
    type_id: Option<TypeId>,
    kind: TypeKind,
    core: bool,
    superclass: Option<Generalization>,
    capabilities: Vec<Generalization>,
    constructors: Vec<Callable>,
    operations: Vec<Callable>,
    #[derivative(Debug = "ignore")]
    parse: Option<ParseFn>,
}

impl TypeDescriptor {
    /// Creates a bare descriptor. Usually [TypeDescriptorBuilder] is a better choice.
    pub fn new(name: impl Into<String>, type_id: Option<TypeId>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            type_id,
            kind,
            core: false,
            superclass: None,
            capabilities: vec![],
            constructors: vec![],
            operations: vec![],
            parse: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn mark_core(&mut self) {
        self.core = true;
    }

    #[inline]
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Core types take part in string coercion probes with their `parse` operation and textual
    /// constructors.
    #[inline]
    pub fn is_core(&self) -> bool {
        self.core
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, TypeKind::Text)
    }

    #[inline]
    pub fn superclass(&self) -> Option<&Generalization> {
        self.superclass.as_ref()
    }

    #[inline]
    pub fn capabilities(&self) -> &[Generalization] {
        &self.capabilities
    }

    /// All direct generalizations: the superclass first, followed by capabilities.
    pub fn generalizations(&self) -> impl Iterator<Item = &Generalization> {
        self.superclass.iter().chain(self.capabilities.iter())
    }

    #[inline]
    pub fn constructors(&self) -> &[Callable] {
        &self.constructors
    }

    #[inline]
    pub fn operations(&self) -> &[Callable] {
        &self.operations
    }

    /// Finds an instance operation with given name taking no arguments.
    pub fn hook(&self, name: &str) -> Option<&Callable> {
        self.operations.iter().find(|operation| {
            !operation.is_static && operation.is_named(name) && operation.parameters.is_empty()
        })
    }

    #[inline]
    pub fn parser(&self) -> Option<&ParseFn> {
        self.parse.as_ref()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDescriptor {}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builder for [TypeDescriptor]s of `T`, which can be either a sized type or a capability (a
/// trait object).
pub struct TypeDescriptorBuilder<T: ?Sized + 'static> {
    descriptor: TypeDescriptor,
    unwrap: UnwrapFn<T>,
}

impl<T: Send + Sync + 'static> TypeDescriptorBuilder<T> {
    /// Starts describing a concrete type.
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            descriptor: TypeDescriptor::new(name, Some(TypeId::of::<T>()), TypeKind::Class),
            unwrap: downcast_instance::<T>,
        }
    }

    /// Adds a constructor with given parameter types.
    pub fn constructor<F>(mut self, parameters: &[&str], constructor: F) -> Self
    where
        F: Fn(&Arguments) -> Result<T, ErrorPtr> + Send + Sync + 'static,
    {
        let return_type = self.descriptor.name.clone();
        self.descriptor.constructors.push(Callable {
            name: None,
            parameters: to_names(parameters),
            return_type,
            is_static: true,
            invoke: invoker(move |_, arguments| {
                constructor(arguments).map(|instance| Arc::new(instance) as InstanceAnyPtr)
            }),
        });
        self
    }

    /// Sets the static `parse` operation, used when coercing strings.
    pub fn parse<F>(mut self, parse: F) -> Self
    where
        F: Fn(&str) -> Result<T, ErrorPtr> + Send + Sync + 'static,
    {
        self.descriptor.parse = Some(Arc::new(move |raw: &str| {
            parse(raw).map(|instance| Arc::new(instance) as InstanceAnyPtr)
        }));
        self
    }
}

impl<E: Clone + Send + Sync + 'static> TypeDescriptorBuilder<Vec<E>> {
    /// Starts describing an array of elements of type `E`, registered under `element`.
    pub fn array(element: impl Into<String>) -> Self {
        let element = element.into();
        Self {
            descriptor: TypeDescriptor::new(
                array_name(&element),
                Some(TypeId::of::<Vec<E>>()),
                TypeKind::Array {
                    element,
                    collect: Arc::new(collect_array::<E>),
                },
            ),
            unwrap: downcast_instance::<Vec<E>>,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> TypeDescriptorBuilder<T> {
    /// Starts describing a capability - instances are stored as `Arc<T>`.
    pub fn capability(name: impl Into<String>) -> Self {
        Self {
            descriptor: TypeDescriptor::new(
                name,
                Some(TypeId::of::<InstancePtr<T>>()),
                TypeKind::Capability,
            ),
            unwrap: downcast_capability::<T>,
        }
    }

    /// Declares the superclass-like ancestor of this type.
    pub fn extends<S, F>(mut self, name: impl Into<String>, upcast: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(InstancePtr<T>) -> InstancePtr<S> + Send + Sync + 'static,
    {
        let unwrap = self.unwrap;
        self.descriptor.superclass = Some(Generalization {
            target: name.into(),
            convert: Arc::new(move |instance| {
                unwrap(instance).map(|instance| upcast(instance) as InstanceAnyPtr)
            }),
        });
        self
    }

    /// Declares a capability implemented by this type.
    pub fn implements<I, F>(mut self, name: impl Into<String>, upcast: F) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(InstancePtr<T>) -> InstancePtr<I> + Send + Sync + 'static,
    {
        let unwrap = self.unwrap;
        self.descriptor.capabilities.push(Generalization {
            target: name.into(),
            convert: Arc::new(move |instance| {
                unwrap(instance).map(|instance| capability_instance(upcast(instance)))
            }),
        });
        self
    }

    /// Adds a static operation, usually a factory.
    pub fn static_operation<R, F>(
        mut self,
        name: impl Into<String>,
        parameters: &[&str],
        return_type: impl Into<String>,
        operation: F,
    ) -> Self
    where
        R: Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<R, ErrorPtr> + Send + Sync + 'static,
    {
        self.descriptor.operations.push(Callable {
            name: Some(name.into()),
            parameters: to_names(parameters),
            return_type: return_type.into(),
            is_static: true,
            invoke: invoker(move |_, arguments| {
                operation(arguments).map(|result| Arc::new(result) as InstanceAnyPtr)
            }),
        });
        self
    }

    /// Adds a static operation returning a capability view.
    pub fn static_capability_operation<I, F>(
        mut self,
        name: impl Into<String>,
        parameters: &[&str],
        return_type: impl Into<String>,
        operation: F,
    ) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<InstancePtr<I>, ErrorPtr> + Send + Sync + 'static,
    {
        self.descriptor.operations.push(Callable {
            name: Some(name.into()),
            parameters: to_names(parameters),
            return_type: return_type.into(),
            is_static: true,
            invoke: invoker(move |_, arguments| operation(arguments).map(capability_instance)),
        });
        self
    }

    /// Adds an instance operation.
    pub fn operation<R, F>(
        mut self,
        name: impl Into<String>,
        parameters: &[&str],
        return_type: impl Into<String>,
        operation: F,
    ) -> Self
    where
        R: Send + Sync + 'static,
        F: Fn(&T, &Arguments) -> Result<R, ErrorPtr> + Send + Sync + 'static,
    {
        let unwrap = self.unwrap;
        self.descriptor.operations.push(Callable {
            name: Some(name.into()),
            parameters: to_names(parameters),
            return_type: return_type.into(),
            is_static: false,
            invoke: invoker(move |receiver, arguments| {
                let receiver = receiver.cloned().and_then(unwrap).ok_or_else(|| {
                    Arc::new(InvocationError::MissingReceiver(type_name::<T>())) as ErrorPtr
                })?;
                operation(&*receiver, arguments).map(|result| Arc::new(result) as InstanceAnyPtr)
            }),
        });
        self
    }

    /// Adds an instance operation taking no arguments and returning nothing, usable as an
    /// initialization or activation hook.
    pub fn hook<F>(self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), ErrorPtr> + Send + Sync + 'static,
    {
        self.operation(name, &[], UNIT, move |receiver, _| hook(receiver))
    }

    /// Marks the type as core.
    pub fn core(mut self) -> Self {
        self.descriptor.core = true;
        self
    }

    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// Name of the unit type, returned by hooks.
pub const UNIT: &str = "()";

/// Name of an array type with given element type.
pub fn array_name(element: &str) -> String {
    format!("[{element}]")
}

fn collect_array<E: Clone + Send + Sync + 'static>(
    elements: Vec<InstanceAnyPtr>,
) -> Option<InstanceAnyPtr> {
    elements
        .into_iter()
        .map(|element| downcast_instance::<E>(element).map(|element| (*element).clone()))
        .collect::<Option<Vec<E>>>()
        .map(|array| Arc::new(array) as InstanceAnyPtr)
}

fn to_names(parameters: &[&str]) -> Vec<String> {
    parameters.iter().map(|name| name.to_string()).collect()
}

fn invoker<F>(invoke: F) -> InvokeFn
where
    F: Fn(Option<&InstanceAnyPtr>, &Arguments) -> Result<InstanceAnyPtr, ErrorPtr>
        + Send
        + Sync
        + 'static,
{
    Arc::new(invoke)
}

/// Materialized arguments passed to a [Callable], already converted to declared parameter types.
#[derive(Clone, Default, Debug)]
pub struct Arguments {
    values: Vec<InstanceAnyPtr>,
}

impl Arguments {
    pub fn new(values: Vec<InstanceAnyPtr>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the erased argument at given position.
    pub fn raw(&self, index: usize) -> Result<&InstanceAnyPtr, ErrorPtr> {
        self.values
            .get(index)
            .ok_or_else(|| Arc::new(InvocationError::MissingArgument(index)) as ErrorPtr)
    }

    /// Returns a shared pointer to the argument at given position.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<InstancePtr<T>, ErrorPtr> {
        downcast_instance::<T>(self.raw(index)?.clone()).ok_or_else(|| mismatch::<T>(index))
    }

    /// Returns a copy of the argument at given position.
    pub fn value<T: Clone + Send + Sync + 'static>(&self, index: usize) -> Result<T, ErrorPtr> {
        self.get::<T>(index).map(|value| (*value).clone())
    }

    /// Returns the argument at given position as a capability view.
    pub fn capability<I: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<InstancePtr<I>, ErrorPtr> {
        downcast_capability::<I>(self.raw(index)?.clone()).ok_or_else(|| mismatch::<I>(index))
    }
}

fn mismatch<T: ?Sized>(index: usize) -> ErrorPtr {
    Arc::new(InvocationError::ArgumentMismatch {
        index,
        expected: type_name::<T>(),
    })
}

#[cfg(test)]
mod tests {
    use crate::instance_provider::{
        downcast_capability, downcast_instance, InstanceAnyPtr, InstancePtr,
    };
    use crate::types::{Arguments, Primitive, TypeDescriptorBuilder, TypeKind};
    use std::sync::Arc;

    trait Shape: Send + Sync {
        fn area(&self) -> f64;
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Square {
        side: f64,
    }

    impl Shape for Square {
        fn area(&self) -> f64 {
            self.side * self.side
        }
    }

    fn square_descriptor() -> TypeDescriptorBuilder<Square> {
        TypeDescriptorBuilder::<Square>::class("Square")
            .implements::<dyn Shape, _>("Shape", |square| square as InstancePtr<dyn Shape>)
            .constructor(&["f64"], |arguments| {
                Ok(Square {
                    side: arguments.value(0)?,
                })
            })
            .operation("scaled", &["f64"], "Square", |square: &Square, arguments| {
                Ok(Square {
                    side: square.side * arguments.value::<f64>(0)?,
                })
            })
    }

    #[test]
    fn should_construct_instances() {
        let descriptor = square_descriptor().build();
        let constructor = &descriptor.constructors()[0];

        let instance = constructor
            .invoke(None, &Arguments::new(vec![Arc::new(2.0_f64) as InstanceAnyPtr]))
            .unwrap();
        assert_eq!(
            *downcast_instance::<Square>(instance).unwrap(),
            Square { side: 2.0 }
        );
        assert_eq!(constructor.to_string(), "new(f64) -> Square");
    }

    #[test]
    fn should_invoke_instance_operations() {
        let descriptor = square_descriptor().build();
        let operation = descriptor
            .operations()
            .iter()
            .find(|operation| operation.is_named("scaled"))
            .unwrap();

        let receiver = Arc::new(Square { side: 2.0 }) as InstanceAnyPtr;
        let result = operation
            .invoke(
                Some(&receiver),
                &Arguments::new(vec![Arc::new(3.0_f64) as InstanceAnyPtr]),
            )
            .unwrap();
        assert_eq!(downcast_instance::<Square>(result).unwrap().side, 6.0);

        assert!(operation
            .invoke(None, &Arguments::new(vec![Arc::new(3.0_f64) as InstanceAnyPtr]))
            .is_err());
    }

    #[test]
    fn should_convert_to_capabilities() {
        let descriptor = square_descriptor().build();
        let generalization = &descriptor.capabilities()[0];
        assert_eq!(generalization.target, "Shape");

        let square = Arc::new(Square { side: 3.0 }) as InstanceAnyPtr;
        let converted = (generalization.convert)(square).unwrap();
        let shape = downcast_capability::<dyn Shape>(converted).unwrap();
        assert_eq!(shape.area(), 9.0);

        assert!((generalization.convert)(Arc::new(1_i32) as InstanceAnyPtr).is_none());
    }

    #[test]
    fn should_find_hooks() {
        let descriptor = TypeDescriptorBuilder::<Square>::class("Square")
            .hook("validate", |square| {
                assert!(square.side > 0.0);
                Ok(())
            })
            .build();

        assert!(descriptor.hook("validate").is_some());
        assert!(descriptor.hook("missing").is_none());
    }

    #[test]
    fn should_report_argument_errors() {
        let arguments = Arguments::new(vec![Arc::new(1_i32) as InstanceAnyPtr]);
        assert_eq!(arguments.value::<i32>(0).unwrap(), 1);
        assert!(arguments.value::<String>(0).is_err());
        assert!(arguments.value::<i32>(1).is_err());
    }

    #[test]
    fn should_parse_primitives() {
        let value = Primitive::I64.parse("-42").unwrap();
        assert_eq!(*downcast_instance::<i64>(value).unwrap(), -42);

        let value = Primitive::Char.parse("xyz").unwrap();
        assert_eq!(*downcast_instance::<char>(value).unwrap(), 'x');

        assert!(Primitive::U8.parse("-1").is_err());
        assert!(Primitive::Char.parse("").is_err());
        assert!(Primitive::Bool.parse("yes").is_err());
    }

    #[test]
    fn should_collect_arrays() {
        let descriptor = TypeDescriptorBuilder::<Vec<i32>>::array("i32").build();
        assert_eq!(descriptor.name(), "[i32]");

        let TypeKind::Array { element, collect } = descriptor.kind() else {
            panic!("not an array");
        };
        assert_eq!(element, "i32");

        let array = collect(vec![
            Arc::new(1_i32) as InstanceAnyPtr,
            Arc::new(2_i32) as InstanceAnyPtr,
        ])
        .unwrap();
        assert_eq!(*downcast_instance::<Vec<i32>>(array).unwrap(), vec![1, 2]);
        assert!(collect(vec![Arc::new("x".to_string()) as InstanceAnyPtr]).is_none());
    }
}
