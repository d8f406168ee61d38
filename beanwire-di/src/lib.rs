//! A minimal inversion-of-control container based on declarative bean definitions and runtime
//! type descriptors.
//!
//! Beans are declared with [BeanSpec](definition::BeanSpec)s: a bean has a type, a scope and a
//! list of arguments, and is created either by the most specific applicable constructor of its
//! type, or by a static or instance factory operation. Arguments can be constants coerced from
//! strings, references to other beans or properties holders, nested beans and lists. Since Rust
//! has no runtime reflection, every type taking part in wiring is described by a
//! [TypeDescriptor](types::TypeDescriptor), registered either explicitly in a
//! [TypeRegistry](type_registry::TypeRegistry) or statically with
//! [register_type].
//!
//! Beans are assembled into a [Context](context::Context) by a
//! [ContextBuilder](builder::ContextBuilder). Contexts can have parents, to which lookups are
//! delegated when a bean, type or property is not found locally.
//!
//! ```
//! use beanwire_di::builder::ContextBuilder;
//! use beanwire_di::definition::{ArgumentSpec, BeanSpec};
//! use beanwire_di::instance_provider::TypedBeanProvider;
//! use beanwire_di::type_registry::TypeRegistry;
//! use beanwire_di::types::TypeDescriptorBuilder;
//!
//! struct Port(u16);
//!
//! let context = ContextBuilder::new("example")
//!     .with_type_registry(TypeRegistry::new().with(
//!         TypeDescriptorBuilder::<Port>::class("Port")
//!             .constructor(&["u16"], |arguments| Ok(Port(arguments.value(0)?)))
//!             .build(),
//!     ))
//!     .with_bean(BeanSpec::new("port", "Port").with_argument(ArgumentSpec::constant("8080")))
//!     .build()
//!     .unwrap();
//!
//! let port = context.bean::<Port>("port").unwrap().unwrap();
//! assert_eq!(port.0, 8080);
//! ```
//!
//! ### Active beans
//!
//! Beans marked as active are run on dedicated threads right after creation, either by calling
//! their activation operation, or through the built-in
//! [Runnable](activation::Runnable) capability. Active beans implementing the
//! [ActiveBean](activation::ActiveBean) capability are notified when the context shuts down.

pub mod activation;
pub mod builder;
pub mod coercion;
pub mod context;
pub mod definition;
pub mod distance;
pub mod error;
pub mod factory;
pub mod holder;
pub mod instance_provider;
pub mod placeholder;
pub mod property;
pub mod scope;
pub mod selector;
pub mod type_registry;
pub mod types;

pub use error::{ContextError, ErrorPtr};
