//! Declarative descriptions of beans and resources, consumed by the
//! [ContextBuilder](crate::builder::ContextBuilder). String fields may contain `${key}`
//! placeholders, resolved against properties holders when the context is assembled.

use crate::scope::ScopeKind;

/// Declaration of a single bean.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BeanSpec {
    /// Unique identifier. Anonymous top-level beans are named `<type>#<index>`, anonymous nested
    /// beans `<owner>#<argument index>`.
    pub identifier: Option<String>,
    pub type_name: String,
    pub artifact: Option<String>,
    pub scope: ScopeKind,
    pub factory_owner: Option<String>,
    pub factory_type: Option<String>,
    pub factory_operation: Option<String>,
    pub lazy: bool,
    pub active: bool,
    pub activation_operation: Option<String>,
    pub init_operation: Option<String>,
    pub finalize_operation: Option<String>,
    pub arguments: Vec<ArgumentSpec>,
}

impl BeanSpec {
    pub fn new(identifier: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn anonymous(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    pub fn with_scope(mut self, scope: ScopeKind) -> Self {
        self.scope = scope;
        self
    }

    /// Resolves the bean type in the isolated registry of given artifact.
    pub fn with_artifact(mut self, artifact: impl Into<String>) -> Self {
        self.artifact = Some(artifact.into());
        self
    }

    /// Creates the bean with a static operation of its own type.
    pub fn with_static_factory(mut self, operation: impl Into<String>) -> Self {
        self.factory_operation = Some(operation.into());
        self
    }

    /// Creates the bean with a static operation of another type.
    pub fn with_factory_type(
        mut self,
        factory_type: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        self.factory_type = Some(factory_type.into());
        self.factory_operation = Some(operation.into());
        self
    }

    /// Creates the bean with an operation of another bean.
    pub fn with_factory_bean(
        mut self,
        owner: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        self.factory_owner = Some(owner.into());
        self.factory_operation = Some(operation.into());
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn active(mut self) -> Self {
        self.active = true;
        self
    }

    pub fn with_activation_operation(mut self, operation: impl Into<String>) -> Self {
        self.active = true;
        self.activation_operation = Some(operation.into());
        self
    }

    pub fn with_init_operation(mut self, operation: impl Into<String>) -> Self {
        self.init_operation = Some(operation.into());
        self
    }

    pub fn with_finalize_operation(mut self, operation: impl Into<String>) -> Self {
        self.finalize_operation = Some(operation.into());
        self
    }

    pub fn with_argument(mut self, argument: ArgumentSpec) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = ArgumentSpec>) -> Self {
        self.arguments.extend(arguments);
        self
    }
}

/// Declaration of a constructor or factory operation argument.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ArgumentSpec {
    /// Raw string, coerced to the parameter type.
    Constant(String),
    BeanReference(String),
    PropertiesReference(String),
    /// Nested bean, registered in the context alongside its owner.
    Bean(Box<BeanSpec>),
    List(Vec<ArgumentSpec>),
}

impl ArgumentSpec {
    #[inline]
    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant(value.into())
    }

    #[inline]
    pub fn reference(identifier: impl Into<String>) -> Self {
        Self::BeanReference(identifier.into())
    }

    #[inline]
    pub fn properties(identifier: impl Into<String>) -> Self {
        Self::PropertiesReference(identifier.into())
    }

    #[inline]
    pub fn bean(bean: BeanSpec) -> Self {
        Self::Bean(Box::new(bean))
    }

    pub fn list(elements: impl IntoIterator<Item = ArgumentSpec>) -> Self {
        Self::List(elements.into_iter().collect())
    }
}

/// Declaration of a properties holder or an artifact.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ResourceSpec {
    pub identifier: String,
    pub locator: String,
}

impl ResourceSpec {
    pub fn new(identifier: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            locator: locator.into(),
        }
    }
}
