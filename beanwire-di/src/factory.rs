//! Core functionality for creating bean instances. Every bean registered in a
//! [Context](crate::context::Context) is backed by a [BeanInstanceFactory], which resolves the
//! bean type, selects the most specific way of creating an instance, runs the initialization hook
//! and activates active beans. Created instances are stored in the factory [scope](crate::scope).

use crate::activation::{ActiveBean, Runnable};
use crate::context::Context;
use crate::distance::{convert_instance, is_assignable};
use crate::error::ContextError;
use crate::instance_provider::{downcast_capability, InstanceAnyPtr};
use crate::property::{invalid_morph_target, view_as, Property, PropertyPtr, ReferencableProperty};
use crate::scope::{ScopeKind, ScopePtr};
use crate::selector::{select_callable, SelectedCallable};
use crate::type_registry::builtin::{ACTIVE_BEAN, RUNNABLE};
use crate::type_registry::TypeLookup;
use crate::types::{Arguments, Callable, TypeRef};
use derivative::Derivative;
use itertools::Itertools;
use std::cell::RefCell;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Static description of a bean, with placeholders already resolved.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BeanDefinition {
    pub identifier: String,
    /// Artifact whose isolated types are used to resolve the bean type.
    pub artifact: Option<String>,
    pub type_name: String,
    /// Bean providing the factory operation.
    pub factory_owner: Option<String>,
    /// Type providing the static factory operation, if other than the bean type.
    pub factory_type: Option<String>,
    pub factory_operation: Option<String>,
    pub lazy: bool,
    pub active: bool,
    pub activation_operation: Option<String>,
    pub init_operation: Option<String>,
    /// Accepted for completeness; never invoked.
    pub finalize_operation: Option<String>,
}

thread_local! {
    static BEANS_UNDER_CONSTRUCTION: RefCell<Vec<(usize, String)>> = RefCell::new(vec![]);
}

// marks a factory as creating an instance on the current thread until dropped
struct ConstructionGuard {
    key: usize,
}

impl ConstructionGuard {
    fn enter(factory: &BeanInstanceFactory) -> Result<Self, ContextError> {
        let key = factory as *const BeanInstanceFactory as usize;
        let identifier = &factory.definition.identifier;

        BEANS_UNDER_CONSTRUCTION.with(|beans| {
            let mut beans = beans.borrow_mut();
            if let Some(position) = beans.iter().position(|(bean, _)| *bean == key) {
                let chain = beans[position..]
                    .iter()
                    .map(|(_, identifier)| identifier.clone())
                    .chain([identifier.clone()])
                    .collect_vec();

                return Err(ContextError::CircularReference { chain });
            }

            beans.push((key, identifier.clone()));
            Ok(Self { key })
        })
    }
}

impl Drop for ConstructionGuard {
    fn drop(&mut self) {
        BEANS_UNDER_CONSTRUCTION.with(|beans| {
            let mut beans = beans.borrow_mut();
            if let Some(position) = beans.iter().rposition(|(bean, _)| *bean == self.key) {
                beans.remove(position);
            }
        });
    }
}

/// Factory of instances of a single bean, keeping them in its own scope.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct BeanInstanceFactory {
    definition: BeanDefinition,
    arguments: Vec<PropertyPtr>,
    scope_kind: ScopeKind,
    scope: ScopePtr,
    #[derivative(Debug = "ignore")]
    resolved_type: Mutex<Option<TypeRef>>,
}

impl BeanInstanceFactory {
    /// Creates a new factory. Active beans are never lazy.
    pub fn new(
        mut definition: BeanDefinition,
        scope_kind: ScopeKind,
        arguments: Vec<PropertyPtr>,
    ) -> Self {
        definition.lazy = definition.lazy && !definition.active;

        Self {
            definition,
            arguments,
            scope_kind,
            scope: scope_kind.create_scope(),
            resolved_type: Mutex::new(None),
        }
    }

    #[inline]
    pub fn singleton(definition: BeanDefinition, arguments: Vec<PropertyPtr>) -> Self {
        Self::new(definition, ScopeKind::Singleton, arguments)
    }

    #[inline]
    pub fn prototype(definition: BeanDefinition, arguments: Vec<PropertyPtr>) -> Self {
        Self::new(definition, ScopeKind::Prototype, arguments)
    }

    #[inline]
    pub fn definition(&self) -> &BeanDefinition {
        &self.definition
    }

    #[inline]
    pub fn arguments(&self) -> &[PropertyPtr] {
        &self.arguments
    }

    #[inline]
    pub fn scope_kind(&self) -> ScopeKind {
        self.scope_kind
    }

    #[inline]
    pub fn is_lazy(&self) -> bool {
        self.definition.lazy
    }

    /// Resolves the bean type once, through the artifact registry if the bean declares one.
    pub fn resolve_type(&self, context: &Context) -> Result<TypeRef, ContextError> {
        let mut resolved_type = self
            .resolved_type
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(resolved_type) = resolved_type.as_ref() {
            return Ok(resolved_type.clone());
        }

        let definition = &self.definition;
        let value_type = match &definition.artifact {
            Some(artifact) => context
                .artifact_holder(artifact)
                .ok_or_else(|| ContextError::UnknownArtifact {
                    identifier: definition.identifier.clone(),
                    artifact: artifact.clone(),
                })?
                .registry()?
                .by_name(&definition.type_name),
            None => context.lookup_type(&definition.type_name),
        }
        .ok_or_else(|| ContextError::TypeNotFound {
            identifier: definition.identifier.clone(),
            type_name: definition.type_name.clone(),
        })?;

        debug!(
            bean = %definition.identifier,
            type_name = value_type.name(),
            "Resolved bean type."
        );

        *resolved_type = Some(value_type.clone());
        Ok(value_type)
    }

    fn create_instance(&self, context: &Context) -> Result<InstanceAnyPtr, ContextError> {
        let value_type = self.resolve_type(context)?;
        let definition = &self.definition;

        debug!(
            bean = %definition.identifier,
            scope = self.scope_kind.name(),
            "Creating bean instance."
        );

        let instance = match (
            &definition.factory_owner,
            &definition.factory_type,
            &definition.factory_operation,
        ) {
            (None, factory_type, Some(operation)) => self.create_with_static_factory(
                context,
                &value_type,
                factory_type.as_deref(),
                operation,
            )?,
            (Some(owner), _, Some(operation)) => {
                self.create_with_factory_bean(context, &value_type, owner, operation)?
            }
            (Some(_), _, None) | (None, Some(_), None) => {
                return Err(ContextError::InvalidFactoryConfiguration {
                    identifier: definition.identifier.clone(),
                })
            }
            (None, None, None) => self.construct(context, &value_type)?,
        };

        if let Some(operation) = &definition.init_operation {
            self.run_init_operation(&value_type, &instance, operation)?;
        }

        if definition.active {
            self.activate(context, &value_type, &instance)?;
        }

        Ok(instance)
    }

    fn construct(
        &self,
        context: &Context,
        value_type: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        let selected = select_callable(
            context,
            &self.definition.identifier,
            value_type.constructors(),
            &self.arguments,
        )?
        .ok_or_else(|| self.no_applicable_callable(value_type, "constructor".to_string()))?;

        self.invoke(context, value_type, &selected, None)
    }

    fn create_with_static_factory(
        &self,
        context: &Context,
        value_type: &TypeRef,
        factory_type: Option<&str>,
        operation: &str,
    ) -> Result<InstanceAnyPtr, ContextError> {
        let factory_type = match factory_type {
            Some(factory_type) => context.require_type(factory_type, &self.definition.identifier)?,
            None => value_type.clone(),
        };

        let candidates = factory_type.operations().iter().filter(|candidate| {
            candidate.is_static
                && candidate.is_named(operation)
                && self.returns_assignable(context, candidate, value_type)
        });

        let selected = select_callable(
            context,
            &self.definition.identifier,
            candidates,
            &self.arguments,
        )?
        .ok_or_else(|| {
            self.no_applicable_callable(&factory_type, format!("static operation '{operation}'"))
        })?;

        self.invoke(context, value_type, &selected, None)
    }

    fn create_with_factory_bean(
        &self,
        context: &Context,
        value_type: &TypeRef,
        owner: &str,
        operation: &str,
    ) -> Result<InstanceAnyPtr, ContextError> {
        let invalid_reference = || ContextError::InvalidFactoryReference {
            identifier: self.definition.identifier.clone(),
            factory: owner.to_string(),
            operation: operation.to_string(),
        };

        let factory = context
            .get_bean_reference(owner)
            .ok_or_else(invalid_reference)?;
        let factory_type = factory.value_type()?.ok_or_else(invalid_reference)?;

        let candidates = factory_type.operations().iter().filter(|candidate| {
            !candidate.is_static
                && candidate.is_named(operation)
                && self.returns_assignable(context, candidate, value_type)
        });

        let selected = select_callable(
            context,
            &self.definition.identifier,
            candidates,
            &self.arguments,
        )?
        .ok_or_else(invalid_reference)?;

        let receiver = factory.value()?;
        self.invoke(context, value_type, &selected, Some(&receiver))
    }

    fn returns_assignable(&self, context: &Context, callable: &Callable, target: &TypeRef) -> bool {
        context
            .lookup_type(&callable.return_type)
            .map(|return_type| is_assignable(context, target, &return_type))
            .unwrap_or(false)
    }

    // materializes arguments as parameter types and views the result as the bean type
    fn invoke(
        &self,
        context: &Context,
        value_type: &TypeRef,
        selected: &SelectedCallable,
        receiver: Option<&InstanceAnyPtr>,
    ) -> Result<InstanceAnyPtr, ContextError> {
        let values = self
            .arguments
            .iter()
            .zip(&selected.parameter_types)
            .map(|(argument, parameter_type)| argument.value_as(context, parameter_type))
            .collect::<Result<Vec<_>, _>>()?;

        let instance = selected
            .callable
            .invoke(receiver, &Arguments::new(values))
            .map_err(|source| ContextError::InstantiationFailed {
                identifier: self.definition.identifier.clone(),
                type_name: value_type.name().to_string(),
                source,
            })?;

        let return_type = context.require_type(
            &selected.callable.return_type,
            &self.definition.identifier,
        )?;

        view_as(
            context,
            &self.definition.identifier,
            instance,
            &return_type,
            value_type,
        )
    }

    fn run_init_operation(
        &self,
        value_type: &TypeRef,
        instance: &InstanceAnyPtr,
        operation: &str,
    ) -> Result<(), ContextError> {
        let hook = value_type
            .hook(operation)
            .ok_or_else(|| ContextError::InvalidInitializeOperation {
                identifier: self.definition.identifier.clone(),
                operation: operation.to_string(),
                source: None,
            })?;

        hook.invoke(Some(instance), &Arguments::default())
            .map(|_| ())
            .map_err(|source| ContextError::InvalidInitializeOperation {
                identifier: self.definition.identifier.clone(),
                operation: operation.to_string(),
                source: Some(source),
            })
    }

    fn activate(
        &self,
        context: &Context,
        value_type: &TypeRef,
        instance: &InstanceAnyPtr,
    ) -> Result<(), ContextError> {
        let identifier = &self.definition.identifier;
        let shutdown = self.shutdown_hook(context, value_type, instance);

        match &self.definition.activation_operation {
            Some(operation) => {
                let hook = value_type.hook(operation).cloned().ok_or_else(|| {
                    self.invalid_active_attribution(value_type, Some(operation.clone()))
                })?;

                let receiver = instance.clone();
                context.activation_group().spawn(
                    identifier,
                    format!("active-{identifier}-{operation}"),
                    move || hook.invoke(Some(&receiver), &Arguments::default()).map(|_| ()),
                    shutdown,
                )
            }
            None => {
                let runnable = context
                    .lookup_type(RUNNABLE)
                    .and_then(|runnable| {
                        convert_instance(context, instance.clone(), value_type, &runnable)
                    })
                    .and_then(downcast_capability::<dyn Runnable>)
                    .ok_or_else(|| self.invalid_active_attribution(value_type, None))?;

                context.activation_group().spawn(
                    identifier,
                    format!("active-{identifier}"),
                    move || runnable.run(),
                    shutdown,
                )
            }
        }
    }

    fn shutdown_hook(
        &self,
        context: &Context,
        value_type: &TypeRef,
        instance: &InstanceAnyPtr,
    ) -> Option<Arc<dyn ActiveBean>> {
        context
            .lookup_type(ACTIVE_BEAN)
            .and_then(|active_bean| {
                convert_instance(context, instance.clone(), value_type, &active_bean)
            })
            .and_then(downcast_capability::<dyn ActiveBean>)
    }

    fn no_applicable_callable(&self, owner: &TypeRef, operation: String) -> ContextError {
        ContextError::NoApplicableCallable {
            identifier: self.definition.identifier.clone(),
            type_name: owner.name().to_string(),
            operation,
            arguments: self.arguments.len(),
        }
    }

    fn invalid_active_attribution(
        &self,
        value_type: &TypeRef,
        operation: Option<String>,
    ) -> ContextError {
        ContextError::InvalidActiveAttribution {
            identifier: self.definition.identifier.clone(),
            type_name: value_type.name().to_string(),
            operation,
        }
    }
}

impl Property for BeanInstanceFactory {
    fn value(&self, context: &Context) -> Result<InstanceAnyPtr, ContextError> {
        let _guard = ConstructionGuard::enter(self)?;
        self.scope.instance(&|| self.create_instance(context))
    }

    fn value_type(&self, context: &Context) -> Result<Option<TypeRef>, ContextError> {
        self.resolve_type(context).map(Some)
    }

    fn is_resolvable_as(&self, context: &Context, target: &TypeRef) -> Result<bool, ContextError> {
        let value_type = self.resolve_type(context)?;
        Ok(is_assignable(context, target, &value_type))
    }

    fn value_as(
        &self,
        context: &Context,
        target: &TypeRef,
    ) -> Result<InstanceAnyPtr, ContextError> {
        let value_type = self.resolve_type(context)?;
        if !is_assignable(context, target, &value_type) {
            return Err(invalid_morph_target(
                &self.definition.identifier,
                value_type.name(),
                target,
            ));
        }

        view_as(
            context,
            &self.definition.identifier,
            self.value(context)?,
            &value_type,
            target,
        )
    }
}

impl ReferencableProperty for BeanInstanceFactory {
    #[inline]
    fn identifier(&self) -> &str {
        &self.definition.identifier
    }

    fn initialize(&self, context: &Context) -> Result<(), ContextError> {
        if self.is_lazy() {
            return Ok(());
        }

        self.value(context).map(|_| ())
    }
}
