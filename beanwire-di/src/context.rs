//! The [Context] is the container of assembled beans. It owns bean factories, properties and
//! artifact holders, and the activation group supervising active beans. Contexts form a
//! hierarchy: beans, properties, holders and types not found locally are looked up in the parent
//! context.
//!
//! Contexts are created by the [ContextBuilder](crate::builder::ContextBuilder) and are immutable
//! afterwards, apart from lazily created instances and loaded resources.

use crate::activation::{ActivationGroup, ActivationOutcome};
use crate::distance::{type_distance, UNRELATED};
use crate::error::ContextError;
use crate::holder::{ArtifactHolder, PropertiesHolder};
use crate::instance_provider::{BeanProvider, InstanceAnyPtr};
use crate::placeholder::{placeholder_key, PREFIX, SUFFIX};
use crate::property::ReferencablePropertyPtr;
use crate::type_registry::{TypeLookup, TypeRegistry};
use crate::types::TypeRef;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

// placeholders referring to other placeholders are followed this many times
const MAX_PLACEHOLDER_DEPTH: usize = 16;

/// A bean found by identifier, together with the context which owns it. All operations resolve
/// against the owning context.
#[derive(Clone, Copy, Debug)]
pub struct BeanLookup<'a> {
    context: &'a Context,
    property: &'a ReferencablePropertyPtr,
}

impl<'a> BeanLookup<'a> {
    #[inline]
    pub fn context(&self) -> &'a Context {
        self.context
    }

    #[inline]
    pub fn identifier(&self) -> &'a str {
        self.property.identifier()
    }

    #[inline]
    pub fn value(&self) -> Result<InstanceAnyPtr, ContextError> {
        self.property.value(self.context)
    }

    #[inline]
    pub fn value_type(&self) -> Result<Option<TypeRef>, ContextError> {
        self.property.value_type(self.context)
    }

    #[inline]
    pub fn is_resolvable_as(&self, target: &TypeRef) -> Result<bool, ContextError> {
        self.property.is_resolvable_as(self.context, target)
    }

    #[inline]
    pub fn value_as(&self, target: &TypeRef) -> Result<InstanceAnyPtr, ContextError> {
        self.property.value_as(self.context, target)
    }
}

/// Container of beans. See module documentation for details.
#[derive(Debug)]
pub struct Context {
    identifier: String,
    parent: Option<Arc<Context>>,
    types: Arc<TypeRegistry>,
    beans: BTreeMap<String, ReferencablePropertyPtr>,
    properties: BTreeMap<String, Arc<PropertiesHolder>>,
    artifacts: BTreeMap<String, Arc<ArtifactHolder>>,
    activation_group: ActivationGroup,
    initialization_order: Vec<String>,
}

impl Context {
    pub(crate) fn new(
        identifier: String,
        parent: Option<Arc<Context>>,
        types: Arc<TypeRegistry>,
    ) -> Self {
        Self {
            activation_group: ActivationGroup::new(identifier.clone()),
            identifier,
            parent,
            types,
            beans: Default::default(),
            properties: Default::default(),
            artifacts: Default::default(),
            initialization_order: vec![],
        }
    }

    /// Registers a bean, unless one with the same identifier already exists. Returns whether
    /// the bean was registered.
    pub(crate) fn register_bean(&mut self, bean: ReferencablePropertyPtr) -> bool {
        if self.beans.contains_key(bean.identifier()) {
            return false;
        }

        self.beans.insert(bean.identifier().to_string(), bean);
        true
    }

    pub(crate) fn has_local_bean(&self, identifier: &str) -> bool {
        self.beans.contains_key(identifier)
    }

    pub(crate) fn register_properties(&mut self, holder: PropertiesHolder) -> bool {
        if self.properties.contains_key(holder.identifier()) {
            return false;
        }

        self.properties
            .insert(holder.identifier().to_string(), Arc::new(holder));
        true
    }

    pub(crate) fn register_artifact(&mut self, holder: ArtifactHolder) -> bool {
        if self.artifacts.contains_key(holder.identifier()) {
            return false;
        }

        self.artifacts
            .insert(holder.identifier().to_string(), Arc::new(holder));
        true
    }

    pub(crate) fn set_initialization_order(&mut self, order: Vec<String>) {
        self.initialization_order = order;
    }

    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[inline]
    pub fn parent(&self) -> Option<&Arc<Context>> {
        self.parent.as_ref()
    }

    /// The ambient type registry of this context.
    #[inline]
    pub fn type_registry(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Identifiers of local beans, sorted.
    pub fn bean_identifiers(&self) -> impl Iterator<Item = &str> {
        self.beans.keys().map(String::as_str)
    }

    /// Order in which local beans are initialized - dependencies first.
    #[inline]
    pub fn initialization_order(&self) -> &[String] {
        &self.initialization_order
    }

    #[inline]
    pub fn activation_group(&self) -> &ActivationGroup {
        &self.activation_group
    }

    /// Finds a bean by identifier, locally first and then in ancestors.
    pub fn get_bean_reference(&self, identifier: &str) -> Option<BeanLookup<'_>> {
        match self.beans.get(identifier) {
            Some(property) => Some(BeanLookup {
                context: self,
                property,
            }),
            None => self
                .parent
                .as_ref()
                .and_then(|parent| parent.get_bean_reference(identifier)),
        }
    }

    pub fn properties_holder(&self, identifier: &str) -> Option<&Arc<PropertiesHolder>> {
        self.properties.get(identifier).or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.properties_holder(identifier))
        })
    }

    pub fn artifact_holder(&self, identifier: &str) -> Option<&Arc<ArtifactHolder>> {
        self.artifacts.get(identifier).or_else(|| {
            self.parent
                .as_ref()
                .and_then(|parent| parent.artifact_holder(identifier))
        })
    }

    /// Looks up a type which must exist.
    pub fn require_type(&self, name: &str, required_by: &str) -> Result<TypeRef, ContextError> {
        self.lookup_type(name)
            .ok_or_else(|| ContextError::TypeNotFound {
                identifier: required_by.to_string(),
                type_name: name.to_string(),
            })
    }

    /// Finds the value for `key` in properties holders, in identifier order. Values which are
    /// placeholders themselves are followed. Keys not found locally are resolved by the parent.
    pub fn resolve_property_value(&self, key: &str) -> Result<Option<String>, ContextError> {
        self.resolve_property_value_at(key, 0)
    }

    fn resolve_property_value_at(
        &self,
        key: &str,
        depth: usize,
    ) -> Result<Option<String>, ContextError> {
        if depth >= MAX_PLACEHOLDER_DEPTH {
            return Err(ContextError::UnresolvablePlaceholder {
                placeholder: format!("{PREFIX}{key}{SUFFIX}"),
            });
        }

        for holder in self.properties.values() {
            if let Some(value) = holder.property_value(key)? {
                return match placeholder_key(&value) {
                    Some(inner) => self.resolve_property_value_at(inner, depth + 1),
                    None => Ok(Some(value)),
                };
            }
        }

        match &self.parent {
            Some(parent) => parent.resolve_property_value_at(key, depth),
            None => Ok(None),
        }
    }

    /// Returns `text` unchanged, unless it's a `${key}` placeholder - then returns the resolved
    /// property value.
    pub fn resolve_placeholder(&self, text: &str) -> Result<String, ContextError> {
        match placeholder_key(text) {
            Some(key) => {
                self.resolve_property_value(key)?
                    .ok_or_else(|| ContextError::UnresolvablePlaceholder {
                        placeholder: text.to_string(),
                    })
            }
            None => Ok(text.to_string()),
        }
    }

    /// Loads properties holders and initializes beans in dependency order. All failures are
    /// collected; a single one is returned as is, more as [ContextError::Composite].
    pub fn initialize(&self) -> Result<(), ContextError> {
        info!(
            context = %self.identifier,
            beans = self.beans.len(),
            properties = self.properties.len(),
            "Initializing context."
        );

        let mut errors = vec![];

        for holder in self.properties.values() {
            if let Err(error) = holder.initialize() {
                errors.push(error);
            }
        }

        for identifier in self
            .initialization_order
            .iter()
            .chain(self.beans.keys())
            .unique()
        {
            let Some(bean) = self.beans.get(identifier) else {
                continue;
            };

            debug!(bean = %identifier, "Initializing bean.");
            if let Err(error) = bean.initialize(self) {
                errors.push(error);
            }
        }

        match ContextError::aggregate(errors) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Invokes shutdown hooks of active beans. Activation threads are not interrupted.
    pub fn shutdown(&self) {
        info!(context = %self.identifier, "Shutting down context.");
        self.activation_group.shutdown();
    }

    /// Waits for all activation threads to finish and returns their outcomes.
    pub fn await_activations(&self) -> Vec<ActivationOutcome> {
        self.activation_group.await_termination()
    }

    fn closest_bean(&self, target: &TypeRef) -> Result<Option<BeanLookup<'_>>, ContextError> {
        let mut closest: Option<(usize, BeanLookup<'_>)> = None;

        for property in self.beans.values() {
            let bean = BeanLookup {
                context: self,
                property,
            };

            let Some(value_type) = bean.value_type()? else {
                continue;
            };

            let distance = type_distance(self, &value_type, target);
            if distance == UNRELATED {
                continue;
            }

            if closest
                .as_ref()
                .map(|(closest, _)| distance < *closest)
                .unwrap_or(true)
            {
                closest = Some((distance, bean));
            }
        }

        Ok(closest.map(|(_, bean)| bean))
    }
}

impl TypeLookup for Context {
    fn lookup_type(&self, name: &str) -> Option<TypeRef> {
        self.types
            .by_name(name)
            .or_else(|| {
                self.artifacts
                    .values()
                    .find_map(|artifact| artifact.registry().ok()?.by_name(name))
            })
            .or_else(|| {
                self.parent
                    .as_ref()
                    .and_then(|parent| parent.lookup_type(name))
            })
    }
}

impl BeanProvider for Context {
    fn get_bean_by_type(&self, type_name: &str) -> Result<Option<InstanceAnyPtr>, ContextError> {
        let target = self.require_type(type_name, &self.identifier)?;

        match self.closest_bean(&target)? {
            Some(bean) => bean.value_as(&target).map(Some),
            None => match &self.parent {
                Some(parent) => parent.get_bean_by_type(type_name),
                None => Ok(None),
            },
        }
    }

    fn get_bean(
        &self,
        identifier: &str,
        type_name: Option<&str>,
    ) -> Result<Option<InstanceAnyPtr>, ContextError> {
        let Some(bean) = self.get_bean_reference(identifier) else {
            return Ok(None);
        };

        match type_name {
            Some(type_name) => {
                let target = self.require_type(type_name, identifier)?;
                if bean.is_resolvable_as(&target)? {
                    bean.value_as(&target).map(Some)
                } else {
                    Ok(None)
                }
            }
            None => bean.value().map(Some),
        }
    }
}
