//! Assembly of [Context]s from declarative [BeanSpec]s.

use crate::context::Context;
use crate::definition::{ArgumentSpec, BeanSpec, ResourceSpec};
use crate::error::ContextError;
use crate::factory::{BeanDefinition, BeanInstanceFactory};
use crate::holder::{
    ArtifactHolder, ArtifactLoaderPtr, FilePropertiesSource, PropertiesHolder,
    PropertiesSourcePtr, StaticArtifactLoader,
};
use crate::instance_provider::InstanceAnyPtr;
use crate::property::{
    BeanReference, ConstantProperty, ListProperty, PreresolvedBean, PropertiesReference,
    PropertyPtr, ReferencablePropertyPtr,
};
use crate::type_registry::TypeRegistry;
use derivative::Derivative;
use fxhash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

struct ExternalBean {
    identifier: String,
    instance: InstanceAnyPtr,
    type_name: String,
}

/// Builder for [Context] with sensible defaults: types are taken from the parent context or
/// collected from static registrations, properties are read from files and artifacts are
/// collected from static registrations.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ContextBuilder {
    identifier: String,
    types: Option<TypeRegistry>,
    parent: Option<Arc<Context>>,
    beans: Vec<BeanSpec>,
    properties: Vec<ResourceSpec>,
    artifacts: Vec<ResourceSpec>,
    #[derivative(Debug = "ignore")]
    external_beans: Vec<ExternalBean>,
    #[derivative(Debug = "ignore")]
    properties_source: PropertiesSourcePtr,
    #[derivative(Debug = "ignore")]
    artifact_loader: ArtifactLoaderPtr,
}

impl ContextBuilder {
    /// Creates a new builder with a default configuration.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            types: None,
            parent: None,
            beans: vec![],
            properties: vec![],
            artifacts: vec![],
            external_beans: vec![],
            properties_source: Arc::new(FilePropertiesSource),
            artifact_loader: Arc::new(StaticArtifactLoader),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Sets the ambient type registry.
    pub fn with_type_registry(mut self, types: TypeRegistry) -> Self {
        self.types = Some(types);
        self
    }

    pub fn with_parent(mut self, parent: Arc<Context>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_bean(mut self, bean: BeanSpec) -> Self {
        self.beans.push(bean);
        self
    }

    pub fn with_beans(mut self, beans: impl IntoIterator<Item = BeanSpec>) -> Self {
        self.beans.extend(beans);
        self
    }

    /// Adds a properties holder.
    pub fn with_properties(mut self, properties: ResourceSpec) -> Self {
        self.properties.push(properties);
        self
    }

    /// Adds an artifact with an isolated type registry.
    pub fn with_artifact(mut self, artifact: ResourceSpec) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Adds an instance created outside of the container as a bean of given type.
    pub fn with_external_bean(
        mut self,
        identifier: impl Into<String>,
        instance: InstanceAnyPtr,
        type_name: impl Into<String>,
    ) -> Self {
        self.external_beans.push(ExternalBean {
            identifier: identifier.into(),
            instance,
            type_name: type_name.into(),
        });
        self
    }

    pub fn with_properties_source(mut self, properties_source: PropertiesSourcePtr) -> Self {
        self.properties_source = properties_source;
        self
    }

    pub fn with_artifact_loader(mut self, artifact_loader: ArtifactLoaderPtr) -> Self {
        self.artifact_loader = artifact_loader;
        self
    }

    /// Assembles the context without initializing it.
    pub fn assemble(self) -> Result<Arc<Context>, ContextError> {
        let types = match (self.types, &self.parent) {
            (Some(types), _) => Arc::new(types),
            (None, Some(parent)) => parent.type_registry().clone(),
            (None, None) => Arc::new(TypeRegistry::from_static()),
        };

        let mut context = Context::new(self.identifier, self.parent, types);

        for properties in self.properties {
            let identifier = properties.identifier.clone();
            if !context.register_properties(PropertiesHolder::new(
                properties.identifier,
                properties.locator,
                self.properties_source.clone(),
            )) {
                warn!(identifier = %identifier, "Ignoring duplicate properties declaration.");
            }
        }

        for artifact in self.artifacts {
            let identifier = artifact.identifier.clone();
            if !context.register_artifact(ArtifactHolder::new(
                artifact.identifier,
                artifact.locator,
                self.artifact_loader.clone(),
            )) {
                warn!(identifier = %identifier, "Ignoring duplicate artifact declaration.");
            }
        }

        let mut graph = DependencyGraph::default();

        for bean in self.external_beans {
            let value_type = context.require_type(&bean.type_name, &bean.identifier)?;
            let property = Arc::new(PreresolvedBean::new(
                bean.identifier.clone(),
                bean.instance,
                value_type,
            ));

            if context.register_bean(property) {
                graph.add(bean.identifier, vec![]);
            } else {
                warn!(identifier = %bean.identifier, "Ignoring duplicate bean declaration.");
            }
        }

        for (index, bean) in self.beans.into_iter().enumerate() {
            let identifier = match &bean.identifier {
                Some(identifier) => context.resolve_placeholder(identifier)?,
                None => format!("{}#{index}", context.resolve_placeholder(&bean.type_name)?),
            };

            // nested beans of a discarded declaration must not be registered either
            if context.has_local_bean(&identifier) {
                warn!(identifier = %identifier, "Ignoring duplicate bean declaration.");
                continue;
            }

            let mut assembled = vec![];
            BeanAssembler {
                context: &context,
                assembled: &mut assembled,
            }
            .assemble_bean(identifier, bean)?;

            for AssembledBean {
                factory,
                dependencies,
            } in assembled
            {
                let identifier = factory.definition().identifier.clone();
                if context.register_bean(factory as ReferencablePropertyPtr) {
                    graph.add(identifier, dependencies);
                } else {
                    warn!(identifier = %identifier, "Ignoring duplicate bean declaration.");
                }
            }
        }

        let order = graph.initialization_order()?;
        debug!(context = context.identifier(), order = ?order, "Assembled context.");

        context.set_initialization_order(order);
        Ok(Arc::new(context))
    }

    /// Assembles and initializes the context.
    pub fn build(self) -> Result<Arc<Context>, ContextError> {
        let context = self.assemble()?;
        context.initialize()?;
        Ok(context)
    }
}

struct AssembledBean {
    factory: Arc<BeanInstanceFactory>,
    dependencies: Vec<String>,
}

// turns specs into factories, resolving placeholders against the context being assembled
struct BeanAssembler<'a> {
    context: &'a Context,
    assembled: &'a mut Vec<AssembledBean>,
}

impl BeanAssembler<'_> {
    fn assemble_bean(
        &mut self,
        identifier: String,
        bean: BeanSpec,
    ) -> Result<Arc<BeanInstanceFactory>, ContextError> {
        let definition = BeanDefinition {
            identifier: identifier.clone(),
            artifact: self.resolve_optional(bean.artifact)?,
            type_name: self.context.resolve_placeholder(&bean.type_name)?,
            factory_owner: self.resolve_optional(bean.factory_owner)?,
            factory_type: self.resolve_optional(bean.factory_type)?,
            factory_operation: self.resolve_optional(bean.factory_operation)?,
            lazy: bean.lazy,
            active: bean.active,
            activation_operation: self.resolve_optional(bean.activation_operation)?,
            init_operation: self.resolve_optional(bean.init_operation)?,
            finalize_operation: self.resolve_optional(bean.finalize_operation)?,
        };

        let mut dependencies = definition.factory_owner.iter().cloned().collect::<Vec<_>>();
        let arguments = bean
            .arguments
            .into_iter()
            .enumerate()
            .map(|(index, argument)| {
                self.create_argument(&identifier, index, argument, &mut dependencies)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let factory = Arc::new(BeanInstanceFactory::new(definition, bean.scope, arguments));
        self.assembled.push(AssembledBean {
            factory: factory.clone(),
            dependencies,
        });

        Ok(factory)
    }

    fn create_argument(
        &mut self,
        owner: &str,
        index: usize,
        argument: ArgumentSpec,
        dependencies: &mut Vec<String>,
    ) -> Result<PropertyPtr, ContextError> {
        let property: PropertyPtr = match argument {
            ArgumentSpec::Constant(value) => {
                Arc::new(ConstantProperty::new(self.context.resolve_placeholder(&value)?))
            }
            ArgumentSpec::BeanReference(identifier) => {
                let identifier = self.context.resolve_placeholder(&identifier)?;
                dependencies.push(identifier.clone());
                Arc::new(BeanReference::new(identifier))
            }
            ArgumentSpec::PropertiesReference(identifier) => Arc::new(PropertiesReference::new(
                self.context.resolve_placeholder(&identifier)?,
            )),
            ArgumentSpec::Bean(bean) => {
                let identifier = match &bean.identifier {
                    Some(identifier) => self.context.resolve_placeholder(identifier)?,
                    None => format!("{owner}#{index}"),
                };

                dependencies.push(identifier.clone());
                self.assemble_bean(identifier, *bean)?
            }
            ArgumentSpec::List(elements) => {
                let owner = format!("{owner}#{index}");
                let elements = elements
                    .into_iter()
                    .enumerate()
                    .map(|(index, element)| {
                        self.create_argument(&owner, index, element, dependencies)
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Arc::new(ListProperty::new(elements))
            }
        };

        Ok(property)
    }

    fn resolve_optional(&self, value: Option<String>) -> Result<Option<String>, ContextError> {
        value
            .map(|value| self.context.resolve_placeholder(&value))
            .transpose()
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

#[derive(Default)]
struct DependencyGraph {
    beans: Vec<(String, Vec<String>)>,
}

impl DependencyGraph {
    fn add(&mut self, identifier: String, dependencies: Vec<String>) {
        self.beans.push((identifier, dependencies));
    }

    /// Sorts beans so that dependencies come before their dependents, preserving declaration
    /// order otherwise. Identifiers without a local bean are skipped.
    fn initialization_order(&self) -> Result<Vec<String>, ContextError> {
        let edges: FxHashMap<&str, &[String]> = self
            .beans
            .iter()
            .map(|(identifier, dependencies)| (identifier.as_str(), dependencies.as_slice()))
            .collect();

        let mut visits = FxHashMap::default();
        let mut path = vec![];
        let mut order = vec![];

        for (identifier, _) in &self.beans {
            visit(identifier, &edges, &mut visits, &mut path, &mut order)?;
        }

        Ok(order)
    }
}

fn visit<'a>(
    identifier: &'a str,
    edges: &FxHashMap<&'a str, &'a [String]>,
    visits: &mut FxHashMap<&'a str, Visit>,
    path: &mut Vec<&'a str>,
    order: &mut Vec<String>,
) -> Result<(), ContextError> {
    match visits.get(identifier) {
        Some(Visit::Done) => return Ok(()),
        Some(Visit::InProgress) => {
            let start = path
                .iter()
                .position(|bean| *bean == identifier)
                .unwrap_or(0);

            return Err(ContextError::CircularReference {
                chain: path[start..]
                    .iter()
                    .copied()
                    .chain([identifier])
                    .map(str::to_string)
                    .collect(),
            });
        }
        None => {}
    }

    // unknown identifiers may be satisfied by the parent at runtime
    let Some(dependencies) = edges.get(identifier).copied() else {
        return Ok(());
    };

    visits.insert(identifier, Visit::InProgress);
    path.push(identifier);

    for dependency in dependencies {
        visit(dependency, edges, visits, path, order)?;
    }

    path.pop();
    visits.insert(identifier, Visit::Done);
    order.push(identifier.to_string());

    Ok(())
}
