//! Lazily loaded resources registered in a context: key/value [Properties] used to resolve
//! placeholders, and artifacts - isolated type registries for beans which should not see the
//! ambient types.
//!
//! Loading mechanics are hidden behind [PropertiesSource] and [ArtifactLoader]. Both holders load
//! their resource at most once; a failed load is remembered and reported again, never retried.

use crate::error::{ContextError, ErrorPtr};
use crate::type_registry::TypeRegistry;
use config::{Config, File, FileFormat, Map, Source, Value};
use derivative::Derivative;
use fxhash::FxHashMap;
#[cfg(test)]
use mockall::automock;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Key/value map loaded from a properties resource.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    #[inline]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Source of [Properties] for given locators.
#[cfg_attr(test, automock)]
pub trait PropertiesSource {
    fn load(&self, locator: &str) -> Result<Properties, ErrorPtr>;
}

pub type PropertiesSourcePtr = Arc<dyn PropertiesSource + Send + Sync>;

/// Reads properties from files using the `config` crate. The format is deduced from the file
/// extension; `.properties` files are read as ini. Nested tables are flattened into dotted keys.
/// An optional `file://` prefix is stripped from locators.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilePropertiesSource;

impl PropertiesSource for FilePropertiesSource {
    fn load(&self, locator: &str) -> Result<Properties, ErrorPtr> {
        let path = locator.strip_prefix("file://").unwrap_or(locator);
        let file = if path.ends_with(".properties") {
            File::new(path, FileFormat::Ini)
        } else {
            File::with_name(path)
        };

        let table = Config::builder()
            .add_source(file.required(true))
            .build()
            .and_then(|config| config.collect())
            .map_err(convert_error)?;

        let mut properties = Properties::default();
        flatten_into(&mut properties, None, table);

        Ok(properties)
    }
}

fn flatten_into(properties: &mut Properties, prefix: Option<&str>, table: Map<String, Value>) {
    for (key, value) in table {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };

        match value.clone().into_table() {
            Ok(nested) => flatten_into(properties, Some(&key), nested),
            Err(_) => {
                if let Ok(value) = value.into_string() {
                    properties.insert(key, value);
                }
            }
        }
    }
}

fn convert_error<E: Error + Send + Sync + 'static>(error: E) -> ErrorPtr {
    Arc::new(error)
}

/// In-memory properties, keyed by locator. Useful for programmatic configuration and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryPropertiesSource {
    resources: FxHashMap<String, Properties>,
}

impl MemoryPropertiesSource {
    pub fn with(mut self, locator: impl Into<String>, properties: Properties) -> Self {
        self.resources.insert(locator.into(), properties);
        self
    }
}

#[derive(thiserror::Error, Debug, Clone)]
#[error("Missing resource: {0}")]
pub struct MissingResource(pub String);

impl PropertiesSource for MemoryPropertiesSource {
    fn load(&self, locator: &str) -> Result<Properties, ErrorPtr> {
        self.resources
            .get(locator)
            .cloned()
            .ok_or_else(|| Arc::new(MissingResource(locator.to_string())) as ErrorPtr)
    }
}

/// Named, lazily loaded [Properties].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PropertiesHolder {
    identifier: String,
    locator: String,
    #[derivative(Debug = "ignore")]
    source: PropertiesSourcePtr,
    state: Mutex<Option<Result<Arc<Properties>, ContextError>>>,
}

impl PropertiesHolder {
    pub fn new(
        identifier: impl Into<String>,
        locator: impl Into<String>,
        source: PropertiesSourcePtr,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            locator: locator.into(),
            source,
            state: Mutex::new(None),
        }
    }

    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[inline]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Loads the properties, if not loaded yet.
    pub fn initialize(&self) -> Result<(), ContextError> {
        self.properties().map(|_| ())
    }

    /// Returns loaded properties, loading them on first access.
    pub fn properties(&self) -> Result<Arc<Properties>, ContextError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .get_or_insert_with(|| {
                debug!(
                    identifier = %self.identifier,
                    locator = %self.locator,
                    "Loading properties."
                );

                self.source
                    .load(&self.locator)
                    .map(Arc::new)
                    .map_err(|source| ContextError::PropertiesLoad {
                        identifier: self.identifier.clone(),
                        locator: self.locator.clone(),
                        source,
                    })
            })
            .clone()
    }

    pub fn property_value(&self, key: &str) -> Result<Option<String>, ContextError> {
        self.properties()
            .map(|properties| properties.get(key).map(str::to_string))
    }

    pub fn property_value_or(&self, key: &str, default: &str) -> Result<String, ContextError> {
        self.property_value(key)
            .map(|value| value.unwrap_or_else(|| default.to_string()))
    }
}

/// Loader of isolated type registries for artifacts.
#[cfg_attr(test, automock)]
pub trait ArtifactLoader {
    fn load(&self, locator: &str) -> Result<TypeRegistry, ErrorPtr>;
}

pub type ArtifactLoaderPtr = Arc<dyn ArtifactLoader + Send + Sync>;

/// Collects types statically registered for the artifact locator with
/// [register_type](crate::register_type).
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticArtifactLoader;

impl ArtifactLoader for StaticArtifactLoader {
    fn load(&self, locator: &str) -> Result<TypeRegistry, ErrorPtr> {
        Ok(TypeRegistry::for_artifact(locator))
    }
}

/// Named, lazily loaded isolated type registry.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ArtifactHolder {
    identifier: String,
    locator: String,
    #[derivative(Debug = "ignore")]
    loader: ArtifactLoaderPtr,
    #[derivative(Debug = "ignore")]
    registry: Mutex<Option<Result<Arc<TypeRegistry>, ContextError>>>,
}

impl ArtifactHolder {
    pub fn new(
        identifier: impl Into<String>,
        locator: impl Into<String>,
        loader: ArtifactLoaderPtr,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            locator: locator.into(),
            loader,
            registry: Mutex::new(None),
        }
    }

    #[inline]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[inline]
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Returns the artifact type registry, loading it on first access.
    pub fn registry(&self) -> Result<Arc<TypeRegistry>, ContextError> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry
            .get_or_insert_with(|| {
                debug!(
                    identifier = %self.identifier,
                    locator = %self.locator,
                    "Loading artifact."
                );

                self.loader
                    .load(&self.locator)
                    .map(Arc::new)
                    .map_err(|source| ContextError::ArtifactLoad {
                        identifier: self.identifier.clone(),
                        locator: self.locator.clone(),
                        source,
                    })
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ContextError, ErrorPtr};
    use crate::holder::{
        ArtifactHolder, FilePropertiesSource, MockArtifactLoader, MockPropertiesSource,
        Properties, PropertiesHolder, PropertiesSource,
    };
    use crate::type_registry::TypeRegistry;
    use crate::types::TypeDescriptorBuilder;
    use mockall::predicate::*;
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::Arc;

    #[test]
    fn should_load_properties_once() {
        let mut source = MockPropertiesSource::new();
        source
            .expect_load()
            .with(eq("app.json"))
            .times(1)
            .return_const(Ok(Properties::from_iter([("name", "app")])));

        let holder = PropertiesHolder::new("props", "app.json", Arc::new(source));
        holder.initialize().unwrap();
        holder.initialize().unwrap();

        assert_eq!(holder.property_value("name").unwrap().unwrap(), "app");
        assert!(holder.property_value("missing").unwrap().is_none());
        assert_eq!(holder.property_value_or("missing", "x").unwrap(), "x");
    }

    #[test]
    fn should_not_retry_failed_loads() {
        let mut source = MockPropertiesSource::new();
        source.expect_load().times(1).returning(|_| {
            Err(Arc::new(io::Error::new(io::ErrorKind::NotFound, "gone")) as ErrorPtr)
        });

        let holder = PropertiesHolder::new("props", "missing.json", Arc::new(source));
        assert!(matches!(
            holder.initialize(),
            Err(ContextError::PropertiesLoad { .. })
        ));
        assert!(holder.property_value("name").is_err());
    }

    #[test]
    fn should_load_artifact_once() {
        let mut loader = MockArtifactLoader::new();
        loader
            .expect_load()
            .with(eq("plugins/clock"))
            .times(1)
            .returning(|_| {
                Ok(TypeRegistry::new()
                    .with(TypeDescriptorBuilder::<u8>::class("Clock").build()))
            });

        let holder = ArtifactHolder::new("clock", "plugins/clock", Arc::new(loader));
        assert!(holder.registry().unwrap().by_name("Clock").is_some());
        assert!(holder.registry().unwrap().by_name("String").is_some());
    }

    #[test]
    fn should_read_flattened_files() {
        let directory = env::temp_dir().join(format!("beanwire-holder-{}", std::process::id()));
        fs::create_dir_all(&directory).unwrap();

        let json = directory.join("app.json");
        fs::write(&json, r#"{"server": {"port": 8080, "host": "localhost"}, "name": "app"}"#)
            .unwrap();

        let properties = FilePropertiesSource.load(json.to_str().unwrap()).unwrap();
        assert_eq!(properties.get("server.port"), Some("8080"));
        assert_eq!(properties.get("server.host"), Some("localhost"));
        assert_eq!(properties.get("name"), Some("app"));

        let ini = directory.join("app.properties");
        fs::write(&ini, "greeting=hello\n").unwrap();

        let properties = FilePropertiesSource
            .load(&format!("file://{}", ini.to_str().unwrap()))
            .unwrap();
        assert_eq!(properties.get("greeting"), Some("hello"));

        assert!(FilePropertiesSource
            .load(directory.join("missing.json").to_str().unwrap())
            .is_err());

        fs::remove_dir_all(&directory).unwrap();
    }
}
