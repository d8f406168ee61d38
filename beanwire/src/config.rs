//! Container configuration is retrieved from a [ContainerConfigProvider]. The
//! [Application](crate::application::Application) uses it to configure itself and to name the
//! root context.
//!
//! By default, the config is created with opinionated default values, which can then be
//! overwritten by a `beanwire.json` file or environment variables prefixed with `BEANWIRE_`.

use beanwire_di::ErrorPtr;
use config::{Config, ConfigError, Environment, File};
use derive_more::Constructor;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use std::error::Error;
use std::sync::Arc;

const CONFIG_ENV_PREFIX: &str = "BEANWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "beanwire.json";

fn convert_error<E: Error + Send + Sync + 'static>(error: E) -> ErrorPtr {
    Arc::new(error) as ErrorPtr
}

/// Container configuration which can be provided by a [ContainerConfigProvider].
#[non_exhaustive]
#[derive(Clone, Debug, Constructor, Eq, PartialEq)]
pub struct ContainerConfig {
    /// Should a default tracing logger be installed in the scope of the application.
    pub install_tracing_logger: bool,
    /// Identifier of the root context.
    pub context_name: String,
    /// Should shutting down wait for activation threads to finish.
    pub await_activations_on_shutdown: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            context_name: "root".to_string(),
            await_activations_on_shutdown: false,
        }
    }
}

impl From<OptionalContainerConfig> for ContainerConfig {
    fn from(value: OptionalContainerConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            context_name: value.context_name.unwrap_or(default.context_name),
            await_activations_on_shutdown: value
                .await_activations_on_shutdown
                .unwrap_or(default.await_activations_on_shutdown),
        }
    }
}

impl ContainerConfig {
    fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalContainerConfig>())
            .map(|config| config.into())
    }
}

/// Provider for [ContainerConfig].
#[cfg_attr(test, automock)]
pub trait ContainerConfigProvider {
    fn config(&self) -> Result<ContainerConfig, ErrorPtr>;
}

/// Provider reading the config from `beanwire.json` and the environment once, on creation.
#[derive(Clone, Debug)]
pub struct DefaultContainerConfigProvider {
    // cached init result
    config: Result<ContainerConfig, ErrorPtr>,
}

impl DefaultContainerConfigProvider {
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::init_from_environment().map_err(convert_error),
        }
    }
}

impl Default for DefaultContainerConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerConfigProvider for DefaultContainerConfigProvider {
    fn config(&self) -> Result<ContainerConfig, ErrorPtr> {
        self.config.clone()
    }
}

#[derive(Deserialize)]
struct OptionalContainerConfig {
    install_tracing_logger: Option<bool>,
    context_name: Option<String>,
    await_activations_on_shutdown: Option<bool>,
}
