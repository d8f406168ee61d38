//! Core application framework functionality.

use crate::config::{ContainerConfig, ContainerConfigProvider, DefaultContainerConfigProvider};
use crate::runner::{ApplicationRunner, APPLICATION_RUNNER};
use beanwire_di::activation::ActivationOutcome;
use beanwire_di::builder::ContextBuilder;
use beanwire_di::context::Context;
use beanwire_di::instance_provider::{downcast_capability, InstancePtr};
use beanwire_di::type_registry::TypeLookup;
use beanwire_di::{ContextError, ErrorPtr};
use derive_more::Constructor;
use std::cmp::Reverse;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Error, Debug)]
pub enum ApplicationError {
    #[error("Error retrieving configuration: {0}")]
    ConfigurationError(ErrorPtr),
    #[error("Error assembling context: {0}")]
    ContextError(#[from] ContextError),
    #[error("Runner error: {0}")]
    RunnerError(ErrorPtr),
}

/// Main entrypoint for the application. Bootstraps the root context and runs
/// [ApplicationRunners](ApplicationRunner) found among its beans.
#[derive(Constructor)]
pub struct Application<CP: ContainerConfigProvider> {
    config_provider: CP,
}

/// Creates an [Application] configured from `beanwire.json` and the environment.
pub fn create_default() -> Application<DefaultContainerConfigProvider> {
    Application::new(DefaultContainerConfigProvider::new())
}

impl<CP: ContainerConfigProvider> Application<CP> {
    /// Builds the root context, customized by `configure`, and runs application runners. The
    /// context stays alive in the returned [RunningApplication], so active beans can continue
    /// their work.
    pub fn run<F>(&self, configure: F) -> Result<RunningApplication, ApplicationError>
    where
        F: FnOnce(ContextBuilder) -> ContextBuilder,
    {
        let config = self
            .config_provider
            .config()
            .map_err(ApplicationError::ConfigurationError)?;

        if config.install_tracing_logger {
            install_tracing_logger();
        }

        info!(context = %config.context_name, "Building root context...");

        let context = configure(ContextBuilder::new(config.context_name.clone())).build()?;
        let application = RunningApplication { context, config };

        info!("Searching for application runners...");

        let mut runners = collect_runners(&application.context)?;
        runners.sort_by_key(|runner| Reverse(runner.priority()));

        info!(runners = runners.len(), "Running application runners...");

        for runner in &runners {
            if let Err(error) = runner.run() {
                application.context.shutdown();
                return Err(ApplicationError::RunnerError(error));
            }
        }

        Ok(application)
    }
}

/// Application with a live root context.
pub struct RunningApplication {
    context: Arc<Context>,
    config: ContainerConfig,
}

impl RunningApplication {
    #[inline]
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    #[inline]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Shuts down the context. Activation outcomes are returned only when configured to await
    /// activations on shutdown.
    pub fn shutdown(self) -> Vec<ActivationOutcome> {
        self.context.shutdown();

        if self.config.await_activations_on_shutdown {
            info!("Awaiting active beans...");
            self.context.await_activations()
        } else {
            vec![]
        }
    }
}

fn collect_runners(
    context: &Context,
) -> Result<Vec<InstancePtr<dyn ApplicationRunner>>, ContextError> {
    let Some(runner_type) = context.lookup_type(APPLICATION_RUNNER) else {
        debug!("Runner capability is not registered - skipping runners.");
        return Ok(vec![]);
    };

    let mut runners = vec![];
    for identifier in context.bean_identifiers() {
        let Some(bean) = context.get_bean_reference(identifier) else {
            continue;
        };

        if !bean.is_resolvable_as(&runner_type)? {
            continue;
        }

        if let Some(runner) =
            downcast_capability::<dyn ApplicationRunner>(bean.value_as(&runner_type)?)
        {
            debug!(bean = %identifier, "Found application runner.");
            runners.push(runner);
        }
    }

    Ok(runners)
}

fn install_tracing_logger() {
    if tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .is_err()
    {
        debug!("Global tracing subscriber already installed.");
    }
}

#[cfg(test)]
mod tests {
    use crate::application::{Application, ApplicationError};
    use crate::config::{ContainerConfig, MockContainerConfigProvider};
    use crate::runner::{
        runner_descriptor, ApplicationRunner, MockApplicationRunner, APPLICATION_RUNNER,
    };
    use beanwire_di::definition::BeanSpec;
    use beanwire_di::instance_provider::{capability_instance, InstanceAnyPtr, InstancePtr};
    use beanwire_di::type_registry::TypeRegistry;
    use beanwire_di::ErrorPtr;
    use std::sync::{Arc, Mutex};
    use thiserror::Error;

    #[derive(Error, Debug)]
    #[error("runner failure")]
    struct RunnerFailure;

    fn config_provider() -> MockContainerConfigProvider {
        let mut provider = MockContainerConfigProvider::new();
        provider
            .expect_config()
            .times(1)
            .returning(|| Ok(ContainerConfig::new(false, "test".to_string(), true)));
        provider
    }

    fn recording_runner(priority: i8, runs: &Arc<Mutex<Vec<i8>>>) -> MockApplicationRunner {
        let runs = runs.clone();
        let mut runner = MockApplicationRunner::new();
        runner.expect_priority().return_const(priority);
        runner.expect_run().times(1).returning(move || {
            runs.lock().unwrap().push(priority);
            Ok(())
        });
        runner
    }

    fn as_runner(runner: MockApplicationRunner) -> InstanceAnyPtr {
        capability_instance(InstancePtr::new(runner) as InstancePtr<dyn ApplicationRunner>)
    }

    #[test]
    fn should_return_configuration_error() {
        let mut provider = MockContainerConfigProvider::new();
        provider
            .expect_config()
            .times(1)
            .returning(|| Err(Arc::new(RunnerFailure) as ErrorPtr));

        let application = Application::new(provider);
        assert!(matches!(
            application.run(|builder| builder),
            Err(ApplicationError::ConfigurationError(_))
        ));
    }

    #[test]
    fn should_return_context_error() {
        let application = Application::new(config_provider());
        assert!(matches!(
            application.run(|builder| builder.with_bean(BeanSpec::new("broken", "Missing"))),
            Err(ApplicationError::ContextError(_))
        ));
    }

    #[test]
    fn should_run_runners_by_priority() {
        let runs = Arc::new(Mutex::new(vec![]));
        let low = recording_runner(-5, &runs);
        let high = recording_runner(10, &runs);
        let default = recording_runner(0, &runs);

        let application = Application::new(config_provider());
        let running = application
            .run(|builder| {
                builder
                    .with_type_registry(TypeRegistry::new().with(runner_descriptor()))
                    .with_external_bean("a", as_runner(low), APPLICATION_RUNNER)
                    .with_external_bean("b", as_runner(high), APPLICATION_RUNNER)
                    .with_external_bean("c", as_runner(default), APPLICATION_RUNNER)
            })
            .unwrap();

        assert_eq!(*runs.lock().unwrap(), vec![10, 0, -5]);
        assert_eq!(running.context().identifier(), "test");
        assert!(running.shutdown().is_empty());
    }

    #[test]
    fn should_stop_at_runner_error() {
        let mut failing = MockApplicationRunner::new();
        failing.expect_priority().return_const(1_i8);
        failing
            .expect_run()
            .times(1)
            .returning(|| Err(Arc::new(RunnerFailure) as ErrorPtr));

        let mut skipped = MockApplicationRunner::new();
        skipped.expect_priority().return_const(0_i8);
        skipped.expect_run().never();

        let application = Application::new(config_provider());
        assert!(matches!(
            application.run(|builder| {
                builder
                    .with_type_registry(TypeRegistry::new().with(runner_descriptor()))
                    .with_external_bean("failing", as_runner(failing), APPLICATION_RUNNER)
                    .with_external_bean("skipped", as_runner(skipped), APPLICATION_RUNNER)
            }),
            Err(ApplicationError::RunnerError(_))
        ));
    }

    #[test]
    fn should_skip_runners_without_registered_capability() {
        let application = Application::new(config_provider());
        let running = application
            .run(|builder| builder.with_type_registry(TypeRegistry::new()))
            .unwrap();

        assert_eq!(running.context().bean_identifiers().count(), 0);
    }
}
