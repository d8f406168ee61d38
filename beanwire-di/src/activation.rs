//! Active beans run on dedicated threads after creation. Every context owns an
//! [ActivationGroup] supervising these threads: failures and panics are captured and logged,
//! shutdown hooks are invoked on [Context::shutdown](crate::context::Context::shutdown), and the
//! outcomes can be collected by joining the threads.

use crate::error::{ContextError, ErrorPtr};
use derivative::Derivative;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{Builder, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, info};

/// Capability of beans which can be run on their own thread.
pub trait Runnable: Send + Sync {
    fn run(&self) -> Result<(), ErrorPtr>;
}

/// A [Runnable] which can be asked to stop. Shutdown should be cooperative - threads are never
/// interrupted.
pub trait ActiveBean: Runnable {
    fn shutdown(&self);
}

/// Panic captured on an activation thread.
#[derive(Error, Debug, Clone)]
#[error("Activation panicked: {0}")]
pub struct ActivationPanic(pub String);

impl ActivationPanic {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<unknown>".to_string());

        Self(message)
    }
}

/// Result of a finished activation.
#[derive(Clone, Debug)]
pub struct ActivationOutcome {
    pub identifier: String,
    pub thread_name: String,
    pub result: Result<(), ErrorPtr>,
}

#[derive(Derivative)]
#[derivative(Debug)]
struct ActiveTask {
    identifier: String,
    thread_name: String,
    #[derivative(Debug = "ignore")]
    handle: Option<JoinHandle<Result<(), ErrorPtr>>>,
    #[derivative(Debug = "ignore")]
    shutdown: Option<Arc<dyn ActiveBean>>,
}

/// Supervisor of activation threads started for beans of a single context.
#[derive(Debug)]
pub struct ActivationGroup {
    name: String,
    tasks: Mutex<Vec<ActiveTask>>,
}

impl ActivationGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Mutex::new(vec![]),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `task` on a new thread named `thread_name`. The optional `shutdown` hook is invoked
    /// when the group is shut down.
    pub fn spawn<F>(
        &self,
        identifier: &str,
        thread_name: String,
        task: F,
        shutdown: Option<Arc<dyn ActiveBean>>,
    ) -> Result<(), ContextError>
    where
        F: FnOnce() -> Result<(), ErrorPtr> + Send + 'static,
    {
        let bean = identifier.to_string();
        let handle = Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let result = catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| {
                    Err(Arc::new(ActivationPanic::from_payload(payload)) as ErrorPtr)
                });

                match &result {
                    Ok(_) => debug!(bean = %bean, "Activation finished."),
                    Err(error) => error!(bean = %bean, %error, "Activation failed."),
                }

                result
            })
            .map_err(|error| ContextError::ActivationFailed {
                identifier: identifier.to_string(),
                source: Arc::new(error),
            })?;

        debug!(
            group = %self.name,
            bean = identifier,
            thread = %thread_name,
            "Started activation thread."
        );

        self.lock_tasks().push(ActiveTask {
            identifier: identifier.to_string(),
            thread_name,
            handle: Some(handle),
            shutdown,
        });

        Ok(())
    }

    /// Number of activations started in this group.
    pub fn len(&self) -> usize {
        self.lock_tasks().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of activation threads still running.
    pub fn running(&self) -> usize {
        self.lock_tasks()
            .iter()
            .filter(|task| {
                task.handle
                    .as_ref()
                    .map(|handle| !handle.is_finished())
                    .unwrap_or(false)
            })
            .count()
    }

    /// Invokes shutdown hooks of all active beans exposing one. Threads are not interrupted.
    pub fn shutdown(&self) {
        let hooks = self
            .lock_tasks()
            .iter()
            .filter_map(|task| {
                task.shutdown
                    .clone()
                    .map(|hook| (task.identifier.clone(), hook))
            })
            .collect::<Vec<_>>();

        info!(group = %self.name, hooks = hooks.len(), "Shutting down active beans.");

        // hooks must run without holding the task lock
        for (identifier, hook) in hooks {
            debug!(bean = %identifier, "Invoking shutdown hook.");
            hook.shutdown();
        }
    }

    /// Joins all activation threads not joined yet and returns their outcomes.
    pub fn await_termination(&self) -> Vec<ActivationOutcome> {
        let pending = self
            .lock_tasks()
            .iter_mut()
            .filter_map(|task| {
                task.handle.take().map(|handle| {
                    (task.identifier.clone(), task.thread_name.clone(), handle)
                })
            })
            .collect::<Vec<_>>();

        pending
            .into_iter()
            .map(|(identifier, thread_name, handle)| {
                let result = handle.join().unwrap_or_else(|payload| {
                    Err(Arc::new(ActivationPanic::from_payload(payload)) as ErrorPtr)
                });

                ActivationOutcome {
                    identifier,
                    thread_name,
                    result,
                }
            })
            .collect()
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<ActiveTask>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use crate::activation::{ActivationGroup, ActiveBean, Runnable};
    use crate::error::ErrorPtr;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[derive(Default)]
    struct Worker {
        stopped: AtomicBool,
    }

    impl Runnable for Worker {
        fn run(&self) -> Result<(), ErrorPtr> {
            while !self.stopped.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }

            Ok(())
        }
    }

    impl ActiveBean for Worker {
        fn shutdown(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn should_capture_outcomes() {
        let group = ActivationGroup::new("test");
        group
            .spawn("ok", "active-ok".to_string(), || Ok(()), None)
            .unwrap();
        group
            .spawn(
                "failing",
                "active-failing".to_string(),
                || Err(Arc::new(io::Error::new(io::ErrorKind::Other, "broken")) as ErrorPtr),
                None,
            )
            .unwrap();
        group
            .spawn(
                "panicking",
                "active-panicking".to_string(),
                || panic!("boom"),
                None,
            )
            .unwrap();

        let outcomes = group.await_termination();
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].result.is_ok());
        assert_eq!(outcomes[1].result.as_ref().unwrap_err().to_string(), "broken");
        assert_eq!(
            outcomes[2].result.as_ref().unwrap_err().to_string(),
            "Activation panicked: boom"
        );
        assert_eq!(outcomes[2].thread_name, "active-panicking");

        assert!(group.await_termination().is_empty());
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn should_invoke_shutdown_hooks() {
        let group = ActivationGroup::new("test");
        let worker = Arc::new(Worker::default());
        let runnable = worker.clone();

        group
            .spawn(
                "worker",
                "active-worker".to_string(),
                move || runnable.run(),
                Some(worker.clone() as Arc<dyn ActiveBean>),
            )
            .unwrap();

        group.shutdown();

        let outcomes = group.await_termination();
        assert!(outcomes[0].result.is_ok());
        assert!(worker.stopped.load(Ordering::SeqCst));
        assert_eq!(group.running(), 0);
    }
}
