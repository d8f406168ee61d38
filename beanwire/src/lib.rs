//! Application bootstrap for [beanwire_di] contexts.
//!
//! Wiring beans declaratively still requires an entrypoint which reads configuration, sets up
//! logging, builds the root context and runs the actual business logic. This crate provides such
//! entrypoint in the form of [Application](application::Application). Business logic is placed
//! in beans exposing the [ApplicationRunner](runner::ApplicationRunner) capability, which are run
//! by priority once the context is built.
//!
//! ```no_run
//! use beanwire::application;
//! use beanwire_di::definition::BeanSpec;
//!
//! let running = application::create_default()
//!     .run(|builder| builder.with_bean(BeanSpec::new("worker", "Worker").active()))
//!     .expect("error starting application");
//!
//! for outcome in running.shutdown() {
//!     println!("{} finished with {:?}", outcome.identifier, outcome.result);
//! }
//! ```

pub mod application;
pub mod config;
pub mod runner;
