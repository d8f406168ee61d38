use beanwire_di::activation::{ActiveBean, Runnable};
use beanwire_di::builder::ContextBuilder;
use beanwire_di::definition::{ArgumentSpec, BeanSpec};
use beanwire_di::error::ErrorPtr;
use beanwire_di::instance_provider::InstancePtr;
use beanwire_di::scope::ScopeKind;
use beanwire_di::type_registry::builtin::{ACTIVE_BEAN, RUNNABLE};
use beanwire_di::type_registry::TypeRegistry;
use beanwire_di::types::TypeDescriptorBuilder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

// active beans run on their own threads right after they are created
struct Ticker {
    interval: u64,
    stopped: AtomicBool,
}

impl Runnable for Ticker {
    fn run(&self) -> Result<(), ErrorPtr> {
        while !self.stopped.load(Ordering::SeqCst) {
            println!("tick");
            thread::sleep(Duration::from_millis(self.interval));
        }

        Ok(())
    }
}

// implementing ActiveBean allows the context to ask the bean to stop
impl ActiveBean for Ticker {
    fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // types can also be registered explicitly, instead of statically
    let types = TypeRegistry::new().with(
        TypeDescriptorBuilder::<Ticker>::class("Ticker")
            .constructor(&["u64"], |arguments| {
                Ok(Ticker {
                    interval: arguments.value(0)?,
                    stopped: AtomicBool::new(false),
                })
            })
            .implements::<dyn Runnable, _>(RUNNABLE, |ticker| ticker as InstancePtr<dyn Runnable>)
            .implements::<dyn ActiveBean, _>(ACTIVE_BEAN, |ticker| {
                ticker as InstancePtr<dyn ActiveBean>
            })
            .build(),
    );

    let context = ContextBuilder::new("active")
        .with_type_registry(types)
        .with_bean(
            BeanSpec::new("ticker", "Ticker")
                .with_scope(ScopeKind::Singleton)
                .with_argument(ArgumentSpec::constant("50"))
                .active(),
        )
        .build()
        .expect("error building context");

    thread::sleep(Duration::from_millis(200));

    // shutdown only signals active beans - awaiting waits for their threads to finish
    context.shutdown();
    for outcome in context.await_activations() {
        println!("{} finished: {:?}", outcome.thread_name, outcome.result);
    }
}
