use beanwire::application;
use beanwire::runner::{ApplicationRunner, APPLICATION_RUNNER};
use beanwire_di::definition::{ArgumentSpec, BeanSpec};
use beanwire_di::instance_provider::InstancePtr;
use beanwire_di::register_type;
use beanwire_di::types::{TypeDescriptor, TypeDescriptorBuilder};
use beanwire_di::ErrorPtr;

// a runner printing a message with a configurable priority
struct MessageRunner {
    message: String,
    priority: i8,
}

impl ApplicationRunner for MessageRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        println!("{}", self.message);
        Ok(())
    }

    // runners with higher priorities run first
    fn priority(&self) -> i8 {
        self.priority
    }
}

fn message_runner() -> TypeDescriptor {
    TypeDescriptorBuilder::<MessageRunner>::class("MessageRunner")
        .constructor(&["String", "i8"], |arguments| {
            Ok(MessageRunner {
                message: arguments.value(0)?,
                priority: arguments.value(1)?,
            })
        })
        .implements::<dyn ApplicationRunner, _>(APPLICATION_RUNNER, |runner| {
            runner as InstancePtr<dyn ApplicationRunner>
        })
        .build()
}

register_type!(message_runner);

fn runner(identifier: &str, message: &str, priority: &str) -> BeanSpec {
    BeanSpec::new(identifier, "MessageRunner")
        .with_argument(ArgumentSpec::constant(message))
        .with_argument(ArgumentSpec::constant(priority))
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // prints "First", then "Second", then "Third"
    application::create_default()
        .run(|builder| {
            builder
                .with_bean(runner("a", "Third", "-1"))
                .with_bean(runner("b", "First", "10"))
                .with_bean(runner("c", "Second", "0"))
        })
        .expect("error running application")
        .shutdown();
}
