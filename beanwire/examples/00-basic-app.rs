use beanwire::application;
use beanwire::runner::{ApplicationRunner, APPLICATION_RUNNER};
use beanwire_di::definition::BeanSpec;
use beanwire_di::instance_provider::InstancePtr;
use beanwire_di::register_type;
use beanwire_di::types::{TypeDescriptor, TypeDescriptorBuilder};
use beanwire_di::ErrorPtr;

// this is an application runner, which will run when the application starts; the application
// will find it among the beans of the root context
struct HelloWorldRunner;

impl ApplicationRunner for HelloWorldRunner {
    fn run(&self) -> Result<(), ErrorPtr> {
        println!("Hello world!");
        Ok(())
    }
}

fn hello_world_runner() -> TypeDescriptor {
    TypeDescriptorBuilder::<HelloWorldRunner>::class("HelloWorldRunner")
        .constructor(&[], |_| Ok(HelloWorldRunner))
        .implements::<dyn ApplicationRunner, _>(APPLICATION_RUNNER, |runner| {
            runner as InstancePtr<dyn ApplicationRunner>
        })
        .build()
}

register_type!(hello_world_runner);

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // create our application, configured from "beanwire.json" and BEANWIRE_ env variables
    let application = application::create_default();

    // prints "Hello world!"
    let running = application
        .run(|builder| builder.with_bean(BeanSpec::new("runner", "HelloWorldRunner")))
        .expect("error running application");

    running.shutdown();
}
