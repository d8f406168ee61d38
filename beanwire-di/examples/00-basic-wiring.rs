use beanwire_di::builder::ContextBuilder;
use beanwire_di::definition::{ArgumentSpec, BeanSpec};
use beanwire_di::instance_provider::{InstancePtr, TypedBeanProvider};
use beanwire_di::register_type;
use beanwire_di::scope::ScopeKind;
use beanwire_di::types::{TypeDescriptor, TypeDescriptorBuilder};

// this is a capability we would like to use in our beans
trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

struct PoliteGreeter {
    greeting: String,
}

impl Greeter for PoliteGreeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {name}!", self.greeting)
    }
}

// this bean depends on any Greeter
struct Welcome {
    greeter: InstancePtr<dyn Greeter>,
    name: String,
}

// Rust has no runtime reflection, so every type taking part in wiring needs a descriptor with its
// constructors and generalizations
fn greeter() -> TypeDescriptor {
    TypeDescriptorBuilder::<dyn Greeter>::capability("Greeter").build()
}

fn polite_greeter() -> TypeDescriptor {
    TypeDescriptorBuilder::<PoliteGreeter>::class("PoliteGreeter")
        .constructor(&["String"], |arguments| {
            Ok(PoliteGreeter {
                greeting: arguments.value(0)?,
            })
        })
        .implements::<dyn Greeter, _>("Greeter", |greeter| {
            greeter as InstancePtr<dyn Greeter>
        })
        .build()
}

fn welcome() -> TypeDescriptor {
    TypeDescriptorBuilder::<Welcome>::class("Welcome")
        .constructor(&["Greeter", "String"], |arguments| {
            Ok(Welcome {
                greeter: arguments.capability(0)?,
                name: arguments.value(1)?,
            })
        })
        .build()
}

// descriptors registered statically are available in every default context
register_type!(greeter);
register_type!(polite_greeter);
register_type!(welcome);

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let context = ContextBuilder::new("basic")
        .with_bean(
            BeanSpec::new("greeter", "PoliteGreeter")
                .with_scope(ScopeKind::Singleton)
                .with_argument(ArgumentSpec::constant("Hello")),
        )
        // the greeter is passed by reference, while the name is coerced from a string
        .with_bean(
            BeanSpec::new("welcome", "Welcome")
                .with_argument(ArgumentSpec::reference("greeter"))
                .with_argument(ArgumentSpec::constant("world")),
        )
        .build()
        .expect("error building context");

    let welcome = context
        .bean::<Welcome>("welcome")
        .expect("error creating bean")
        .expect("missing bean");

    // prints "Hello, world!"
    println!("{}", welcome.greeter.greet(&welcome.name));

    // beans can also be looked up by any of their generalizations
    let greeter = context
        .capability::<dyn Greeter>("greeter", "Greeter")
        .expect("error creating bean")
        .expect("missing bean");

    // prints "Hello, beans!"
    println!("{}", greeter.greet("beans"));
}
