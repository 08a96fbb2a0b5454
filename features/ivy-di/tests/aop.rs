mod common;

use std::sync::Arc;

use common::Events;
use ivy_di::{
    AdviceBinding, AdviceChainError, ComponentDescriptor, Container, DynError, JoinPoint,
    MethodSignature, Pointcut, Proxy, Value,
};

trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> Result<String, DynError>;
    fn fail(&self) -> Result<(), DynError>;
}

struct EnglishGreeter {
    events: Arc<Events>,
}

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> Result<String, DynError> {
        self.events.push("real");
        Ok(format!("Hello, {name}"))
    }

    fn fail(&self) -> Result<(), DynError> {
        self.events.push("real");
        Err("greeting failed".into())
    }
}

impl Greeter for Proxy<EnglishGreeter> {
    fn greet(&self, name: &str) -> Result<String, DynError> {
        let args = vec![Value::new(name.to_owned())];
        Ok(self.invoke("greet", args, |target| target.greet(name))?)
    }

    fn fail(&self) -> Result<(), DynError> {
        Ok(self.invoke("fail", vec![], |target| target.fail())?)
    }
}

const GREETER: &[MethodSignature] = &[
    MethodSignature::new("greet").tagged(&["to_log"]),
    MethodSignature::new("fail"),
];

fn start(events: &Events, bindings: Vec<AdviceBinding>) -> Container {
    let mut builder = Container::builder()
        .add_instance("events", events.clone())
        .add_component(
            ComponentDescriptor::builder::<EnglishGreeter>("greeter")
                .constructor(|events: Arc<Events>| EnglishGreeter { events })
                .exposes_advised::<dyn Greeter>(
                    GREETER,
                    |greeter| greeter as Arc<dyn Greeter>,
                    |proxy| proxy as Arc<dyn Greeter>,
                )
                .build(),
        );
    for binding in bindings {
        builder = builder.add_advice(binding);
    }
    builder.start().unwrap()
}

#[test]
fn before_real_after_in_order() {
    let events = Events::default();
    let (before, after) = (events.clone(), events.clone());
    let binding = AdviceBinding::new("tracing", Pointcut::method("greet"))
        .before(move |join_point| {
            before.push(format!("before {}", join_point.arg::<String>(0).unwrap()));
            Ok(())
        })
        .after(move |_, value| {
            after.push(format!("after {}", value.downcast_ref::<String>().unwrap()));
            Ok(())
        });

    let greeter = start(&events, vec![binding]).get::<dyn Greeter>().unwrap();
    assert_eq!(greeter.greet("Koko").unwrap(), "Hello, Koko");
    assert_eq!(
        events.entries(),
        vec!["before Koko", "real", "after Hello, Koko"]
    );
}

#[test]
fn around_without_proceed_short_circuits() {
    let events = Events::default();
    let binding = AdviceBinding::new("cache", Pointcut::annotated("to_log"))
        .around(|_| Ok(Value::new(String::from("cached"))));

    let greeter = start(&events, vec![binding]).get::<dyn Greeter>().unwrap();
    assert_eq!(greeter.greet("Koko").unwrap(), "cached");
    assert!(events.entries().is_empty());
}

#[test]
fn unmatched_component_is_not_proxied() {
    let events = Events::default();
    let binding = AdviceBinding::new("elsewhere", Pointcut::component("someoneElse"))
        .before(|_| Err("must not run".into()));
    let container = start(&events, vec![binding]);

    let capability = container.get::<dyn Greeter>().unwrap();
    let concrete = container.get::<EnglishGreeter>().unwrap();
    assert_eq!(
        Arc::as_ptr(&capability) as *const (),
        Arc::as_ptr(&concrete) as *const ()
    );
    assert!(capability.greet("Miki").is_ok());
}

#[test]
fn advised_capability_is_a_proxy_around_the_same_target() {
    let events = Events::default();
    let binding = AdviceBinding::new("any", Pointcut::any()).before(|_| Ok(()));
    let container = start(&events, vec![binding]);

    let capability = container.get::<dyn Greeter>().unwrap();
    let concrete = container.get::<EnglishGreeter>().unwrap();
    assert_ne!(
        Arc::as_ptr(&capability) as *const (),
        Arc::as_ptr(&concrete) as *const ()
    );
    assert!(Arc::ptr_eq(
        &capability,
        &container.get::<dyn Greeter>().unwrap()
    ));
}

#[test]
fn proceeding_twice_is_an_error() {
    let events = Events::default();
    let binding = AdviceBinding::new("greedy", Pointcut::method("greet")).around(|join_point| {
        join_point.proceed()?;
        join_point.proceed()
    });

    let greeter = start(&events, vec![binding]).get::<dyn Greeter>().unwrap();
    let error = greeter.greet("Koko").unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AdviceChainError>(),
        Some(AdviceChainError::AlreadyProceeded("greet"))
    ));
    assert_eq!(events.entries(), vec!["real"]);
}

#[test]
fn substitute_of_the_wrong_type_is_rejected() {
    let events = Events::default();
    let binding =
        AdviceBinding::new("broken", Pointcut::method("greet")).around(|_| Ok(Value::new(42_u32)));

    let greeter = start(&events, vec![binding]).get::<dyn Greeter>().unwrap();
    let error = greeter.greet("Koko").unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AdviceChainError>(),
        Some(AdviceChainError::ReturnTypeMismatch {
            actual_type: "u32",
            ..
        })
    ));
}

#[test]
fn failures_are_observed_but_never_swallowed() {
    let events = Events::default();
    let (observed, after) = (events.clone(), events.clone());
    let binding = AdviceBinding::new("errors", Pointcut::method("fail"))
        .after_throwing(move |join_point, error| {
            observed.push(format!("{} threw {error}", join_point.method().name()))
        })
        .after(move |_, _| {
            after.push("after");
            Ok(())
        });

    let greeter = start(&events, vec![binding]).get::<dyn Greeter>().unwrap();
    let error = greeter.fail().unwrap_err();
    assert!(error.to_string().contains("greeting failed"));
    assert_eq!(events.entries(), vec!["real", "fail threw greeting failed"]);
}

#[test]
fn failing_before_aborts_the_call() {
    let events = Events::default();
    let binding = AdviceBinding::new("security", Pointcut::any())
        .before(|_| Err("not authorized".into()));

    let greeter = start(&events, vec![binding]).get::<dyn Greeter>().unwrap();
    let error = greeter.greet("Koko").unwrap_err();
    assert!(error.to_string().contains("not authorized"));
    assert!(events.entries().is_empty());
}

fn wrapping(
    label: &'static str,
    events: &Events,
) -> impl Fn(&mut JoinPoint<'_>) -> Result<Value, DynError> + Send + Sync + 'static {
    let events = events.clone();
    move |join_point| {
        events.push(format!("{label} in"));
        let result = join_point.proceed();
        events.push(format!("{label} out"));
        result
    }
}

#[test]
fn lower_order_runs_outermost() {
    let events = Events::default();
    let inner = AdviceBinding::new("inner", Pointcut::any())
        .with_order(5)
        .around(wrapping("inner", &events));
    let outer = AdviceBinding::new("outer", Pointcut::any())
        .with_order(-5)
        .around(wrapping("outer", &events));

    let greeter = start(&events, vec![inner, outer]).get::<dyn Greeter>().unwrap();
    greeter.greet("Koko").unwrap();
    assert_eq!(
        events.entries(),
        vec!["outer in", "inner in", "real", "inner out", "outer out"]
    );
}

#[test]
fn join_point_exposes_the_call() {
    let events = Events::default();
    let seen = events.clone();
    let binding = AdviceBinding::new("inspect", Pointcut::within::<dyn Greeter>()).before(
        move |join_point| {
            let target = join_point.target::<EnglishGreeter>().map(|_| "EnglishGreeter");
            seen.push(format!(
                "{} {} {:?} {}",
                join_point.component(),
                join_point.method().name(),
                target,
                join_point.method().has_tag("to_log")
            ));
            Ok(())
        },
    );

    let greeter = start(&events, vec![binding]).get::<dyn Greeter>().unwrap();
    greeter.greet("Koko").unwrap();
    assert_eq!(
        events.entries()[0],
        "greeter greet Some(\"EnglishGreeter\") true"
    );
}
