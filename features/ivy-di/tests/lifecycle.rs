mod common;

use std::{
    sync::{Arc, Barrier},
    thread,
};

use common::Events;
use ivy_di::{ComponentDescriptor, Container, ContainerConfig, ResolveError};

struct Database {
    events: Arc<Events>,
}

struct Repository {
    #[allow(dead_code)]
    database: Arc<Database>,
}

fn database() -> ComponentDescriptor {
    ComponentDescriptor::builder::<Database>("database")
        .constructor(|events: Arc<Events>| {
            events.push("database created");
            Database { events }
        })
        .on_init(|database: &Database| {
            database.events.push("database initialized");
            Ok::<_, ivy_di::DynError>(())
        })
        .on_destroy(|database: &Database| database.events.push("database destroyed"))
        .build()
}

fn repository() -> ComponentDescriptor {
    ComponentDescriptor::builder::<Repository>("repository")
        .constructor(|database: Arc<Database>| Repository { database })
        .on_destroy(|repository: &Repository| {
            repository.database.events.push("repository destroyed")
        })
        .build()
}

#[test]
fn stop_destroys_in_reverse_construction_order() {
    let events = Events::default();
    let container = Container::builder()
        .add_instance("events", events.clone())
        .add_component(repository())
        .add_component(database())
        .start()
        .unwrap();

    assert!(container.is_built("database") && container.is_built("repository"));
    container.stop();
    container.stop();

    assert_eq!(
        events.entries(),
        vec![
            "database created",
            "database initialized",
            "repository destroyed",
            "database destroyed",
        ]
    );
    assert!(!container.is_running());
    assert!(!container.is_built("database"));
    assert!(matches!(
        container.get::<Database>(),
        Err(ResolveError::Stopped)
    ));
}

#[test]
fn lazy_singletons_wait_for_the_first_request() {
    let events = Events::default();
    let container = Container::builder()
        .add_instance("events", events.clone())
        .add_component(
            ComponentDescriptor::builder::<Database>("database")
                .constructor(|events: Arc<Events>| {
                    events.push("database created");
                    Database { events }
                })
                .lazy()
                .build(),
        )
        .start()
        .unwrap();

    assert!(!container.is_built("database"));
    assert!(events.entries().is_empty());
    container.get::<Database>().unwrap();
    assert!(container.is_built("database"));
    assert_eq!(events.entries(), vec!["database created"]);
}

#[test]
fn failing_init_is_a_factory_failure() {
    let error = Container::builder()
        .add_instance("events", Events::default())
        .add_component(
            ComponentDescriptor::builder::<Database>("database")
                .constructor(|events: Arc<Events>| Database { events })
                .on_init(|_: &Database| Err("cannot connect"))
                .build(),
        )
        .start()
        .unwrap_err();

    let ResolveError::FactoryFailed { component, error } = &error.failures[0].error else {
        panic!("expected a factory failure");
    };
    assert_eq!(component, "database");
    assert_eq!(error.to_string(), "cannot connect");
}

#[test]
fn startup_reports_every_failure() {
    let error = Container::builder()
        .add_instance("events", Events::default())
        .add_instance("events", Events::default())
        .add_component(repository())
        .add_component(
            ComponentDescriptor::builder::<String>("broken")
                .factory(|_| Err::<String, _>("no value"))
                .build(),
        )
        .start()
        .unwrap_err();

    assert_eq!(error.failures.len(), 3);
    assert!(matches!(
        error.failures[0].error,
        ResolveError::DuplicateName(_)
    ));
    assert!(matches!(
        error.failures[1].error,
        ResolveError::TypeNotFound(_)
    ));
    assert_eq!(error.components(), vec!["events", "repository", "broken"]);
    let rendered = error.to_string();
    assert!(rendered.starts_with("The container failed to start with 3 error(s):"));
    assert_eq!(rendered.lines().count(), 4);
}

#[test]
fn graph_validation_covers_lazy_components() {
    let lazy_repository = ComponentDescriptor::builder::<Repository>("repository")
        .constructor(|database: Arc<Database>| Repository { database })
        .lazy()
        .build();

    let container = Container::start(vec![lazy_repository], vec![]).unwrap();
    assert!(container.validate().is_err());

    let lazy_repository = ComponentDescriptor::builder::<Repository>("repository")
        .constructor(|database: Arc<Database>| Repository { database })
        .lazy()
        .build();
    let error = Container::start_with(
        ContainerConfig::default().with_graph_validation(true),
        vec![lazy_repository],
        vec![],
    )
    .unwrap_err();
    assert_eq!(error.components(), vec!["repository"]);
    assert!(matches!(
        error.failures[0].error,
        ResolveError::TypeNotFound(_)
    ));
}

#[test]
fn late_registration_builds_eagerly_and_rolls_back() {
    let events = Events::default();
    let container = Container::builder()
        .add_instance("events", events.clone())
        .start()
        .unwrap();

    let error = container.register_late(repository()).unwrap_err();
    assert!(matches!(error, ResolveError::TypeNotFound(_)));
    assert!(!container.contains("repository"));

    container.register_late(database()).unwrap();
    assert!(container.is_built("database"));
    assert!(matches!(
        container.register_late(database()),
        Err(ResolveError::DuplicateName(_))
    ));

    container.register_late(repository()).unwrap();
    assert_eq!(
        container.component_names(),
        vec!["events", "database", "repository"]
    );
}

#[test]
fn optional_dependencies_and_lookups() {
    struct Auditor {
        database: Option<Arc<Database>>,
    }

    let container = Container::builder()
        .add_component(
            ComponentDescriptor::builder::<Auditor>("auditor")
                .constructor(|database: Option<Arc<Database>>| Auditor { database })
                .build(),
        )
        .start()
        .unwrap();

    assert!(container.get::<Auditor>().unwrap().database.is_none());
    assert!(container.try_get::<Database>().unwrap().is_none());
    assert!(matches!(
        container.get_by_name("nothing"),
        Err(ResolveError::NameNotFound(_))
    ));
    assert!(container
        .get_by_name("auditor")
        .unwrap()
        .downcast::<Auditor>()
        .is_ok());
    assert!(matches!(
        container.get_named::<Database>("auditor"),
        Err(ResolveError::TypeMismatch { .. })
    ));
}

#[test]
fn lookup_racing_stop_is_destroyed_and_refused() {
    let events = Events::default();
    let gate = Arc::new((Barrier::new(2), Barrier::new(2)));
    let held = gate.clone();
    let container = Container::builder()
        .with_config(ContainerConfig::lazy())
        .add_instance("events", events.clone())
        .add_component(
            ComponentDescriptor::builder::<Database>("database")
                .constructor(move |events: Arc<Events>| {
                    held.0.wait();
                    held.1.wait();
                    Database { events }
                })
                .on_destroy(|database: &Database| database.events.push("database destroyed"))
                .build(),
        )
        .start()
        .unwrap();

    let lookup = {
        let container = container.clone();
        thread::spawn(move || container.get::<Database>().map(drop))
    };
    gate.0.wait();
    container.stop();
    gate.1.wait();

    assert!(matches!(lookup.join().unwrap(), Err(ResolveError::Stopped)));
    assert_eq!(events.entries(), vec!["database destroyed"]);
    assert!(!container.is_built("database"));
}
