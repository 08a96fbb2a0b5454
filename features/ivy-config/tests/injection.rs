use std::sync::Arc;

use ivy_config::{Config, ConfigProvider};
use ivy_di::{ComponentDescriptor, Container, ResolveError};

#[derive(Debug, Clone)]
struct MailConfig {
    sender: String,
}

struct Mailer {
    sender: String,
}

fn mailer() -> ComponentDescriptor {
    ComponentDescriptor::builder::<Mailer>("mailer")
        .constructor(|config: Config<MailConfig>| Mailer {
            sender: config.sender.clone(),
        })
        .build()
}

#[test]
fn constructor_receives_the_registered_config() {
    let mut provider = ConfigProvider::new();
    provider
        .add_config(MailConfig {
            sender: "ivy@example.com".into(),
        })
        .unwrap();

    let container = Container::builder()
        .add_component(provider.into_descriptor())
        .add_component(mailer())
        .start()
        .unwrap();

    assert_eq!(container.get::<Mailer>().unwrap().sender, "ivy@example.com");
    let provider = container
        .get_named::<ConfigProvider>(ConfigProvider::COMPONENT_NAME)
        .unwrap();
    assert!(Arc::ptr_eq(
        &provider.get_config::<MailConfig>().unwrap(),
        &provider.get_config::<MailConfig>().unwrap()
    ));
}

#[test]
fn missing_config_fails_the_construction() {
    let error = Container::builder()
        .add_component(ConfigProvider::new().into_descriptor())
        .add_component(mailer())
        .start()
        .unwrap_err();

    let ResolveError::FactoryFailed { component, error } = &error.failures[0].error else {
        panic!("expected a factory failure");
    };
    assert_eq!(component, "mailer");
    assert!(error.to_string().contains("MailConfig"));
}

#[test]
fn missing_provider_is_a_missing_dependency() {
    let error = Container::builder()
        .add_component(mailer())
        .start()
        .unwrap_err();
    assert!(matches!(
        error.failures[0].error,
        ResolveError::TypeNotFound(_)
    ));
}
