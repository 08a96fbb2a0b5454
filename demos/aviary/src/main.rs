use std::sync::Arc;

use ivy_config::{Config, ConfigProvider};
use ivy_di::{
    AdviceBinding, ComponentDescriptor, Container, DynError, MethodSignature, Pointcut, Proxy,
    Value,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), DynError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    wiring()?;
    qualifiers()?;
    prototypes()?;
    comments()?;
    Ok(())
}

#[derive(Debug)]
struct Parrot {
    name: String,
}

#[derive(Debug)]
struct Person {
    name: String,
    parrot: Option<Arc<Parrot>>,
}

#[derive(Debug)]
struct AviaryConfig {
    keeper: String,
}

/// Constructor injection of a config, setter injection of the parrot
fn wiring() -> Result<(), DynError> {
    let mut provider = ConfigProvider::new();
    provider.add_config(AviaryConfig {
        keeper: "Ella".into(),
    })?;

    let container = Container::builder()
        .add_component(provider.into_descriptor())
        .add_instance(
            "parrot",
            Parrot {
                name: "Koko".into(),
            },
        )
        .add_component(
            ComponentDescriptor::builder::<Person>("person")
                .constructor(|config: Config<AviaryConfig>| Person {
                    name: config.keeper.clone(),
                    parrot: None,
                })
                .setter("parrot", |person: &mut Person, parrot: Arc<Parrot>| {
                    person.parrot = Some(parrot)
                })
                .build(),
        )
        .start()?;

    let person = container.get::<Person>()?;
    println!(
        "{} owns {:?}",
        person.name,
        person.parrot.as_ref().map(|parrot| parrot.name.as_str())
    );
    println!("{:?}", container);
    container.stop();
    Ok(())
}

fn parrot(component: &str, name: &'static str) -> ComponentDescriptor {
    ComponentDescriptor::builder::<Parrot>(component)
        .constructor(move || Parrot { name: name.into() })
        .build()
}

fn qualifiers() -> Result<(), DynError> {
    let container = Container::builder()
        .add_component(parrot("parrot1", "Koko"))
        .add_component(parrot("parrot2", "Miki"))
        .add_component(
            ComponentDescriptor::builder::<Person>("person")
                .constructor(|parrot: Arc<Parrot>| Person {
                    name: "Ella".into(),
                    parrot: Some(parrot),
                })
                .qualifier(0, "parrot2")
                .build(),
        )
        .start()?;

    if let Err(error) = container.get::<Parrot>() {
        println!("{error}");
    }
    let person = container.get::<Person>()?;
    println!(
        "qualified: {:?}",
        person.parrot.as_ref().map(|parrot| parrot.name.as_str())
    );

    container.register_late(
        ComponentDescriptor::builder::<Parrot>("parrot3")
            .constructor(|| Parrot {
                name: "Riki".into(),
            })
            .primary()
            .build(),
    )?;
    println!("primary: {}", container.get::<Parrot>()?.name);
    Ok(())
}

fn prototypes() -> Result<(), DynError> {
    let container = Container::builder()
        .add_component(
            ComponentDescriptor::builder::<Parrot>("parrot")
                .constructor(|| Parrot {
                    name: "Koko".into(),
                })
                .prototype()
                .build(),
        )
        .start()?;

    let first = container.get::<Parrot>()?;
    let second = container.get::<Parrot>()?;
    println!("same prototype instance: {}", Arc::ptr_eq(&first, &second));
    Ok(())
}

#[derive(Debug, Clone)]
struct Comment {
    author: String,
    text: String,
}

trait CommentService: Send + Sync {
    fn publish_comment(&self, comment: Comment) -> Result<String, DynError>;
}

struct DefaultCommentService;

impl CommentService for DefaultCommentService {
    fn publish_comment(&self, comment: Comment) -> Result<String, DynError> {
        tracing::info!(author = %comment.author, text = %comment.text, "Publishing comment");
        Ok("SUCCESS".into())
    }
}

impl CommentService for Proxy<DefaultCommentService> {
    fn publish_comment(&self, comment: Comment) -> Result<String, DynError> {
        let args = vec![Value::new(comment.clone())];
        Ok(self.invoke("publish_comment", args, |service| {
            service.publish_comment(comment)
        })?)
    }
}

const COMMENT_SERVICE: &[MethodSignature] =
    &[MethodSignature::new("publish_comment").tagged(&["to_log"])];

fn comments() -> Result<(), DynError> {
    let logging_aspect = AdviceBinding::new("loggingAspect", Pointcut::annotated("to_log"))
        .around(|join_point| {
            println!(
                "Method {} with parameters {:?} will execute",
                join_point.method().name(),
                join_point.args()
            );
            let returned = join_point.proceed()?;
            println!("Method executed and returned {returned:?}");
            Ok(returned)
        });

    let container = Container::builder()
        .add_component(
            ComponentDescriptor::builder::<DefaultCommentService>("commentService")
                .constructor(|| DefaultCommentService)
                .exposes_advised::<dyn CommentService>(
                    COMMENT_SERVICE,
                    |service| service as Arc<dyn CommentService>,
                    |proxy| proxy as Arc<dyn CommentService>,
                )
                .build(),
        )
        .add_advice(logging_aspect)
        .start()?;

    let service = container.get::<dyn CommentService>()?;
    let status = service.publish_comment(Comment {
        author: "Natasha".into(),
        text: "Demo comment".into(),
    })?;
    println!("{status}");
    container.stop();
    Ok(())
}
