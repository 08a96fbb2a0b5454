use std::{fmt::Debug, sync::Arc};

use crate::{
    aop::{MethodSignature, Proxy, ProxyParts},
    factories::{ComponentBuilder, Dependencies, NoFactory},
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// How long a constructed instance lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Built once, cached and shared
    #[default]
    Singleton,
    /// Built fresh on every request, never cached
    Prototype,
}
impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Singleton => f.write_str("singleton"),
            Scope::Prototype => f.write_str("prototype"),
        }
    }
}

/// Information about a component dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// The required Type
    pub type_info: TypeInfo,
    /// Resolve by this name instead of by type
    pub name: Option<String>,
    /// If it is optional or required
    pub optional: bool,
}
impl Dependency {
    pub fn on<T: ?Sized + 'static>() -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            name: None,
            optional: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}
impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} named '{}'", self.type_info, name),
            None => write!(f, "{}", self.type_info),
        }
    }
}

/// A dependency injected through a property after construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetterDependency {
    pub property: String,
    pub dependency: Dependency,
}

pub(crate) type ConstructFn =
    Arc<dyn Fn(&Dependencies, &Dependencies) -> Result<Instance, DynError> + Send + Sync>;
pub(crate) type DestroyFn = Arc<dyn Fn(&Instance) + Send + Sync>;
type UpcastFn = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;
type WeaveFn = Arc<dyn Fn(&Instance, ProxyParts) -> Option<Instance> + Send + Sync>;

/// A type a component can be looked up as
#[derive(Clone)]
pub struct Exposure {
    info: TypeInfo,
    upcast: UpcastFn,
    advised: Option<AdvisedExposure>,
}

/// The method set of an advisable capability and how to present a proxy as it
#[derive(Clone)]
pub(crate) struct AdvisedExposure {
    pub methods: Vec<MethodSignature>,
    pub weave: WeaveFn,
}

impl Exposure {
    /// The concrete type itself
    pub(crate) fn identity<T: Injectable>() -> Self {
        Self {
            info: TypeInfo::of::<T>(),
            upcast: Arc::new(|raw: &Instance| Some(raw.clone())),
            advised: None,
        }
    }

    pub(crate) fn capability<T, C>(upcast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static) -> Self
    where
        T: Injectable,
        C: ?Sized + Injectable,
    {
        Self {
            info: TypeInfo::of::<C>(),
            upcast: Arc::new(move |raw: &Instance| {
                raw.downcast::<T>()
                    .ok()
                    .map(|target| Instance::from_arc(upcast(target)))
            }),
            advised: None,
        }
    }

    pub(crate) fn advised<T, C>(
        mut self,
        methods: &[MethodSignature],
        proxy_upcast: impl Fn(Arc<Proxy<T>>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self
    where
        T: Injectable,
        C: ?Sized + Injectable,
    {
        self.advised = Some(AdvisedExposure {
            methods: methods.to_vec(),
            weave: Arc::new(move |raw: &Instance, parts: ProxyParts| {
                raw.downcast::<T>().ok().map(|target| {
                    Instance::from_arc(proxy_upcast(Arc::new(Proxy::new(target, parts))))
                })
            }),
        });
        self
    }

    pub fn info(&self) -> TypeInfo {
        self.info
    }

    /// The exposed method set, if calls through this type can be advised
    pub fn advisable_methods(&self) -> Option<&[MethodSignature]> {
        self.advised.as_ref().map(|advised| advised.methods.as_slice())
    }

    pub(crate) fn advised_exposure(&self) -> Option<&AdvisedExposure> {
        self.advised.as_ref()
    }

    pub(crate) fn upcast(&self, raw: &Instance) -> Option<Instance> {
        (self.upcast)(raw)
    }
}

/// Declarative record of how to build and scope a managed component
///
/// Created through [ComponentDescriptor::builder] or [ComponentDescriptor::instance].
pub struct ComponentDescriptor {
    pub(crate) name: String,
    pub(crate) declared_type: TypeInfo,
    pub(crate) scope: Scope,
    pub(crate) primary: bool,
    pub(crate) lazy: bool,
    pub(crate) constructor_dependencies: Vec<Dependency>,
    pub(crate) setter_dependencies: Vec<SetterDependency>,
    pub(crate) construct: ConstructFn,
    pub(crate) destroy: Option<DestroyFn>,
    pub(crate) exposures: Vec<Exposure>,
}

impl Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("declared_type", &self.declared_type.type_name)
            .field("scope", &self.scope)
            .field("primary", &self.primary)
            .field("lazy", &self.lazy)
            .field("constructor_dependencies", &self.constructor_dependencies)
            .field("setter_dependencies", &self.setter_dependencies)
            .field(
                "exposes",
                &self
                    .exposures
                    .iter()
                    .map(|e| e.info.type_name)
                    .collect::<Vec<_>>(),
            )
            .field("factory", &"<function>")
            .finish()
    }
}

impl ComponentDescriptor {
    /// Starts describing a component of type `T`
    pub fn builder<T: Injectable>(name: impl Into<String>) -> ComponentBuilder<T, NoFactory> {
        ComponentBuilder::new(name.into())
    }

    /// A singleton wrapping an already created value
    pub fn instance<T: Injectable>(name: impl Into<String>, instance: T) -> Self {
        let shared = Instance::new(instance);
        Self {
            name: name.into(),
            declared_type: TypeInfo::of::<T>(),
            scope: Scope::Singleton,
            primary: false,
            lazy: false,
            constructor_dependencies: Vec::new(),
            setter_dependencies: Vec::new(),
            construct: Arc::new(move |_, _| Ok(shared.clone())),
            destroy: None,
            exposures: vec![Exposure::identity::<T>()],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> TypeInfo {
        self.declared_type
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Marks an existing descriptor as primary, e.g. for one of several registered instances
    pub fn into_primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn constructor_dependencies(&self) -> &[Dependency] {
        &self.constructor_dependencies
    }

    pub fn setter_dependencies(&self) -> &[SetterDependency] {
        &self.setter_dependencies
    }

    /// All dependencies in resolution order, constructor first
    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.constructor_dependencies
            .iter()
            .chain(self.setter_dependencies.iter().map(|s| &s.dependency))
    }

    pub fn exposures(&self) -> &[Exposure] {
        &self.exposures
    }

    /// True if the component can be looked up as `type_info`
    pub fn provides(&self, type_info: TypeInfo) -> bool {
        self.exposures
            .iter()
            .any(|e| e.info.type_id == type_info.type_id)
    }

    pub(crate) fn construct(
        &self,
        constructor: &Dependencies,
        setters: &Dependencies,
    ) -> Result<Instance, DynError> {
        (self.construct)(constructor, setters)
    }

    pub(crate) fn destroy(&self, raw: &Instance) {
        if let Some(destroy) = &self.destroy {
            destroy(raw);
        }
    }
}
