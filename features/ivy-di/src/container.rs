use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;

use crate::{
    aop::{AdviceBinding, ProxyWeaver},
    builder::ContainerBuilder,
    config::ContainerConfig,
    dependency_graph::{DependencyGraph, DependencyGraphErrors},
    descriptor::{ComponentDescriptor, Scope},
    errors::{ResolveError, StartupError, StartupFailure},
    registry::DescriptorRegistry,
    resolver::{DependencyResolver, ResolutionContext},
    scope::{Bean, ScopeManager},
    types::{Injectable, Instance, TypeInfo},
};

/// The running container
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct Container(Arc<ContainerInner>);

struct ContainerInner {
    registry: RwLock<DescriptorRegistry>,
    scopes: ScopeManager,
    weaver: ProxyWeaver,
    config: ContainerConfig,
    stopped: AtomicBool,
}

impl Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.0.registry.read();
        let mut map = f.debug_struct("Container");
        for descriptor in registry.descriptors() {
            let state = if self.0.scopes.is_built(descriptor.name()) {
                "built"
            } else {
                "not built"
            };
            map.field(descriptor.name(), &format_args!("{} ({})", descriptor.scope(), state));
        }
        map.finish()
    }
}

impl Container {
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Registers everything and builds all eager singletons
    ///
    /// Fails with every problem found, not just the first one.
    pub fn start(
        descriptors: Vec<ComponentDescriptor>,
        bindings: Vec<AdviceBinding>,
    ) -> Result<Container, StartupError> {
        Self::start_with(ContainerConfig::default(), descriptors, bindings)
    }

    pub fn start_with(
        config: ContainerConfig,
        descriptors: Vec<ComponentDescriptor>,
        bindings: Vec<AdviceBinding>,
    ) -> Result<Container, StartupError> {
        let mut registry = DescriptorRegistry::new();
        let mut failures = Vec::new();

        for binding in bindings {
            registry.add_binding(binding);
        }
        for descriptor in descriptors {
            let name = descriptor.name().to_owned();
            if let Err(error) = registry.register(descriptor) {
                failures.push(StartupFailure {
                    component: name,
                    error,
                });
            }
        }

        let mut graph_valid = true;
        if config.validate_graph {
            if let Err(graph_errors) = DependencyGraph::from_registry(&registry).check() {
                graph_valid = false;
                failures.extend(graph_errors.errors.into_iter().map(|error| StartupFailure {
                    component: error.component().to_owned(),
                    error: error.into(),
                }));
            }
        }

        let weaver = ProxyWeaver::new(registry.advice_bindings().to_vec());
        let container = Container(Arc::new(ContainerInner {
            registry: RwLock::new(registry),
            scopes: ScopeManager::new(),
            weaver,
            config,
            stopped: AtomicBool::new(false),
        }));

        // A broken graph would only fail again during construction
        if graph_valid && container.0.config.eager_singletons {
            failures.extend(container.pre_instantiate());
        }

        if !failures.is_empty() {
            let error = StartupError { failures };
            tracing::error!("{error}");
            container.teardown();
            return Err(error);
        }

        tracing::info!(
            components = container.0.registry.read().len(),
            "Container started"
        );
        Ok(container)
    }

    fn pre_instantiate(&self) -> Vec<StartupFailure> {
        let descriptors: Vec<_> = self.0.registry.read().descriptors().cloned().collect();
        self.0
            .scopes
            .pre_instantiate(&descriptors, |descriptor| self.resolve_root(descriptor))
    }

    fn resolver(&self) -> DependencyResolver<'_> {
        DependencyResolver {
            registry: &self.0.registry,
            scopes: &self.0.scopes,
            weaver: &self.0.weaver,
        }
    }

    fn resolve_root(&self, descriptor: &Arc<ComponentDescriptor>) -> Result<Bean, ResolveError> {
        let resolver = self.resolver();
        resolver.ensure_acyclic(descriptor)?;

        let mut context = ResolutionContext::new();
        context.enter(descriptor.name())?;
        let bean = resolver.resolve(descriptor, &mut context);
        context.exit();

        // A lookup racing `stop` may have cached singletons after the teardown
        if self.0.stopped.load(Ordering::Acquire) {
            self.teardown();
            return Err(ResolveError::Stopped);
        }
        bean
    }

    fn ensure_running(&self) -> Result<(), ResolveError> {
        if self.0.stopped.load(Ordering::Acquire) {
            return Err(ResolveError::Stopped);
        }
        Ok(())
    }

    fn view_as<T: ?Sized + Injectable>(bean: &Bean) -> Result<Arc<T>, ResolveError> {
        let info = TypeInfo::of::<T>();
        bean.view(info)?
            .downcast::<T>()
            .map_err(|actual_type| ResolveError::TypeMismatch {
                component: bean.name().to_owned(),
                required_type: info.type_name,
                actual_type,
            })
    }

    /// The single component assignable to `T`
    ///
    /// `T` may be a concrete type or a capability like `dyn MyService`. Capabilities
    /// with matching advice resolve to the proxy.
    pub fn get<T: ?Sized + Injectable>(&self) -> Result<Arc<T>, ResolveError> {
        self.ensure_running()?;
        let descriptor = self.0.registry.read().select_by_type(TypeInfo::of::<T>())?;
        let bean = self.resolve_root(&descriptor)?;
        Self::view_as::<T>(&bean)
    }

    /// The component registered as `name`, seen as `T`
    pub fn get_named<T: ?Sized + Injectable>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        self.ensure_running()?;
        let descriptor = self
            .0
            .registry
            .read()
            .find_named(name, TypeInfo::of::<T>())?;
        let bean = self.resolve_root(&descriptor)?;
        Self::view_as::<T>(&bean)
    }

    /// The undecorated component registered as `name`
    pub fn get_by_name(&self, name: &str) -> Result<Instance, ResolveError> {
        self.ensure_running()?;
        let descriptor = self.0.registry.read().find_by_name(name)?;
        let bean = self.resolve_root(&descriptor)?;
        Ok(bean.raw().clone())
    }

    /// Like [Container::get], but `None` if no component provides `T`
    pub fn try_get<T: ?Sized + Injectable>(&self) -> Result<Option<Arc<T>>, ResolveError> {
        self.ensure_running()?;
        let selected = self.0.registry.read().select_by_type(TypeInfo::of::<T>());
        let descriptor = match selected {
            Ok(descriptor) => descriptor,
            Err(error) if error.is_not_found() => return Ok(None),
            Err(error) => return Err(error),
        };
        let bean = self.resolve_root(&descriptor)?;
        Self::view_as::<T>(&bean).map(Some)
    }

    /// Every component assignable to `T`, in registration order
    pub fn get_all<T: ?Sized + Injectable>(&self) -> Result<Vec<Arc<T>>, ResolveError> {
        self.ensure_running()?;
        let candidates = self.0.registry.read().find_by_type(TypeInfo::of::<T>());
        candidates
            .iter()
            .map(|descriptor| Self::view_as::<T>(&self.resolve_root(descriptor)?))
            .collect()
    }

    /// Adds a component to the running container
    ///
    /// Eager singletons are built immediately. If that fails the registration
    /// is rolled back and the error returned.
    pub fn register_late(&self, descriptor: ComponentDescriptor) -> Result<(), ResolveError> {
        self.ensure_running()?;
        let descriptor = self.0.registry.write().register(descriptor)?;
        tracing::info!(component = %descriptor.name(), "Registered late");

        let eager = descriptor.scope() == Scope::Singleton
            && !descriptor.is_lazy()
            && self.0.config.eager_singletons;
        if eager {
            if let Err(error) = self.resolve_root(&descriptor) {
                tracing::warn!(component = %descriptor.name(), %error, "Late registration rolled back");
                self.0.registry.write().unregister(descriptor.name());
                self.0.scopes.forget(descriptor.name());
                return Err(error);
            }
        }
        Ok(())
    }

    /// Runs destroy hooks of built singletons in reverse construction order
    ///
    /// Every later lookup fails with [ResolveError::Stopped]. Stopping twice is a no-op.
    pub fn stop(&self) {
        if self.0.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.teardown();
        tracing::info!("Container stopped");
    }

    fn teardown(&self) {
        self.0
            .scopes
            .teardown(|name| self.0.registry.read().find_by_name(name).ok());
    }

    pub fn is_running(&self) -> bool {
        !self.0.stopped.load(Ordering::Acquire)
    }

    /// Checks the dependency graph of everything registered, without building anything
    pub fn validate(&self) -> Result<(), DependencyGraphErrors> {
        self.graph().check()
    }

    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_registry(&self.0.registry.read())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.registry.read().contains(name)
    }

    /// Names of all components in registration order
    pub fn component_names(&self) -> Vec<String> {
        self.0
            .registry
            .read()
            .names()
            .map(str::to_owned)
            .collect()
    }

    /// The descriptor registered as `name`
    pub fn descriptor(&self, name: &str) -> Result<Arc<ComponentDescriptor>, ResolveError> {
        self.0.registry.read().find_by_name(name)
    }

    /// True once the singleton `name` has been constructed and cached
    pub fn is_built(&self, name: &str) -> bool {
        self.0.scopes.is_built(name)
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.0.config
    }
}
