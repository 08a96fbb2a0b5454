use std::{collections::HashSet, sync::Arc};

use parking_lot::RwLock;

use crate::{
    aop::ProxyWeaver,
    descriptor::{ComponentDescriptor, Dependency},
    errors::{InjectError, ResolveError},
    factories::Dependencies,
    registry::DescriptorRegistry,
    scope::{Bean, ScopeManager},
    types::Instance,
};

mod context;
pub mod inject;

pub use context::ResolutionContext;

/// Allows custom behaviour on injection
///
/// The implementing type declares what it needs, the resolver satisfies it
/// before the factory runs and `extract` turns the resolved slot into `Self`.
pub trait Inject: Sized {
    fn dependency() -> Dependency;

    /// `resolved` is `None` only for optional dependencies that could not be satisfied
    fn extract(resolved: Option<&Instance>) -> Result<Self, InjectError>;
}

/// Builds components by recursively satisfying their dependencies
pub(crate) struct DependencyResolver<'c> {
    pub registry: &'c RwLock<DescriptorRegistry>,
    pub scopes: &'c ScopeManager,
    pub weaver: &'c ProxyWeaver,
}

impl DependencyResolver<'_> {
    /// Obtains a component through its scope, constructing it if needed
    ///
    /// The caller has already entered the component on `context`.
    pub fn resolve(
        &self,
        descriptor: &Arc<ComponentDescriptor>,
        context: &mut ResolutionContext,
    ) -> Result<Bean, ResolveError> {
        self.scopes
            .obtain(descriptor, || self.construct(descriptor, context))
    }

    fn construct(
        &self,
        descriptor: &ComponentDescriptor,
        context: &mut ResolutionContext,
    ) -> Result<Bean, ResolveError> {
        let _span = tracing::debug_span!("construct", component = %descriptor.name()).entered();

        let constructor = self.resolve_all(descriptor.constructor_dependencies().iter(), context)?;
        let setters = self.resolve_all(
            descriptor
                .setter_dependencies()
                .iter()
                .map(|setter| &setter.dependency),
            context,
        )?;

        let raw = descriptor
            .construct(&constructor, &setters)
            .map_err(|error| {
                tracing::warn!(component = %descriptor.name(), %error, "Construction failed");
                ResolveError::FactoryFailed {
                    component: descriptor.name().to_owned(),
                    error: Arc::new(error),
                }
            })?;
        tracing::debug!(
            component = %descriptor.name(),
            scope = %descriptor.scope(),
            depth = context.depth(),
            "Constructed"
        );

        Ok(self.weaver.wrap(descriptor, raw))
    }

    fn resolve_all<'d>(
        &self,
        dependencies: impl Iterator<Item = &'d Dependency>,
        context: &mut ResolutionContext,
    ) -> Result<Dependencies, ResolveError> {
        let resolved = dependencies
            .map(|dependency| self.resolve_dependency(dependency, context))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dependencies::new(resolved))
    }

    /// Fails with [ResolveError::CyclicDependency] if the static dependency edges
    /// reachable from `root` loop back
    ///
    /// Runs before any singleton slot is entered. A cycle found only while
    /// constructing would leave two threads entering it from opposite ends
    /// waiting on each other's slot.
    pub fn ensure_acyclic(&self, root: &Arc<ComponentDescriptor>) -> Result<(), ResolveError> {
        let registry = self.registry.read();
        let mut path = ResolutionContext::new();
        let mut acyclic = HashSet::new();
        self.walk(&registry, root, &mut path, &mut acyclic)
    }

    fn walk(
        &self,
        registry: &DescriptorRegistry,
        descriptor: &Arc<ComponentDescriptor>,
        path: &mut ResolutionContext,
        acyclic: &mut HashSet<String>,
    ) -> Result<(), ResolveError> {
        // Built singletons never resolve their dependencies again
        if acyclic.contains(descriptor.name()) || self.scopes.is_built(descriptor.name()) {
            return Ok(());
        }

        path.enter(descriptor.name())?;
        for dependency in descriptor.dependencies() {
            // Lookup failures are reported by the construction itself
            if let Ok(target) = registry.find_dependency(dependency) {
                self.walk(registry, &target, path, acyclic)?;
            }
        }
        path.exit();

        acyclic.insert(descriptor.name().to_owned());
        Ok(())
    }

    /// Resolves a single dependency to the view matching its declared type
    pub fn resolve_dependency(
        &self,
        dependency: &Dependency,
        context: &mut ResolutionContext,
    ) -> Result<Option<Instance>, ResolveError> {
        // Registry lock is released before recursing
        let candidate = match self.registry.read().find_dependency(dependency) {
            Ok(candidate) => candidate,
            Err(error) if dependency.optional && error.is_not_found() => {
                tracing::trace!(%dependency, "Optional dependency absent");
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        context.enter(candidate.name())?;
        let bean = self.resolve(&candidate, context);
        context.exit();

        bean?.view(dependency.type_info).map(Some)
    }
}
