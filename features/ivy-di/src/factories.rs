use std::{marker::PhantomData, sync::Arc};

use crate::{
    aop::{MethodSignature, Proxy},
    descriptor::{ComponentDescriptor, ConstructFn, Dependency, DestroyFn, Exposure, Scope, SetterDependency},
    errors::InjectError,
    resolver::Inject,
    types::{DynError, Injectable, Instance},
};

/// Resolved dependencies handed to a factory, in declaration order
///
/// Slots of optional dependencies that could not be satisfied are empty.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    resolved: Vec<Option<Instance>>,
}

impl Dependencies {
    pub(crate) fn new(resolved: Vec<Option<Instance>>) -> Self {
        Self { resolved }
    }

    /// Extracts the dependency declared at `index`
    pub fn get<R: Inject>(&self, index: usize) -> Result<R, InjectError> {
        let slot = self.resolved.get(index).ok_or(InjectError::NoSuchSlot {
            index,
            declared: self.resolved.len(),
        })?;
        R::extract(slot.as_ref())
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// A function which builds a component from its injected arguments
///
/// Implemented for any `Fn(A, B, ..) -> T` where every argument implements [Inject].
/// The argument types double as the declared constructor dependencies.
pub trait Constructor<Args>: Send + Sync + 'static {
    type Output;

    fn dependencies() -> Vec<Dependency>;

    fn construct(&self, dependencies: &Dependencies) -> Result<Self::Output, InjectError>;
}

macro_rules! impl_constructor {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        impl<Fun, Out, $($arg,)*> Constructor<($($arg,)*)> for Fun
        where
            Fun: Fn($($arg),*) -> Out + Send + Sync + 'static,
            $($arg: Inject,)*
        {
            type Output = Out;

            fn dependencies() -> Vec<Dependency> {
                vec![$(<$arg as Inject>::dependency()),*]
            }

            fn construct(&self, dependencies: &Dependencies) -> Result<Out, InjectError> {
                let mut index = 0;
                $(
                    let $arg = dependencies.get::<$arg>(index)?;
                    index += 1;
                )*
                Ok((self)($($arg),*))
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);

type FactoryFn<T> = Arc<dyn Fn(&Dependencies) -> Result<T, DynError> + Send + Sync>;
type SetterFn<T> = Arc<dyn Fn(&mut T, &Dependencies, usize) -> Result<(), InjectError> + Send + Sync>;
type InitFn<T> = Arc<dyn Fn(&T) -> Result<(), DynError> + Send + Sync>;

/// Builder state before a factory was chosen
pub struct NoFactory;

/// Builder state once a factory was chosen
pub struct WithFactory<T>(FactoryFn<T>);

struct Setter<T> {
    property: String,
    dependency: Dependency,
    apply: SetterFn<T>,
}

/// Typed builder for a [ComponentDescriptor]
///
/// `build` is only available once a factory is set through
/// [ComponentBuilder::constructor], [ComponentBuilder::factory] or
/// [ComponentBuilder::default_constructed].
pub struct ComponentBuilder<T: Injectable, F = NoFactory> {
    name: String,
    scope: Scope,
    primary: bool,
    lazy: bool,
    constructor_dependencies: Vec<Dependency>,
    setters: Vec<Setter<T>>,
    init: Option<InitFn<T>>,
    destroy: Option<Arc<dyn Fn(&T) + Send + Sync>>,
    exposures: Vec<Exposure>,
    misqualified: Option<usize>,
    factory: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> ComponentBuilder<T, NoFactory> {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            scope: Scope::Singleton,
            primary: false,
            lazy: false,
            constructor_dependencies: Vec::new(),
            setters: Vec::new(),
            init: None,
            destroy: None,
            exposures: Vec::new(),
            misqualified: None,
            factory: NoFactory,
            _marker: PhantomData,
        }
    }

    /// Builds `T` by calling `constructor` with its resolved arguments
    ///
    /// Replaces any dependencies declared through `depends_on`.
    pub fn constructor<Args, C>(mut self, constructor: C) -> ComponentBuilder<T, WithFactory<T>>
    where
        C: Constructor<Args, Output = T>,
    {
        self.constructor_dependencies = C::dependencies();
        self.with_factory(Arc::new(move |dependencies: &Dependencies| {
            constructor.construct(dependencies).map_err(DynError::from)
        }))
    }

    /// Builds `T` from the dependencies declared through `depends_on`
    pub fn factory<E>(
        self,
        factory: impl Fn(&Dependencies) -> Result<T, E> + Send + Sync + 'static,
    ) -> ComponentBuilder<T, WithFactory<T>>
    where
        E: Into<DynError>,
    {
        self.with_factory(Arc::new(move |dependencies: &Dependencies| {
            factory(dependencies).map_err(Into::into)
        }))
    }

    /// Builds `T` through [Default], usually combined with setters
    pub fn default_constructed(self) -> ComponentBuilder<T, WithFactory<T>>
    where
        T: Default,
    {
        self.with_factory(Arc::new(|_: &Dependencies| Ok(T::default())))
    }

    fn with_factory(self, factory: FactoryFn<T>) -> ComponentBuilder<T, WithFactory<T>> {
        ComponentBuilder {
            name: self.name,
            scope: self.scope,
            primary: self.primary,
            lazy: self.lazy,
            constructor_dependencies: self.constructor_dependencies,
            setters: self.setters,
            init: self.init,
            destroy: self.destroy,
            exposures: self.exposures,
            misqualified: self.misqualified,
            factory: WithFactory(factory),
            _marker: PhantomData,
        }
    }
}

impl<T: Injectable, F> ComponentBuilder<T, F> {
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn prototype(self) -> Self {
        self.scope(Scope::Prototype)
    }

    /// Preferred candidate when several components provide the same type
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Skip eager construction during start
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Declares a constructor dependency on `R`, read by a factory through [Dependencies::get]
    pub fn depends_on<R: Inject>(mut self) -> Self {
        self.constructor_dependencies.push(R::dependency());
        self
    }

    /// Declares a constructor dependency on the component registered as `name`
    pub fn depends_on_named<R: Inject>(mut self, name: impl Into<String>) -> Self {
        self.constructor_dependencies
            .push(R::dependency().named(name));
        self
    }

    /// Resolves the constructor argument at `index` by name instead of by type
    ///
    /// An `index` past the declared arguments makes every construction of the
    /// component fail with [InjectError::NoSuchSlot].
    pub fn qualifier(mut self, index: usize, name: impl Into<String>) -> Self {
        match self.constructor_dependencies.get_mut(index) {
            Some(dependency) => dependency.name = Some(name.into()),
            None => {
                tracing::warn!(
                    component = %self.name,
                    index,
                    "Qualifier has no constructor argument at that position"
                );
                self.misqualified.get_or_insert(index);
            }
        }
        self
    }

    /// Injects `R` after construction through `apply`
    ///
    /// Declaring the same property twice replaces the earlier setter.
    pub fn setter<R: Inject>(
        self,
        property: impl Into<String>,
        apply: impl Fn(&mut T, R) + Send + Sync + 'static,
    ) -> Self {
        self.push_setter(property.into(), R::dependency(), apply)
    }

    /// Injects the component registered as `name` after construction
    pub fn setter_named<R: Inject>(
        self,
        property: impl Into<String>,
        name: impl Into<String>,
        apply: impl Fn(&mut T, R) + Send + Sync + 'static,
    ) -> Self {
        self.push_setter(property.into(), R::dependency().named(name), apply)
    }

    fn push_setter<R: Inject>(
        mut self,
        property: String,
        dependency: Dependency,
        apply: impl Fn(&mut T, R) + Send + Sync + 'static,
    ) -> Self {
        let apply: SetterFn<T> = Arc::new(move |target: &mut T, dependencies: &Dependencies, index: usize| {
            let value = dependencies.get::<R>(index)?;
            apply(target, value);
            Ok(())
        });
        self.setters.retain(|setter| setter.property != property);
        self.setters.push(Setter {
            property,
            dependency,
            apply,
        });
        self
    }

    /// Runs after all setters were applied, an error fails the construction
    pub fn on_init<E>(mut self, hook: impl Fn(&T) -> Result<(), E> + Send + Sync + 'static) -> Self
    where
        E: Into<DynError>,
    {
        self.init = Some(Arc::new(move |target: &T| hook(target).map_err(Into::into)));
        self
    }

    /// Runs for built singletons when the container stops
    pub fn on_destroy(mut self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.destroy = Some(Arc::new(hook));
        self
    }

    /// Makes the component available as `C`, usually a `dyn Trait`
    pub fn exposes<C: ?Sized + Injectable>(
        mut self,
        upcast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self {
        self.push_exposure(Exposure::capability::<T, C>(upcast));
        self
    }

    /// Makes the component available as `C` and lets advice intercept `methods`
    ///
    /// `proxy_upcast` presents the woven [Proxy] as `C`, so `Proxy<T>` has to implement
    /// the capability by forwarding through [Proxy::invoke].
    pub fn exposes_advised<C: ?Sized + Injectable>(
        mut self,
        methods: &[MethodSignature],
        upcast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
        proxy_upcast: impl Fn(Arc<Proxy<T>>) -> Arc<C> + Send + Sync + 'static,
    ) -> Self {
        self.push_exposure(Exposure::capability::<T, C>(upcast).advised(methods, proxy_upcast));
        self
    }

    fn push_exposure(&mut self, exposure: Exposure) {
        self.exposures
            .retain(|existing| existing.info().type_id != exposure.info().type_id);
        self.exposures.push(exposure);
    }
}

impl<T: Injectable> ComponentBuilder<T, WithFactory<T>> {
    pub fn build(self) -> ComponentDescriptor {
        let Self {
            name,
            scope,
            primary,
            lazy,
            constructor_dependencies,
            setters,
            init,
            destroy,
            exposures,
            misqualified,
            factory: WithFactory(factory),
            ..
        } = self;

        let declared = constructor_dependencies.len();

        let setter_dependencies = setters
            .iter()
            .map(|setter| SetterDependency {
                property: setter.property.clone(),
                dependency: setter.dependency.clone(),
            })
            .collect();
        let appliers: Vec<SetterFn<T>> = setters.into_iter().map(|setter| setter.apply).collect();

        let construct: ConstructFn = Arc::new(
            move |constructor: &Dependencies, setters: &Dependencies| {
                if let Some(index) = misqualified {
                    return Err(Box::new(InjectError::NoSuchSlot { index, declared }) as DynError);
                }
                let mut instance = factory(constructor)?;
                for (index, apply) in appliers.iter().enumerate() {
                    apply(&mut instance, setters, index)?;
                }
                if let Some(init) = &init {
                    init(&instance)?;
                }
                Ok(Instance::new(instance))
            },
        );

        let destroy = destroy.map(|hook| -> DestroyFn {
            Arc::new(move |raw: &Instance| {
                if let Ok(target) = raw.downcast::<T>() {
                    hook(&target);
                }
            })
        });

        let mut all_exposures = vec![Exposure::identity::<T>()];
        all_exposures.extend(
            exposures
                .into_iter()
                .filter(|exposure| exposure.info().type_id != std::any::TypeId::of::<T>()),
        );

        ComponentDescriptor {
            name,
            declared_type: crate::types::TypeInfo::of::<T>(),
            scope,
            primary,
            lazy,
            constructor_dependencies,
            setter_dependencies,
            construct,
            destroy,
            exposures: all_exposures,
        }
    }
}
