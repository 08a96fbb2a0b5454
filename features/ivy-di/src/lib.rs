//! A small inversion of control container with method interception
//!
//! Components are described by [ComponentDescriptor]s, registered in a
//! [ContainerBuilder] and resolved from the started [Container] by type or name.
//! Components exposed through capability traits can be wrapped in a [Proxy]
//! which runs [AdviceBinding]s around their calls.

pub mod aop;
mod builder;
mod config;
mod container;
mod dependency_graph;
mod descriptor;
mod errors;
mod factories;
mod registry;
mod resolver;
mod scope;
mod types;

pub use aop::{
    Advice, AdviceBinding, AdviceKind, JoinPoint, MethodSignature, Pointcut, PointcutTarget, Proxy,
    ProxyWeaver,
};
pub use builder::ContainerBuilder;
pub use config::ContainerConfig;
pub use container::Container;
pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use descriptor::{ComponentDescriptor, Dependency, Exposure, Scope, SetterDependency};
pub use errors::{
    AdviceChainError, InjectError, ResolveError, StartupError, StartupFailure,
};
pub use factories::{ComponentBuilder, Constructor, Dependencies, NoFactory, WithFactory};
pub use registry::DescriptorRegistry;
pub use resolver::{Inject, ResolutionContext};
pub use scope::{Bean, ScopeManager, SlotState};
pub use types::{DynError, Injectable, Instance, Payload, TypeInfo, Value};
