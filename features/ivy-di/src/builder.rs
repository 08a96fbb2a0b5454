use crate::{
    aop::AdviceBinding,
    config::ContainerConfig,
    container::Container,
    descriptor::ComponentDescriptor,
    errors::StartupError,
    types::Injectable,
};

/// Collects components and advice before the container starts
///
/// 1. Register descriptors, prebuilt instances and advice bindings
/// 2. `start` validates everything and builds the eager singletons
#[derive(Default)]
pub struct ContainerBuilder {
    config: ContainerConfig,
    descriptors: Vec<ComponentDescriptor>,
    bindings: Vec<AdviceBinding>,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_component(mut self, descriptor: ComponentDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Registers an already created value as a singleton
    pub fn add_instance<T: Injectable>(self, name: impl Into<String>, instance: T) -> Self {
        self.add_component(ComponentDescriptor::instance(name, instance))
    }

    pub fn add_advice(mut self, binding: AdviceBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn start(self) -> Result<Container, StartupError> {
        Container::start_with(self.config, self.descriptors, self.bindings)
    }
}
