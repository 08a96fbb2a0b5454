use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use ivy_di::{ComponentDescriptor, TypeInfo};

use crate::errors::ConfigError;

/// A provider to register all configs.
///
/// Configs can be registered and retrieved based on type.
#[derive(Default)]
pub struct ConfigProvider {
    configs: HashMap<TypeId, (TypeInfo, Arc<dyn Any + Send + Sync + 'static>)>,
}

impl std::fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.configs.values().map(|(info, _)| info.type_name))
            .finish()
    }
}

impl ConfigProvider {
    /// Name the provider is registered under in a container
    pub const COMPONENT_NAME: &'static str = "configProvider";

    /// Initializes an empty Config Provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a config with specified type.
    ///
    /// Fails with [`ConfigError::Missing`] if the type was never registered
    pub fn get_config<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ConfigError> {
        let missing = || ConfigError::Missing(TypeInfo::of::<T>());
        let (_, config) = self.configs.get(&TypeId::of::<T>()).ok_or_else(missing)?;
        config.clone().downcast().map_err(|_| missing())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.configs.contains_key(&TypeId::of::<T>())
    }

    /// Add a config to the registry.
    ///
    /// If the config type is already registered, it will return a
    /// [`ConfigError::AlreadyRegistered`] error
    pub fn add_config<T: Send + Sync + 'static>(
        &mut self,
        config: T,
    ) -> Result<&mut Self, ConfigError> {
        let info = TypeInfo::of::<T>();
        if self.configs.contains_key(&info.type_id) {
            return Err(ConfigError::AlreadyRegistered(info));
        }

        tracing::debug!(config = %info, "Config registered");
        self.configs.insert(info.type_id, (info, Arc::new(config)));
        Ok(self)
    }

    /// Can optionally add a config to the registry.
    ///
    /// If the config provided is `Some(T)`, it will be the same as calling [`ConfigProvider::add_config`]
    /// If the config provided is `None`, then the function just returns `Ok(self)` for chaining
    pub fn maybe_add_config<T: Send + Sync + 'static>(
        &mut self,
        config: Option<T>,
    ) -> Result<&mut Self, ConfigError> {
        match config {
            Some(c) => self.add_config(c),
            None => Ok(self),
        }
    }

    /// Wraps the provider into a singleton descriptor named [`ConfigProvider::COMPONENT_NAME`]
    pub fn into_descriptor(self) -> ComponentDescriptor {
        ComponentDescriptor::instance(Self::COMPONENT_NAME, self)
    }
}
