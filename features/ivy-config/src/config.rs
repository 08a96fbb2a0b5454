use std::{ops::Deref, sync::Arc};

use ivy_di::{Dependency, Inject, InjectError, Instance};

use crate::provider::ConfigProvider;

/// A wrapper type to allow for config injections
///
/// Resolves the registered [ConfigProvider] and takes the config of type `T`
/// out of it, so a constructor can simply take a `Config<T>` argument.
///
/// # Example
/// ```rust,ignore
/// #[derive(Clone)]
/// pub struct MailConfig {
///     sender: String,
/// }
///
/// let mut provider = ConfigProvider::new();
/// provider.add_config(MailConfig { sender: "ivy@example.com".into() })?;
///
/// let container = Container::builder()
///     .add_component(provider.into_descriptor())
///     .add_component(
///         ComponentDescriptor::builder::<Mailer>("mailer")
///             .constructor(|config: Config<MailConfig>| Mailer::new(&config.sender))
///             .build(),
///     )
///     .start()?;
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}

impl<T> Clone for Config<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Config<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Config").field(&self.inner).finish()
    }
}

impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Send + Sync + 'static> Inject for Config<T> {
    fn dependency() -> Dependency {
        Dependency::on::<ConfigProvider>()
    }

    fn extract(resolved: Option<&Instance>) -> Result<Self, InjectError> {
        let provider = <Arc<ConfigProvider>>::extract(resolved)?;
        let inner = provider
            .get_config::<T>()
            .map_err(|error| InjectError::Other(Box::new(error)))?;

        Ok(Config { inner })
    }
}
