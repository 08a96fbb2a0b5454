use ivy_di::TypeInfo;

/// Errors when registering or retrieving a config
#[derive(thiserror::Error, Debug, Clone)]
pub enum ConfigError {
    /// The required Config is not known
    #[error("No config of type '{0}' is registered")]
    Missing(TypeInfo),

    /// A Config of that type is already registered
    #[error("A config of type '{0}' is already registered")]
    AlreadyRegistered(TypeInfo),
}
