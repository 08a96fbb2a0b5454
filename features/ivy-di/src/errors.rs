use std::sync::Arc;

use thiserror::Error;

use crate::types::{DynError, TypeInfo};

/// Errors while resolving a component
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    /// No component is registered under the name
    #[error("No component named '{0}' is registered")]
    NameNotFound(String),

    /// No component is assignable to the type
    #[error("No component of type '{0}' is registered")]
    TypeNotFound(TypeInfo),

    /// More than one candidate and no single primary
    #[error("Type '{requested}' is ambiguous, candidates: {candidates:?} - mark exactly one as primary or request it by name")]
    Ambiguous {
        requested: TypeInfo,
        candidates: Vec<String>,
    },

    /// A name was registered twice
    #[error("A component named '{0}' is already registered")]
    DuplicateName(String),

    /// The dependency graph loops back onto itself
    #[error("Circular dependency: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// The component exists, but does not provide the required type
    #[error("Component '{component}' does not provide '{required_type}' (actual: '{actual_type}')")]
    TypeMismatch {
        component: String,
        required_type: &'static str,
        actual_type: &'static str,
    },

    /// A factory or lifecycle hook failed
    #[error("Factory for '{component}' failed - error: {error}")]
    FactoryFailed {
        component: String,
        error: Arc<DynError>,
    },

    /// The container was stopped
    #[error("The container has been stopped")]
    Stopped,
}

impl ResolveError {
    /// True for the not found family, which optional lookups turn into `None`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NameNotFound(_) | Self::TypeNotFound(_))
    }
}

/// Errors when extracting a dependency inside a factory
#[derive(Error, Debug)]
pub enum InjectError {
    /// A required dependency was not resolved
    #[error("The required dependency '{0}' is missing")]
    Missing(&'static str),

    /// No dependency was declared at that position
    #[error("No dependency declared at index {index} (declared: {declared})")]
    NoSuchSlot { index: usize, declared: usize },

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },

    /// Generic error during injection
    #[error("Error during injection: {0}")]
    Other(DynError),
}

/// A single component that could not be set up during start
#[derive(Debug, Clone)]
pub struct StartupFailure {
    pub component: String,
    pub error: ResolveError,
}
impl std::fmt::Display for StartupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}': {}", self.component, self.error)
    }
}

/// Every failure collected while starting the container
#[derive(Error, Debug, Clone)]
pub struct StartupError {
    pub failures: Vec<StartupFailure>,
}
impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push(format!(
            "The container failed to start with {} error(s):",
            self.failures.len()
        ));
        for failure in &self.failures {
            display.push(format!("- {}", failure));
        }
        f.write_str(&display.join("\n"))
    }
}
impl StartupError {
    /// Names of every component that failed
    pub fn components(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.component.as_str()).collect()
    }
}

/// Errors raised while invoking an advised method
#[derive(Error, Debug)]
pub enum AdviceChainError {
    /// The real method or one of the advices raised
    #[error("'{method}' raised: {cause}")]
    Raised {
        method: &'static str,
        cause: DynError,
    },

    /// An around advice called `proceed` twice
    #[error("Advice on '{0}' called proceed more than once")]
    AlreadyProceeded(&'static str),

    /// An around advice substituted a value of the wrong type
    #[error("Advice on '{method}' returned '{actual_type}', but '{expected_type}' is required")]
    ReturnTypeMismatch {
        method: &'static str,
        expected_type: &'static str,
        actual_type: &'static str,
    },
}

impl AdviceChainError {
    /// Wraps a raised error, passing chain errors of nested proxies through unchanged
    pub(crate) fn raised(method: &'static str, cause: DynError) -> Self {
        match cause.downcast::<AdviceChainError>() {
            Ok(nested) => *nested,
            Err(cause) => Self::Raised { method, cause },
        }
    }

    /// The original error, if this wraps one
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Raised { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }

    /// Downcasts the original error
    pub fn downcast_cause<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.cause().and_then(|cause| cause.downcast_ref::<E>())
    }
}
