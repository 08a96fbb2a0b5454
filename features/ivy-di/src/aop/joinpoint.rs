use std::any::Any;

use crate::{
    aop::MethodSignature,
    errors::AdviceChainError,
    types::{DynError, TypeInfo, Value},
};

/// Continues the chain: the next around advice, or finally the real method
pub(crate) type Proceed<'a> = Box<dyn FnOnce() -> Result<Value, DynError> + 'a>;

/// Everything known about one intercepted call
pub(crate) struct CallSite<'a> {
    pub component: &'a str,
    pub declared_type: TypeInfo,
    pub target: &'a (dyn Any + Send + Sync),
    pub method: &'a MethodSignature,
    pub args: &'a [Value],
}

/// The intercepted call as seen by an advice
///
/// Around advice may call [JoinPoint::proceed] once to continue the chain,
/// or return a value of its own without proceeding.
pub struct JoinPoint<'a> {
    site: &'a CallSite<'a>,
    next: Option<Proceed<'a>>,
}

impl<'a> JoinPoint<'a> {
    /// A join point for advice that cannot proceed
    pub(crate) fn observing(site: &'a CallSite<'a>) -> Self {
        Self { site, next: None }
    }

    pub(crate) fn proceeding(site: &'a CallSite<'a>, next: Proceed<'a>) -> Self {
        Self {
            site,
            next: Some(next),
        }
    }

    pub fn component(&self) -> &str {
        self.site.component
    }

    pub fn declared_type(&self) -> TypeInfo {
        self.site.declared_type
    }

    pub fn method(&self) -> &MethodSignature {
        self.site.method
    }

    pub fn args(&self) -> &[Value] {
        self.site.args
    }

    /// The argument at `index`, if it is a `T`
    pub fn arg<T: Any>(&self, index: usize) -> Option<&T> {
        self.site.args.get(index)?.downcast_ref::<T>()
    }

    /// The undecorated target, if it is a `T`
    pub fn target<T: Any>(&self) -> Option<&T> {
        self.site.target.downcast_ref::<T>()
    }

    /// Runs the rest of the chain and returns its result
    pub fn proceed(&mut self) -> Result<Value, DynError> {
        match self.next.take() {
            Some(next) => next(),
            None => Err(Box::new(AdviceChainError::AlreadyProceeded(
                self.site.method.name(),
            ))),
        }
    }

    pub fn has_proceeded(&self) -> bool {
        self.next.is_none()
    }
}

impl std::fmt::Debug for JoinPoint<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinPoint")
            .field("component", &self.site.component)
            .field("method", &self.site.method.name())
            .field("args", &self.site.args)
            .finish()
    }
}
