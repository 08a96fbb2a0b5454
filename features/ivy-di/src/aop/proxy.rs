use std::{any::type_name, collections::HashMap, sync::Arc};

use crate::{
    aop::{
        advice::AdviceChain,
        joinpoint::{CallSite, Proceed},
    },
    errors::AdviceChainError,
    types::{DynError, Injectable, Payload, TypeInfo, Value},
};

/// What the weaver hands to an advised exposure to build a [Proxy]
pub(crate) struct ProxyParts {
    pub component: Arc<str>,
    pub declared_type: TypeInfo,
    pub chains: HashMap<&'static str, Arc<AdviceChain>>,
}

/// Wraps a component and runs advice around its calls
///
/// A proxy implements the component's capability trait by forwarding every
/// method through [Proxy::invoke]:
///
/// ```ignore
/// impl CommentService for Proxy<DefaultCommentService> {
///     fn publish(&self, comment: Comment) -> Result<(), DynError> {
///         let args = vec![Value::new(comment.clone())];
///         Ok(self.invoke("publish", args, |target| target.publish(comment))?)
///     }
/// }
/// ```
pub struct Proxy<T: Injectable> {
    target: Arc<T>,
    component: Arc<str>,
    declared_type: TypeInfo,
    chains: HashMap<&'static str, Arc<AdviceChain>>,
}

impl<T: Injectable> std::fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("component", &self.component)
            .field("target", &type_name::<T>())
            .field("advised", &self.chains.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<T: Injectable> Proxy<T> {
    pub(crate) fn new(target: Arc<T>, parts: ProxyParts) -> Self {
        Self {
            target,
            component: parts.component,
            declared_type: parts.declared_type,
            chains: parts.chains,
        }
    }

    /// The undecorated component
    pub fn target(&self) -> &Arc<T> {
        &self.target
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn is_advised(&self, method: &str) -> bool {
        self.chains.contains_key(method)
    }

    /// Calls `method` on the target through its advice chain
    ///
    /// `args` are what advice sees of the call, `call` performs the real call.
    /// Methods without matching advice call straight through.
    pub fn invoke<R: Payload + Clone>(
        &self,
        method: &'static str,
        args: Vec<Value>,
        call: impl FnOnce(&T) -> Result<R, DynError>,
    ) -> Result<R, AdviceChainError> {
        let Some(chain) = self.chains.get(method) else {
            return call(&self.target).map_err(|cause| AdviceChainError::raised(method, cause));
        };

        let target: &T = &self.target;
        let site = CallSite {
            component: &self.component,
            declared_type: self.declared_type,
            target,
            method: &chain.method,
            args: &args,
        };
        let real: Proceed<'_> = Box::new(move || call(target).map(Value::new));

        let value = chain
            .execute(&site, real)
            .map_err(|cause| AdviceChainError::raised(method, cause))?;
        value
            .take::<R>()
            .map_err(|substituted| AdviceChainError::ReturnTypeMismatch {
                method,
                expected_type: type_name::<R>(),
                actual_type: substituted.type_name(),
            })
    }
}
