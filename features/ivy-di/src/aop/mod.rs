//! Method interception for components exposed through capability traits

mod advice;
mod joinpoint;
mod pointcut;
mod proxy;
mod weaver;

pub use advice::{
    Advice, AdviceBinding, AdviceKind, AfterFn, AfterThrowingFn, AroundFn, BeforeFn,
};
pub use joinpoint::JoinPoint;
pub use pointcut::{MethodSignature, Pointcut, PointcutTarget};
pub use proxy::Proxy;
pub use weaver::ProxyWeaver;

pub(crate) use proxy::ProxyParts;
