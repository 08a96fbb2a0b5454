use std::sync::Arc;

use crate::{
    aop::{
        joinpoint::{CallSite, JoinPoint, Proceed},
        MethodSignature, Pointcut, PointcutTarget,
    },
    types::{DynError, Value},
};

pub type BeforeFn = Arc<dyn Fn(&JoinPoint<'_>) -> Result<(), DynError> + Send + Sync>;
pub type AfterFn = Arc<dyn Fn(&JoinPoint<'_>, &Value) -> Result<(), DynError> + Send + Sync>;
pub type AfterThrowingFn = Arc<dyn Fn(&JoinPoint<'_>, &DynError) + Send + Sync>;
pub type AroundFn = Arc<dyn Fn(&mut JoinPoint<'_>) -> Result<Value, DynError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceKind {
    Before,
    After,
    AfterThrowing,
    Around,
}

/// Behaviour woven around a matched method
#[derive(Clone)]
pub enum Advice {
    /// Runs before the call, an error aborts the call
    Before(BeforeFn),
    /// Runs after the call returned normally and sees its value
    After(AfterFn),
    /// Observes errors raised by the call, which is then propagated unchanged
    AfterThrowing(AfterThrowingFn),
    /// Wraps the call and decides whether and when to proceed
    Around(AroundFn),
}

impl std::fmt::Debug for Advice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Advice::{:?}", self.kind())
    }
}

impl Advice {
    pub fn kind(&self) -> AdviceKind {
        match self {
            Advice::Before(_) => AdviceKind::Before,
            Advice::After(_) => AdviceKind::After,
            Advice::AfterThrowing(_) => AdviceKind::AfterThrowing,
            Advice::Around(_) => AdviceKind::Around,
        }
    }
}

/// An aspect: advice applied wherever its pointcut matches
///
/// Bindings with a lower `order` run first (outermost), equal orders keep
/// registration order.
#[derive(Clone, Debug)]
pub struct AdviceBinding {
    aspect: String,
    pointcut: Pointcut,
    advice: Vec<Advice>,
    order: i32,
}

impl AdviceBinding {
    pub fn new(aspect: impl Into<String>, pointcut: Pointcut) -> Self {
        Self {
            aspect: aspect.into(),
            pointcut,
            advice: Vec::new(),
            order: 0,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn advice(mut self, advice: Advice) -> Self {
        self.advice.push(advice);
        self
    }

    pub fn before(
        self,
        advice: impl Fn(&JoinPoint<'_>) -> Result<(), DynError> + Send + Sync + 'static,
    ) -> Self {
        self.advice(Advice::Before(Arc::new(advice)))
    }

    pub fn after(
        self,
        advice: impl Fn(&JoinPoint<'_>, &Value) -> Result<(), DynError> + Send + Sync + 'static,
    ) -> Self {
        self.advice(Advice::After(Arc::new(advice)))
    }

    pub fn after_throwing(
        self,
        advice: impl Fn(&JoinPoint<'_>, &DynError) + Send + Sync + 'static,
    ) -> Self {
        self.advice(Advice::AfterThrowing(Arc::new(advice)))
    }

    pub fn around(
        self,
        advice: impl Fn(&mut JoinPoint<'_>) -> Result<Value, DynError> + Send + Sync + 'static,
    ) -> Self {
        self.advice(Advice::Around(Arc::new(advice)))
    }

    pub fn aspect(&self) -> &str {
        &self.aspect
    }

    pub fn pointcut(&self) -> &Pointcut {
        &self.pointcut
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn advices(&self) -> &[Advice] {
        &self.advice
    }
}

/// The advice applying to one method of one component, in execution order
pub(crate) struct AdviceChain {
    pub method: MethodSignature,
    befores: Vec<BeforeFn>,
    arounds: Vec<AroundFn>,
    afters: Vec<AfterFn>,
    after_throwing: Vec<AfterThrowingFn>,
}

impl AdviceChain {
    /// Collects the advice of every binding whose pointcut matches, keeping binding order
    pub fn assemble(
        bindings: &[Arc<AdviceBinding>],
        target: &PointcutTarget<'_>,
        method: &MethodSignature,
    ) -> Self {
        let mut chain = Self {
            method: *method,
            befores: Vec::new(),
            arounds: Vec::new(),
            afters: Vec::new(),
            after_throwing: Vec::new(),
        };

        let matching = bindings
            .iter()
            .filter(|binding| binding.pointcut.matches(target, method));
        for binding in matching {
            tracing::trace!(
                aspect = %binding.aspect,
                component = %target.component,
                method = method.name(),
                "Advice matched"
            );
            for advice in &binding.advice {
                match advice {
                    Advice::Before(advice) => chain.befores.push(advice.clone()),
                    Advice::After(advice) => chain.afters.push(advice.clone()),
                    Advice::AfterThrowing(advice) => chain.after_throwing.push(advice.clone()),
                    Advice::Around(advice) => chain.arounds.push(advice.clone()),
                }
            }
        }
        chain
    }

    pub fn is_empty(&self) -> bool {
        self.befores.is_empty()
            && self.arounds.is_empty()
            && self.afters.is_empty()
            && self.after_throwing.is_empty()
    }

    /// Befores, then arounds outermost first, then the real call and its after advice
    pub fn execute<'a>(&'a self, site: &'a CallSite<'a>, real: Proceed<'a>) -> Result<Value, DynError> {
        let observer = JoinPoint::observing(site);
        for before in &self.befores {
            before(&observer)?;
        }
        self.proceed_from(0, site, real)
    }

    fn proceed_from<'a>(
        &'a self,
        index: usize,
        site: &'a CallSite<'a>,
        real: Proceed<'a>,
    ) -> Result<Value, DynError> {
        let Some(around) = self.arounds.get(index) else {
            return self.complete(site, real);
        };
        let next: Proceed<'a> = Box::new(move || self.proceed_from(index + 1, site, real));
        let mut join_point = JoinPoint::proceeding(site, next);
        around(&mut join_point)
    }

    fn complete<'a>(&'a self, site: &'a CallSite<'a>, real: Proceed<'a>) -> Result<Value, DynError> {
        let observer = JoinPoint::observing(site);
        match real() {
            Ok(value) => {
                for after in &self.afters {
                    after(&observer, &value)?;
                }
                Ok(value)
            }
            Err(error) => {
                for observe in &self.after_throwing {
                    observe(&observer, &error);
                }
                Err(error)
            }
        }
    }
}
