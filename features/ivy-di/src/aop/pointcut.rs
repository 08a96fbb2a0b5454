use std::{any::TypeId, fmt::Debug, sync::Arc};

use crate::types::TypeInfo;

/// Name and marker tags of an interceptable method
///
/// Tags play the role of method annotations: a pointcut can select every
/// method carrying e.g. `"to_log"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    name: &'static str,
    tags: &'static [&'static str],
}

impl MethodSignature {
    pub const fn new(name: &'static str) -> Self {
        Self { name, tags: &[] }
    }

    pub const fn tagged(self, tags: &'static [&'static str]) -> Self {
        Self {
            name: self.name,
            tags,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tags(&self) -> &'static [&'static str] {
        self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|own| *own == tag)
    }
}

/// What a pointcut is matched against, besides the method itself
#[derive(Debug, Clone, Copy)]
pub struct PointcutTarget<'a> {
    /// Name of the component
    pub component: &'a str,
    /// Concrete type of the component
    pub declared_type: TypeInfo,
    /// The type the component is being called through
    pub capability: TypeInfo,
}

type Matcher = Arc<dyn Fn(&PointcutTarget<'_>, &MethodSignature) -> bool + Send + Sync>;

/// Predicate selecting the join points an advice applies to
#[derive(Clone)]
pub struct Pointcut {
    description: String,
    matcher: Matcher,
}

impl Debug for Pointcut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Pointcut").field(&self.description).finish()
    }
}

impl std::fmt::Display for Pointcut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

impl Pointcut {
    pub fn custom(
        description: impl Into<String>,
        matcher: impl Fn(&PointcutTarget<'_>, &MethodSignature) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            matcher: Arc::new(matcher),
        }
    }

    /// Every method of every advisable capability
    pub fn any() -> Self {
        Self::custom("any()", |_, _| true)
    }

    /// Methods with the given name
    pub fn method(name: &'static str) -> Self {
        Self::custom(format!("method({name})"), move |_, method| {
            method.name() == name
        })
    }

    /// Methods carrying the given tag
    pub fn annotated(tag: &'static str) -> Self {
        Self::custom(format!("annotated({tag})"), move |_, method| method.has_tag(tag))
    }

    /// Methods of the component with the given name
    pub fn component(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::custom(format!("component({name})"), move |target, _| {
            target.component == name
        })
    }

    /// Methods called on a `T`, either the concrete type or the capability
    pub fn within<T: ?Sized + 'static>() -> Self {
        let type_id = TypeId::of::<T>();
        Self::custom(
            format!("within({})", std::any::type_name::<T>()),
            move |target, _| {
                target.declared_type.type_id == type_id || target.capability.type_id == type_id
            },
        )
    }

    pub fn and(self, other: Pointcut) -> Self {
        let description = format!("({} && {})", self.description, other.description);
        Self::custom(description, move |target, method| {
            self.matches(target, method) && other.matches(target, method)
        })
    }

    pub fn or(self, other: Pointcut) -> Self {
        let description = format!("({} || {})", self.description, other.description);
        Self::custom(description, move |target, method| {
            self.matches(target, method) || other.matches(target, method)
        })
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        let description = format!("!{}", self.description);
        Self::custom(description, move |target, method| {
            !self.matches(target, method)
        })
    }

    pub fn matches(&self, target: &PointcutTarget<'_>, method: &MethodSignature) -> bool {
        (self.matcher)(target, method)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
