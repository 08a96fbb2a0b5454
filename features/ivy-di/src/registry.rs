use std::{collections::HashMap, sync::Arc};

use crate::{
    aop::AdviceBinding,
    descriptor::{ComponentDescriptor, Dependency},
    errors::ResolveError,
    types::TypeInfo,
};

/// Holds all component descriptors and advice bindings
///
/// Descriptors keep their registration order, which is the order of eager
/// construction and of [DescriptorRegistry::find_by_type] results.
#[derive(Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<String, Arc<ComponentDescriptor>>,
    order: Vec<String>,
    bindings: Vec<Arc<AdviceBinding>>,
}

impl std::fmt::Debug for DescriptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorRegistry")
            .field("components", &self.order)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: ComponentDescriptor,
    ) -> Result<Arc<ComponentDescriptor>, ResolveError> {
        if self.descriptors.contains_key(descriptor.name()) {
            return Err(ResolveError::DuplicateName(descriptor.name().to_owned()));
        }
        tracing::trace!(
            component = %descriptor.name(),
            declared_type = %descriptor.declared_type(),
            "Registered"
        );

        let descriptor = Arc::new(descriptor);
        self.order.push(descriptor.name().to_owned());
        self.descriptors
            .insert(descriptor.name().to_owned(), descriptor.clone());
        Ok(descriptor)
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<ComponentDescriptor>> {
        let removed = self.descriptors.remove(name)?;
        self.order.retain(|registered| registered != name);
        Some(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<ComponentDescriptor>> {
        self.order
            .iter()
            .filter_map(|name| self.descriptors.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Arc<ComponentDescriptor>, ResolveError> {
        self.descriptors
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::NameNotFound(name.to_owned()))
    }

    /// Every descriptor that can be looked up as `type_info`
    pub fn find_by_type(&self, type_info: TypeInfo) -> Vec<Arc<ComponentDescriptor>> {
        self.descriptors()
            .filter(|descriptor| descriptor.provides(type_info))
            .cloned()
            .collect()
    }

    /// Picks the single candidate for `type_info`
    ///
    /// With several candidates exactly one of them has to be primary.
    pub fn select_by_type(
        &self,
        type_info: TypeInfo,
    ) -> Result<Arc<ComponentDescriptor>, ResolveError> {
        let mut candidates = self.find_by_type(type_info);
        match candidates.len() {
            0 => Err(ResolveError::TypeNotFound(type_info)),
            1 => Ok(candidates.remove(0)),
            _ => {
                let mut primaries = candidates.iter().filter(|candidate| candidate.is_primary());
                match (primaries.next(), primaries.next()) {
                    (Some(primary), None) => Ok(primary.clone()),
                    _ => Err(ResolveError::Ambiguous {
                        requested: type_info,
                        candidates: candidates
                            .iter()
                            .map(|candidate| candidate.name().to_owned())
                            .collect(),
                    }),
                }
            }
        }
    }

    /// The component named `name`, if it provides `type_info`
    pub fn find_named(
        &self,
        name: &str,
        type_info: TypeInfo,
    ) -> Result<Arc<ComponentDescriptor>, ResolveError> {
        let descriptor = self.find_by_name(name)?;
        if !descriptor.provides(type_info) {
            return Err(ResolveError::TypeMismatch {
                component: name.to_owned(),
                required_type: type_info.type_name,
                actual_type: descriptor.declared_type().type_name,
            });
        }
        Ok(descriptor)
    }

    /// The descriptor satisfying `dependency`, by name if it carries one
    pub fn find_dependency(
        &self,
        dependency: &Dependency,
    ) -> Result<Arc<ComponentDescriptor>, ResolveError> {
        match &dependency.name {
            Some(name) => self.find_named(name, dependency.type_info),
            None => self.select_by_type(dependency.type_info),
        }
    }

    /// Adds a binding, keeping bindings sorted by order and then by registration
    pub fn add_binding(&mut self, binding: AdviceBinding) {
        tracing::trace!(aspect = %binding.aspect(), order = binding.order(), "Advice bound");
        self.bindings.push(Arc::new(binding));
        // Stable, so equal orders keep registration order
        self.bindings.sort_by_key(|binding| binding.order());
    }

    pub fn advice_bindings(&self) -> &[Arc<AdviceBinding>] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aop::Pointcut;

    #[derive(Debug)]
    struct Parrot(&'static str);

    fn parrots() -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        registry
            .register(ComponentDescriptor::instance("parrot1", Parrot("Koko")))
            .unwrap();
        registry
            .register(ComponentDescriptor::instance("parrot2", Parrot("Miki")))
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = parrots();
        let error = registry
            .register(ComponentDescriptor::instance("parrot1", Parrot("Riki")))
            .unwrap_err();
        assert!(matches!(error, ResolveError::DuplicateName(name) if name == "parrot1"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn several_candidates_without_primary_are_ambiguous() {
        let registry = parrots();
        let Err(ResolveError::Ambiguous { candidates, .. }) =
            registry.select_by_type(TypeInfo::of::<Parrot>())
        else {
            panic!("expected ambiguity");
        };
        assert_eq!(candidates, vec!["parrot1", "parrot2"]);
        assert_eq!(
            registry
                .find_dependency(&Dependency::on::<Parrot>().named("parrot2"))
                .unwrap()
                .name(),
            "parrot2"
        );
    }

    #[test]
    fn single_primary_wins() {
        let mut registry = parrots();
        registry
            .register(ComponentDescriptor::instance("parrot3", Parrot("Riki")).into_primary())
            .unwrap();
        let selected = registry.select_by_type(TypeInfo::of::<Parrot>()).unwrap();
        assert_eq!(selected.name(), "parrot3");
    }

    #[test]
    fn two_primaries_are_still_ambiguous() {
        let mut registry = DescriptorRegistry::new();
        for name in ["a", "b"] {
            registry
                .register(ComponentDescriptor::instance(name, Parrot(name)).into_primary())
                .unwrap();
        }
        assert!(matches!(
            registry.select_by_type(TypeInfo::of::<Parrot>()),
            Err(ResolveError::Ambiguous { .. })
        ));
    }

    #[test]
    fn named_lookup_checks_the_type() {
        let registry = parrots();
        assert!(matches!(
            registry.find_named("parrot1", TypeInfo::of::<String>()),
            Err(ResolveError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.find_named("parrot9", TypeInfo::of::<Parrot>()),
            Err(ResolveError::NameNotFound(_))
        ));
        assert!(registry.find_by_type(TypeInfo::of::<String>()).is_empty());
    }

    #[test]
    fn unregister_keeps_order_of_the_rest() {
        let mut registry = parrots();
        assert!(registry.unregister("parrot1").is_some());
        assert!(registry.unregister("parrot1").is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["parrot2"]);
    }

    #[test]
    fn bindings_are_sorted_by_order() {
        let mut registry = DescriptorRegistry::new();
        registry.add_binding(AdviceBinding::new("late", Pointcut::any()).with_order(10));
        registry.add_binding(AdviceBinding::new("first", Pointcut::any()).with_order(-1));
        registry.add_binding(AdviceBinding::new("second", Pointcut::any()).with_order(10));
        let aspects: Vec<_> = registry
            .advice_bindings()
            .iter()
            .map(|binding| binding.aspect())
            .collect();
        assert_eq!(aspects, vec!["first", "late", "second"]);
    }
}
