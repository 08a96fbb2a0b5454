use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::{
    descriptor::Dependency,
    errors::ResolveError,
    registry::DescriptorRegistry,
    types::TypeInfo,
};

/// Graph of all registered components
/// Used to find missing, ambiguous and circular dependencies without building anything
pub struct DependencyGraph {
    map: BTreeMap<String, DependencyGraphEntry>,
}

struct DependencyGraphEntry {
    name: String,
    info: TypeInfo,
    edges: Vec<Edge>,
}

enum Edge {
    Resolved(String),
    Unresolved {
        dependency: Dependency,
        cause: ResolveError,
    },
}

impl DependencyGraph {
    pub fn from_registry(registry: &DescriptorRegistry) -> Self {
        let map = registry
            .descriptors()
            .map(|descriptor| {
                let edges = descriptor
                    .dependencies()
                    .filter_map(|dependency| match registry.find_dependency(dependency) {
                        Ok(target) => Some(Edge::Resolved(target.name().to_owned())),
                        // Absent optional dependencies are fine
                        Err(cause) if dependency.optional && cause.is_not_found() => None,
                        Err(cause) => Some(Edge::Unresolved {
                            dependency: dependency.clone(),
                            cause,
                        }),
                    })
                    .collect();

                let entry = DependencyGraphEntry {
                    name: descriptor.name().to_owned(),
                    info: descriptor.declared_type(),
                    edges,
                };
                (entry.name.clone(), entry)
            })
            .collect();

        Self { map }
    }

    /// Names of the components `name` directly depends on
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<&str>> {
        self.map.get(name).map(|entry| {
            entry
                .edges
                .iter()
                .filter_map(|edge| match edge {
                    Edge::Resolved(target) => Some(target.as_str()),
                    Edge::Unresolved { .. } => None,
                })
                .collect()
        })
    }

    pub fn type_of(&self, name: &str) -> Option<TypeInfo> {
        self.map.get(name).map(|entry| entry.info)
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        for entry in self.map.values() {
            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut dependency_chain,
                entry,
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse<'g>(
            graph: &'g DependencyGraph,
            checked: &mut HashSet<&'g str>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<&'g str>,
            entry: &'g DependencyGraphEntry,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain
                .iter()
                .position(|name| *name == entry.name)
            {
                let mut chain: Vec<String> = dependency_chain[start..]
                    .iter()
                    .map(|name| name.to_string())
                    .collect();
                chain.push(entry.name.clone()); // Add current so chain is complete

                errors.push(DependencyGraphError::CircularDependency {
                    from: chain[0].clone(),
                    to: dependency_chain[dependency_chain.len() - 1].to_owned(),
                    chain,
                });
            }

            // Skip other checks if already checked
            if !checked.insert(entry.name.as_str()) {
                return;
            };

            dependency_chain.push(&entry.name);

            for edge in &entry.edges {
                match edge {
                    Edge::Resolved(target) => {
                        if let Some(next_entry) = graph.map.get(target) {
                            check_recurse(graph, checked, errors, dependency_chain, next_entry);
                        }
                    }
                    Edge::Unresolved { dependency, cause } => {
                        errors.push(DependencyGraphError::Unresolvable {
                            dependency: dependency.clone(),
                            required_by: entry.name.clone(),
                            cause: cause.clone(),
                        });
                    }
                }
            }

            dependency_chain.pop();
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("'{required_by}' needs '{dependency}' but it cannot be resolved: {cause}")]
    Unresolvable {
        dependency: Dependency,
        required_by: String,
        cause: ResolveError,
    },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {chain:?}")]
    CircularDependency {
        from: String,
        to: String,
        chain: Vec<String>,
    },
}

impl DependencyGraphError {
    /// The component the issue was found on
    pub fn component(&self) -> &str {
        match self {
            Self::Unresolvable { required_by, .. } => required_by,
            Self::CircularDependency { from, .. } => from,
        }
    }
}

impl From<DependencyGraphError> for ResolveError {
    fn from(value: DependencyGraphError) -> Self {
        match value {
            DependencyGraphError::Unresolvable { cause, .. } => cause,
            DependencyGraphError::CircularDependency { chain, .. } => {
                ResolveError::CyclicDependency { chain }
            }
        }
    }
}

impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::descriptor::ComponentDescriptor;

    struct A;
    struct B;
    struct C;

    fn registry(descriptors: Vec<ComponentDescriptor>) -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        for descriptor in descriptors {
            registry.register(descriptor).unwrap();
        }
        registry
    }

    #[test]
    fn cycle_is_reported_once() {
        let registry = registry(vec![
            ComponentDescriptor::builder::<A>("a")
                .constructor(|_: Arc<B>| A)
                .build(),
            ComponentDescriptor::builder::<B>("b")
                .constructor(|_: Arc<A>| B)
                .build(),
        ]);

        let errors = DependencyGraph::from_registry(&registry).check().unwrap_err().errors;
        assert_eq!(errors.len(), 1);
        let DependencyGraphError::CircularDependency { chain, .. } = &errors[0] else {
            panic!("expected a cycle");
        };
        assert_eq!(chain, &vec!["a", "b", "a"]);
    }

    #[test]
    fn missing_and_ambiguous_are_aggregated() {
        let registry = registry(vec![
            ComponentDescriptor::builder::<A>("a")
                .constructor(|_: Arc<C>, _: Arc<String>| A)
                .build(),
            ComponentDescriptor::instance("c1", C),
            ComponentDescriptor::instance("c2", C),
            ComponentDescriptor::builder::<B>("b")
                .constructor(|_: Option<Arc<u64>>| B)
                .build(),
        ]);

        let errors = DependencyGraph::from_registry(&registry).check().unwrap_err();
        assert_eq!(errors.errors.len(), 2);
        assert!(errors.errors.iter().all(|error| error.component() == "a"));
        assert!(matches!(
            ResolveError::from(errors.errors[0].clone()),
            ResolveError::Ambiguous { .. }
        ));
        assert!(errors.to_string().starts_with("The dependency graph had"));
    }

    #[test]
    fn satisfied_graph_passes() {
        let registry = registry(vec![
            ComponentDescriptor::instance("c", C),
            ComponentDescriptor::builder::<B>("b")
                .constructor(|_: Arc<C>| B)
                .build(),
            ComponentDescriptor::builder::<A>("a")
                .constructor(|_: Arc<B>, _: Arc<C>| A)
                .build(),
        ]);
        let graph = DependencyGraph::from_registry(&registry);
        assert!(graph.check().is_ok());
        assert_eq!(graph.dependencies_of("a"), Some(vec!["b", "c"]));
    }
}
