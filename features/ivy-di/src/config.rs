/// Engine settings for a [crate::Container]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Build every non lazy singleton during start
    pub eager_singletons: bool,
    /// Check the whole dependency graph during start, before anything is built
    ///
    /// Reports missing, ambiguous and circular dependencies of lazy and prototype
    /// components up front, instead of on first use.
    pub validate_graph: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            eager_singletons: true,
            validate_graph: false,
        }
    }
}

impl ContainerConfig {
    /// Only build components when they are first requested
    pub fn lazy() -> Self {
        Self {
            eager_singletons: false,
            ..Default::default()
        }
    }

    pub fn with_graph_validation(mut self, enabled: bool) -> Self {
        self.validate_graph = enabled;
        self
    }
}
