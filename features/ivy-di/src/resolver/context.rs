use crate::errors::ResolveError;

/// The chain of components currently being built on one resolution path
///
/// Created per top level request and threaded through recursive resolution,
/// so concurrent requests never see each other's paths.
#[derive(Debug, Default)]
pub struct ResolutionContext {
    path: Vec<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `name`, failing if it is already being built on this path
    pub fn enter(&mut self, name: &str) -> Result<(), ResolveError> {
        if let Some(start) = self.path.iter().position(|entry| entry == name) {
            let mut chain = self.path[start..].to_vec();
            chain.push(name.to_owned());
            return Err(ResolveError::CyclicDependency { chain });
        }
        self.path.push(name.to_owned());
        Ok(())
    }

    pub fn exit(&mut self) {
        self.path.pop();
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reentering_reports_the_loop_only() {
        let mut context = ResolutionContext::new();
        context.enter("root").unwrap();
        context.enter("a").unwrap();
        context.enter("b").unwrap();

        let Err(ResolveError::CyclicDependency { chain }) = context.enter("a") else {
            panic!("cycle not detected");
        };
        assert_eq!(chain, vec!["a", "b", "a"]);
        assert_eq!(context.depth(), 3);
    }

    #[test]
    fn exit_allows_diamonds() {
        let mut context = ResolutionContext::new();
        context.enter("top").unwrap();
        context.enter("shared").unwrap();
        context.exit();
        context.enter("shared").unwrap();
        assert_eq!(context.path(), ["top", "shared"]);
    }
}
