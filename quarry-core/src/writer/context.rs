use std::collections::HashMap;

/// State threaded through a single rendering.
///
/// Function parameters receive process-wide unique names when built, the context renames them
/// `v1`, `v2`, ... in order of first appearance so that the printed text of a tree does not depend
/// on how many trees were built before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub counter: u32,
    pub variables: HashMap<String, String>,
    /// Options records are omitted when false.
    pub write_options: bool,
}

impl Context {
    pub fn new(write_options: bool) -> Self {
        Self {
            counter: 0,
            variables: HashMap::new(),
            write_options,
        }
    }

    /// Register a parameter and return its printed name.
    pub fn declare(&mut self, name: &str) -> &str {
        if !self.variables.contains_key(name) {
            self.counter += 1;
            self.variables
                .insert(name.to_string(), format!("v{}", self.counter));
        }
        self.variables
            .get(name)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Printed name of a variable, free variables keep their own name.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.variables.get(name).map(String::as_str).unwrap_or(name)
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new(true)
    }
}
