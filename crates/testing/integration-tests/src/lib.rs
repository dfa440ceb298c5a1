//! Integration test utilities for scope-memoized values

use anyhow::Result;
use clet_resolve::{DeclarationError, Example, ResolverConfig, ScopeId, ScopeTree};
use indexmap::IndexMap;
use std::cell::Cell;
use std::rc::Rc;

/// Counter handing out consecutive numbers, one per evaluation
#[derive(Debug, Clone)]
pub struct Counter {
    next: Rc<Cell<u32>>,
    evaluations: Rc<Cell<u32>>,
}

impl Counter {
    /// Creates a counter whose first value is `start`
    #[must_use]
    pub fn starting_at(start: u32) -> Self {
        Self {
            next: Rc::new(Cell::new(start)),
            evaluations: Rc::new(Cell::new(0)),
        }
    }

    /// A computation returning the next number each time it runs
    pub fn computation(&self) -> impl Fn(&mut Example<'_, u32>) -> Result<u32> + 'static {
        let next = Rc::clone(&self.next);
        let evaluations = Rc::clone(&self.evaluations);
        move |_| {
            let value = next.get();
            next.set(value + 1);
            evaluations.set(evaluations.get() + 1);
            Ok(value)
        }
    }

    /// How many times any computation of this counter has run
    #[must_use]
    pub fn evaluations(&self) -> u32 {
        self.evaluations.get()
    }
}

/// Test fixture helper: a scope tree with groups addressable by label
pub struct Suite {
    /// The tree under test
    pub tree: ScopeTree<u32>,
    /// Groups created so far, by label
    groups: IndexMap<String, ScopeId>,
}

impl Suite {
    /// Creates a suite holding only the root scope
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Creates a suite with an explicit resolver configuration
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            tree: ScopeTree::with_config(config),
            groups: IndexMap::new(),
        }
    }

    /// The root scope
    #[must_use]
    pub fn root(&self) -> ScopeId {
        self.tree.root()
    }

    /// Creates a group under `parent` and remembers it by `label`
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is not part of the suite's tree
    pub fn describe(&mut self, parent: ScopeId, label: &str) -> Result<ScopeId, DeclarationError> {
        let scope = self.tree.create_child(parent, label)?;
        self.groups.insert(label.to_string(), scope);
        Ok(scope)
    }

    /// Looks up a group created with [`Suite::describe`]
    #[must_use]
    pub fn group(&self, label: &str) -> Option<ScopeId> {
        self.groups.get(label).copied()
    }

    /// Labels of all groups, in creation order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Runs one example at `scope` and returns what its body produced
    ///
    /// # Errors
    ///
    /// Returns whatever error the example body returns.
    pub fn run<T>(
        &mut self,
        scope: ScopeId,
        description: &str,
        body: impl FnOnce(&mut Example<'_, u32>) -> Result<T>,
    ) -> Result<T> {
        let mut example = self.tree.example(scope, description);
        body(&mut example)
    }

    /// Runs one example at `scope` that only reads `name`
    ///
    /// # Errors
    ///
    /// Returns the read failure, if any.
    pub fn read(&mut self, scope: ScopeId, name: &str) -> Result<u32> {
        self.run(scope, name, |example| Ok(*example.get(name)?))
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}
