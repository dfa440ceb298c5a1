//! Per-example access to declared values

use crate::error::ResolveError;
use crate::resolver::{self, Slot};
use crate::scope::{ScopeId, ScopeTree};
use clet_intern::Symbol;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// One example run, bound to the scope that declared it
///
/// The example borrows the tree for as long as it runs, so examples under a
/// tree execute one at a time. Hosts that run examples concurrently must
/// serialize access to the tree themselves.
pub struct Example<'run, V> {
    pub(crate) tree: &'run mut ScopeTree<V>,
    pub(crate) scope: ScopeId,
    description: String,
    /// Values of local declarations, cached for this example only
    pub(crate) locals: FxHashMap<Symbol, Rc<V>>,
    /// Evaluations underway, outermost first
    pub(crate) in_flight: Vec<Slot>,
}

impl<'run, V: 'static> Example<'run, V> {
    pub(crate) fn new(tree: &'run mut ScopeTree<V>, scope: ScopeId, description: String) -> Self {
        Self {
            tree,
            scope,
            description,
            locals: FxHashMap::default(),
            in_flight: Vec::new(),
        }
    }

    /// Scope the example was declared in
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    /// The example's own description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Enclosing scope descriptions followed by the example's own
    pub fn full_description(&self) -> String {
        let path = self.tree.path(self.scope);
        match (path.is_empty(), self.description.is_empty()) {
            (true, _) => self.description.clone(),
            (false, true) => path,
            (false, false) => format!("{path} {}", self.description),
        }
    }

    /// Read-only view of the tree the example runs in
    pub fn tree(&self) -> &ScopeTree<V> {
        &*self.tree
    }

    /// Read a value memoized on its declaring scope
    ///
    /// The nearest scope declaring `name` owns the value. The first read
    /// under that scope evaluates it against this example; every later read
    /// from any example under the scope gets the same allocation back.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::UndeclaredName` if no scope on this example's
    /// ancestor chain declares `name`, `ResolveError::Evaluation` if the
    /// computation fails (the entry stays unevaluated, so a later read
    /// retries), `ResolveError::Cycle` if evaluating `name` reads `name`
    /// again, and `ResolveError::UnknownScope` if the example's scope is not
    /// part of the tree.
    pub fn get(&mut self, name: &str) -> Result<Rc<V>, ResolveError> {
        resolver::read_shared(self, name)
    }

    /// Read a value memoized by this example alone
    ///
    /// Local declarations follow the same nearest-scope lookup as
    /// [`Example::get`], but each example evaluates them once for itself.
    /// They are stored apart from scope-memoized values, so a name declared
    /// both ways keeps two independent values.
    ///
    /// # Errors
    ///
    /// Same as [`Example::get`].
    pub fn local(&mut self, name: &str) -> Result<Rc<V>, ResolveError> {
        resolver::read_local(self, name)
    }
}
