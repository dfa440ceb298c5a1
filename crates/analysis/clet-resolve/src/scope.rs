//! Scope tree holding declarations and their memo tables

use crate::config::{RedeclarationPolicy, ResolverConfig};
use crate::error::{DeclarationError, ResolveError};
use crate::example::Example;
use crate::hierarchy::ScopeHierarchy;
use crate::memo::{Computation, MemoEntry};
use clet_intern::{Interner, Symbol};
use la_arena::{Arena, Idx, RawIdx};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Unique identifier for a scope
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ScopeId(u32);

impl ScopeId {
    /// Build an identifier from its raw index
    ///
    /// Identifiers built this way are checked against the tree on use.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw index of this scope within its tree
    #[must_use]
    pub const fn into_raw(self) -> u32 {
        self.0
    }

    fn from_idx<V>(idx: Idx<ScopeData<V>>) -> Self {
        Self(u32::from(idx.into_raw()))
    }

    fn to_idx<V>(self) -> Idx<ScopeData<V>> {
        Idx::from_raw(RawIdx::from(self.0))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "scope #{}", self.0)
    }
}

/// Which table of a scope a declaration lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Store {
    /// Memoized on the declaring scope, shared by every example beneath it
    Shared,
    /// Memoized separately by each example that reads it
    Local,
}

/// A named computation waiting to be registered on a scope
pub struct Declaration<V> {
    name: String,
    computation: Option<Computation<V>>,
}

impl<V> Declaration<V> {
    /// Start a declaration of `name` with no computation yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            computation: None,
        }
    }

    /// Attach the procedure that produces the value
    #[must_use]
    pub fn computed_by<F>(mut self, computation: F) -> Self
    where
        F: Fn(&mut Example<'_, V>) -> anyhow::Result<V> + 'static,
    {
        let computation: Computation<V> = Rc::new(computation);
        self.computation = Some(computation);
        self
    }

    /// Attach an already shared computation
    #[must_use]
    pub fn with_computation(mut self, computation: Computation<V>) -> Self {
        self.computation = Some(computation);
        self
    }

    /// The declared name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a computation has been attached
    pub fn has_computation(&self) -> bool {
        self.computation.is_some()
    }
}

/// A single scope in the scope tree
pub(crate) struct ScopeData<V> {
    /// Parent scope (None for the root)
    parent: Option<ScopeId>,
    /// Label the host gave this scope
    description: String,
    /// Values memoized on this scope
    memo: FxHashMap<Symbol, MemoEntry<V>>,
    /// Per-example values declared on this scope
    locals: FxHashMap<Symbol, Computation<V>>,
}

impl<V> ScopeData<V> {
    fn new(parent: Option<ScopeId>, description: String) -> Self {
        Self {
            parent,
            description,
            memo: FxHashMap::default(),
            locals: FxHashMap::default(),
        }
    }

    fn declares(&self, store: Store, name: Symbol) -> bool {
        match store {
            Store::Shared => self.memo.contains_key(&name),
            Store::Local => self.locals.contains_key(&name),
        }
    }
}

/// Tree of test-grouping scopes and the values declared on them
///
/// The tree is built first (scopes and declarations), then examples read
/// from it. The only mutation while examples run is a memo entry moving from
/// unevaluated to evaluated.
pub struct ScopeTree<V> {
    scopes: Arena<ScopeData<V>>,
    interner: Interner,
    root: ScopeId,
    config: ResolverConfig,
}

impl<V: 'static> ScopeTree<V> {
    /// Create a tree holding only an unnamed root scope
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a tree with an explicit configuration
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        let mut scopes = Arena::default();
        let root = ScopeId::from_idx(scopes.alloc(ScopeData::new(None, String::new())));

        Self {
            scopes,
            interner: Interner::new(),
            root,
            config,
        }
    }

    /// The top-level scope
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Configuration this tree was built with
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Number of scopes, root included
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Whether `scope` was created by this tree
    pub fn contains(&self, scope: ScopeId) -> bool {
        (scope.0 as usize) < self.scopes.len()
    }

    /// Create a child scope under `parent`
    ///
    /// # Errors
    ///
    /// Returns `DeclarationError::UnknownScope` if `parent` does not belong to
    /// this tree; nothing is allocated in that case.
    pub fn create_child(
        &mut self,
        parent: ScopeId,
        description: impl Into<String>,
    ) -> Result<ScopeId, DeclarationError> {
        if !self.contains(parent) {
            return Err(DeclarationError::UnknownScope { scope: parent });
        }
        let description = description.into();
        let scope = ScopeId::from_idx(
            self.scopes
                .alloc(ScopeData::new(Some(parent), description)),
        );
        debug!(%scope, %parent, "created scope");
        Ok(scope)
    }

    /// Label given to `scope` when it was created
    pub fn description(&self, scope: ScopeId) -> Option<&str> {
        self.data(scope).map(|data| data.description.as_str())
    }

    /// Descriptions from the root down to `scope`, space separated
    ///
    /// Scopes with an empty description (such as the default root) are
    /// skipped.
    pub fn path(&self, scope: ScopeId) -> String {
        let mut labels: Vec<&str> = self
            .ancestors(scope)
            .filter_map(|ancestor| self.description(ancestor))
            .filter(|label| !label.is_empty())
            .collect();
        labels.reverse();
        labels.join(" ")
    }

    /// Declare `name` on `scope`, memoized on that scope
    ///
    /// # Errors
    ///
    /// See [`ScopeTree::register`].
    pub fn declare<F>(&mut self, scope: ScopeId, name: &str, computation: F) -> Result<(), DeclarationError>
    where
        F: Fn(&mut Example<'_, V>) -> anyhow::Result<V> + 'static,
    {
        self.register(scope, Declaration::new(name).computed_by(computation))
    }

    /// Declare `name` on `scope`, memoized separately by each example
    ///
    /// # Errors
    ///
    /// See [`ScopeTree::register`].
    pub fn declare_local<F>(&mut self, scope: ScopeId, name: &str, computation: F) -> Result<(), DeclarationError>
    where
        F: Fn(&mut Example<'_, V>) -> anyhow::Result<V> + 'static,
    {
        self.register_local(scope, Declaration::new(name).computed_by(computation))
    }

    /// Register a declaration whose value is memoized on `scope`
    ///
    /// Registering a name the scope already declares replaces the
    /// computation and resets the entry to unevaluated, unless the
    /// configuration rejects redeclaration.
    ///
    /// # Errors
    ///
    /// Returns `DeclarationError::UnknownScope` if `scope` is foreign,
    /// `DeclarationError::EmptyName` for a blank name,
    /// `DeclarationError::MissingComputation` if no computation is attached,
    /// and `DeclarationError::Duplicate` when redeclaration is rejected.
    pub fn register(&mut self, scope: ScopeId, declaration: Declaration<V>) -> Result<(), DeclarationError> {
        let (symbol, computation) = self.admit(scope, Store::Shared, declaration)?;
        let name = self.interner.resolve(symbol);
        let memo = &mut self.scopes[scope.to_idx()].memo;

        match memo.entry(symbol) {
            Entry::Occupied(mut occupied) => {
                let was_evaluated = occupied.get().is_evaluated();
                occupied.insert(MemoEntry::Unevaluated(computation));
                debug!(%scope, name, was_evaluated, "redeclared value");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MemoEntry::Unevaluated(computation));
                debug!(%scope, name, "declared value");
            }
        }
        Ok(())
    }

    /// Register a declaration whose value each example memoizes for itself
    ///
    /// # Errors
    ///
    /// Same as [`ScopeTree::register`].
    pub fn register_local(&mut self, scope: ScopeId, declaration: Declaration<V>) -> Result<(), DeclarationError> {
        let (symbol, computation) = self.admit(scope, Store::Local, declaration)?;
        self.scopes[scope.to_idx()].locals.insert(symbol, computation);
        debug!(%scope, name = self.interner.resolve(symbol), "declared local value");
        Ok(())
    }

    /// Validate a declaration and intern its name
    ///
    /// On success `scope` is known to belong to this tree.
    fn admit(
        &mut self,
        scope: ScopeId,
        store: Store,
        declaration: Declaration<V>,
    ) -> Result<(Symbol, Computation<V>), DeclarationError> {
        let Declaration { name, computation } = declaration;

        if !self.contains(scope) {
            return Err(DeclarationError::UnknownScope { scope });
        }
        if name.trim().is_empty() {
            return Err(DeclarationError::EmptyName { scope });
        }
        let Some(computation) = computation else {
            return Err(DeclarationError::MissingComputation { name, scope });
        };

        let symbol = self.interner.intern(&name);
        let already_declared = self
            .data(scope)
            .is_some_and(|data| data.declares(store, symbol));
        if already_declared && self.config.redeclaration == RedeclarationPolicy::Reject {
            return Err(DeclarationError::Duplicate { name, scope });
        }

        Ok((symbol, computation))
    }

    /// Find the nearest scope, starting at `start`, that declares `name`
    ///
    /// Only `start` and its ancestors are searched, never siblings.
    pub fn find_owning_scope(&self, start: ScopeId, name: &str) -> Option<ScopeId> {
        let symbol = self.interner.get(name)?;
        self.owner_of(start, Store::Shared, symbol)
    }

    /// Whether `name` has a cached value on exactly `scope`
    ///
    /// Ancestors are not consulted.
    pub fn is_evaluated(&self, scope: ScopeId, name: &str) -> bool {
        self.interner
            .get(name)
            .and_then(|symbol| self.entry(scope, symbol))
            .is_some_and(MemoEntry::is_evaluated)
    }

    /// Names memoized on exactly `scope`, sorted
    pub fn declared_names(&self, scope: ScopeId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .data(scope)
            .map(|data| {
                data.memo
                    .keys()
                    .map(|symbol| self.interner.resolve(*symbol))
                    .collect()
            })
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Start an example run at `scope`
    pub fn example(&mut self, scope: ScopeId, description: impl Into<String>) -> Example<'_, V> {
        Example::new(self, scope, description.into())
    }

    /// Read `name` from `scope` outside of any named example
    ///
    /// # Errors
    ///
    /// Same as [`Example::get`].
    pub fn read(&mut self, scope: ScopeId, name: &str) -> Result<Rc<V>, ResolveError> {
        self.example(scope, String::new()).get(name)
    }

    fn data(&self, scope: ScopeId) -> Option<&ScopeData<V>> {
        self.contains(scope).then(|| &self.scopes[scope.to_idx()])
    }

    fn data_mut(&mut self, scope: ScopeId) -> Option<&mut ScopeData<V>> {
        if self.contains(scope) {
            Some(&mut self.scopes[scope.to_idx()])
        } else {
            None
        }
    }

    pub(crate) fn symbol(&self, name: &str) -> Option<Symbol> {
        self.interner.get(name)
    }

    pub(crate) fn name_of(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol)
    }

    pub(crate) fn owner_of(&self, start: ScopeId, store: Store, symbol: Symbol) -> Option<ScopeId> {
        self.ancestors(start).find(|scope| {
            self.data(*scope)
                .is_some_and(|data| data.declares(store, symbol))
        })
    }

    pub(crate) fn entry(&self, scope: ScopeId, symbol: Symbol) -> Option<&MemoEntry<V>> {
        self.data(scope).and_then(|data| data.memo.get(&symbol))
    }

    pub(crate) fn local_computation(&self, scope: ScopeId, symbol: Symbol) -> Option<Computation<V>> {
        self.data(scope)
            .and_then(|data| data.locals.get(&symbol))
            .map(Rc::clone)
    }

    /// Cache the value of `symbol` on `scope`
    pub(crate) fn settle(&mut self, scope: ScopeId, symbol: Symbol, value: Rc<V>) {
        if let Some(entry) = self.data_mut(scope).and_then(|data| data.memo.get_mut(&symbol)) {
            *entry = MemoEntry::Evaluated(value);
        }
    }

    /// Every name of `store` visible from `start`, shadowed ones included
    pub(crate) fn visible_names(&self, start: ScopeId, store: Store) -> Vec<&str> {
        let mut names = Vec::new();
        for scope in self.ancestors(start) {
            let Some(data) = self.data(scope) else {
                continue;
            };
            match store {
                Store::Shared => names.extend(data.memo.keys().map(|symbol| self.interner.resolve(*symbol))),
                Store::Local => names.extend(data.locals.keys().map(|symbol| self.interner.resolve(*symbol))),
            }
        }
        names
    }
}

impl<V: 'static> ScopeHierarchy for ScopeTree<V> {
    fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.data(scope).and_then(|data| data.parent)
    }
}

impl<V: 'static> Default for ScopeTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ScopeTree<V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ScopeTree")
            .field("scopes", &self.scopes.len())
            .field("names", &self.interner.len())
            .field("root", &self.root)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: u32) -> impl Fn(&mut Example<'_, u32>) -> anyhow::Result<u32> + 'static {
        move |_| Ok(value)
    }

    #[test]
    fn test_tree_starts_with_root() {
        let tree: ScopeTree<u32> = ScopeTree::new();
        assert_eq!(tree.scope_count(), 1);
        assert!(tree.contains(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.description(tree.root()), Some(""));
    }

    #[test]
    fn test_children_point_at_parents() {
        let mut tree: ScopeTree<u32> = ScopeTree::new();
        let root = tree.root();
        let outer = tree.create_child(root, "Account").expect("create Account");
        let inner = tree.create_child(outer, "when overdrawn").expect("create when overdrawn");
        let sibling = tree.create_child(root, "Ledger").expect("create Ledger");

        assert_eq!(tree.parent(inner), Some(outer));
        assert_eq!(tree.parent(outer), Some(root));
        assert_eq!(tree.ancestors(inner).collect::<Vec<_>>(), vec![inner, outer, root]);
        assert_eq!(tree.ancestors(sibling).collect::<Vec<_>>(), vec![sibling, root]);
        assert_eq!(tree.path(inner), "Account when overdrawn");
    }

    #[test]
    fn test_create_child_rejects_foreign_parent() {
        let mut tree: ScopeTree<u32> = ScopeTree::new();
        // The next free slot: accepting it would make the scope its own parent
        let next_slot = ScopeId::from_raw(1);
        assert_eq!(
            tree.create_child(next_slot, "orphan"),
            Err(DeclarationError::UnknownScope { scope: next_slot })
        );
        assert_eq!(tree.scope_count(), 1);

        let child = tree.create_child(tree.root(), "child").expect("create child");
        assert_eq!(child, next_slot);
        assert_eq!(tree.ancestors(child).collect::<Vec<_>>(), vec![child, tree.root()]);
    }

    #[test]
    fn test_find_owning_scope_nearest_first() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let group = tree.create_child(root, "group").expect("create group");
        let nested = tree.create_child(group, "nested").expect("create nested");

        tree.declare(root, "count", constant(0)).expect("declare on root");
        assert_eq!(tree.find_owning_scope(nested, "count"), Some(root));

        tree.declare(group, "count", constant(100)).expect("declare on group");
        assert_eq!(tree.find_owning_scope(nested, "count"), Some(group));
        assert_eq!(tree.find_owning_scope(group, "count"), Some(group));
        assert_eq!(tree.find_owning_scope(root, "count"), Some(root));
    }

    #[test]
    fn test_find_owning_scope_ignores_siblings() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let left = tree.create_child(root, "left").expect("create left");
        let right = tree.create_child(root, "right").expect("create right");

        tree.declare(left, "only_left", constant(1)).expect("declare");
        assert_eq!(tree.find_owning_scope(left, "only_left"), Some(left));
        assert_eq!(tree.find_owning_scope(right, "only_left"), None);
        assert_eq!(tree.find_owning_scope(right, "never_declared"), None);
    }

    #[test]
    fn test_missing_computation_fails_fast() {
        let mut tree: ScopeTree<u32> = ScopeTree::new();
        let root = tree.root();
        let declaration = Declaration::new("count");
        assert!(!declaration.has_computation());

        let error = tree.register(root, declaration).expect_err("declaration without computation");
        assert_eq!(
            error,
            DeclarationError::MissingComputation {
                name: "count".to_string(),
                scope: root,
            }
        );
        assert_eq!(tree.find_owning_scope(root, "count"), None);
    }

    #[test]
    fn test_empty_name_and_foreign_scope() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        assert_eq!(
            tree.declare(root, "  ", constant(1)),
            Err(DeclarationError::EmptyName { scope: root })
        );

        let foreign = ScopeId::from_raw(42);
        assert_eq!(
            tree.declare(foreign, "count", constant(1)),
            Err(DeclarationError::UnknownScope { scope: foreign })
        );
    }

    #[test]
    fn test_redeclaration_overwrites_and_resets() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "count", constant(1)).expect("first declaration");
        assert_eq!(*tree.read(root, "count").expect("read"), 1);
        assert!(tree.is_evaluated(root, "count"));

        tree.declare(root, "count", constant(2)).expect("second declaration");
        assert!(!tree.is_evaluated(root, "count"));
        assert_eq!(*tree.read(root, "count").expect("read"), 2);
        assert_eq!(tree.declared_names(root), vec!["count"]);
    }

    #[test]
    fn test_redeclaration_rejected_by_config() {
        let config = ResolverConfig {
            redeclaration: RedeclarationPolicy::Reject,
            ..ResolverConfig::default()
        };
        let mut tree = ScopeTree::with_config(config);
        let root = tree.root();
        let child = tree.create_child(root, "child").expect("create child");

        tree.declare(root, "count", constant(1)).expect("first declaration");
        assert_eq!(
            tree.declare(root, "count", constant(2)),
            Err(DeclarationError::Duplicate {
                name: "count".to_string(),
                scope: root,
            })
        );
        // Shadowing in a descendant is not a redeclaration
        tree.declare(child, "count", constant(3)).expect("shadowing declaration");
        assert_eq!(*tree.read(root, "count").expect("read"), 1);
    }

    #[test]
    fn test_declared_names_sorted() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.declare(root, "zeta", constant(1)).expect("declare");
        tree.declare(root, "alpha", constant(2)).expect("declare");
        tree.declare_local(root, "local_only", constant(3)).expect("declare");

        assert_eq!(tree.declared_names(root), vec!["alpha", "zeta"]);
    }
}
