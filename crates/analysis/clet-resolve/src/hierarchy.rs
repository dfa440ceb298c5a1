//! Read access to the parent chain of a scope

use crate::ScopeId;

/// Provider of the scope hierarchy an example runs in
///
/// Only parent links are required; everything the resolver needs is derived
/// from walking them.
pub trait ScopeHierarchy {
    /// Parent of `scope`, or `None` for the root and for unknown scopes
    fn parent(&self, scope: ScopeId) -> Option<ScopeId>;

    /// Iterate `start` and then each of its ancestors, nearest first
    fn ancestors(&self, start: ScopeId) -> Ancestors<'_, Self> {
        Ancestors {
            hierarchy: self,
            next: Some(start),
        }
    }
}

/// Iterator over a scope and its ancestors, ending at the root
#[derive(Debug)]
pub struct Ancestors<'tree, H: ?Sized> {
    hierarchy: &'tree H,
    next: Option<ScopeId>,
}

impl<H: ScopeHierarchy + ?Sized> Iterator for Ancestors<'_, H> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<ScopeId> {
        let current = self.next?;
        self.next = self.hierarchy.parent(current);
        Some(current)
    }
}
