//! String interning for declared names

pub use lasso::Spur as Symbol;
use lasso::Rodeo;

/// Interner for the names declared on scopes
///
/// Declaring interns a name; reading only looks it up, so a read of a name
/// that was never declared anywhere does not grow the table.
#[derive(Debug, Default)]
pub struct Interner {
    rodeo: Rodeo,
}

impl Interner {
    /// Create an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning the existing symbol if it was seen before
    pub fn intern(&mut self, name: &str) -> Symbol {
        self.rodeo.get_or_intern(name)
    }

    /// Look up `name` without interning it
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.rodeo.get(name)
    }

    /// Get the text of an interned symbol
    #[must_use]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.rodeo.resolve(&symbol)
    }

    /// Number of distinct names interned
    #[must_use]
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Whether no name has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}
