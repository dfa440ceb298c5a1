//! Memo entries for declared names

use crate::example::Example;
use std::fmt;
use std::rc::Rc;

/// Procedure producing a declared value
///
/// It runs against the example that first reads the name, so it can read
/// other names visible from that example's scope.
pub type Computation<V> = Rc<dyn Fn(&mut Example<'_, V>) -> anyhow::Result<V>>;

/// Cached-or-pending state of one name on one scope
///
/// The only transition during a run is `Unevaluated` to `Evaluated`, made by
/// the first successful read.
pub enum MemoEntry<V> {
    /// Not read yet, or every read so far failed
    Unevaluated(Computation<V>),
    /// Shared by every example under the declaring scope
    Evaluated(Rc<V>),
}

impl<V> MemoEntry<V> {
    /// Whether a value has been cached
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        matches!(self, Self::Evaluated(_))
    }

    /// The cached value, if any
    #[must_use]
    pub fn value(&self) -> Option<&Rc<V>> {
        match self {
            Self::Evaluated(value) => Some(value),
            Self::Unevaluated(_) => None,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for MemoEntry<V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unevaluated(_) => formatter.write_str("Unevaluated"),
            Self::Evaluated(value) => formatter.debug_tuple("Evaluated").field(value).finish(),
        }
    }
}
