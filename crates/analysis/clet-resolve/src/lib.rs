//! Scope-memoized values for nested test groups
//!
//! A test framework groups examples into nested scopes. Any scope may
//! declare a named value; an example reading that name gets the value of the
//! nearest enclosing declaration. Unlike a per-example lazy local, the value
//! is cached on the declaring scope, so every example beneath it shares a
//! single evaluation.
//!
//! # Architecture
//!
//! - **Scope tree**: scopes with parent links, each owning a memo table
//! - **Resolver**: nearest-first lookup, evaluate-once, and caching
//! - **Examples**: the per-example accessors that trigger reads
//! - **Errors**: declaration failures and read failures
//!
//! # Usage
//!
//! ```rust
//! use clet_resolve::ScopeTree;
//!
//! let mut tree: ScopeTree<u32> = ScopeTree::new();
//! let root = tree.root();
//! let group = tree.create_child(root, "group").unwrap();
//! tree.declare(root, "answer", |_| Ok(42)).unwrap();
//!
//! let mut example = tree.example(group, "reads the answer");
//! assert_eq!(*example.get("answer").unwrap(), 42);
//! ```

pub mod config;
pub mod error;
pub mod example;
pub mod hierarchy;
pub mod memo;
mod resolver;
pub mod scope;

pub use config::{RedeclarationPolicy, ResolverConfig, SuggestionConfig};
pub use error::{DeclarationError, ResolveError};
pub use example::Example;
pub use hierarchy::{Ancestors, ScopeHierarchy};
pub use memo::{Computation, MemoEntry};
pub use scope::{Declaration, ScopeId, ScopeTree};
