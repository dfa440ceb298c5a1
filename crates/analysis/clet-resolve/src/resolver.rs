//! Lookup, evaluation and caching of declared values

use crate::error::{ResolveError, compute_suggestions};
use crate::example::Example;
use crate::memo::{Computation, MemoEntry};
use crate::scope::{ScopeId, ScopeTree, Store};
use clet_intern::Symbol;
use std::rc::Rc;
use tracing::{debug, trace};

/// One evaluation in progress within an example
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    store: Store,
    owner: ScopeId,
    symbol: Symbol,
}

/// Read `name` through the memo table of its owning scope
pub(crate) fn read_shared<V: 'static>(example: &mut Example<'_, V>, name: &str) -> Result<Rc<V>, ResolveError> {
    let (owner, symbol) = locate(example, Store::Shared, name)?;

    let computation = match example.tree.entry(owner, symbol) {
        Some(MemoEntry::Evaluated(value)) => {
            trace!(name, %owner, "memoized value reused");
            return Ok(Rc::clone(value));
        }
        Some(MemoEntry::Unevaluated(computation)) => Rc::clone(computation),
        None => return Err(undeclared(&*example.tree, example.scope, Store::Shared, name)),
    };

    let slot = Slot {
        store: Store::Shared,
        owner,
        symbol,
    };
    let value = evaluate(example, slot, name, &computation)?;
    example.tree.settle(owner, symbol, Rc::clone(&value));
    Ok(value)
}

/// Read `name` through the example's own cache
pub(crate) fn read_local<V: 'static>(example: &mut Example<'_, V>, name: &str) -> Result<Rc<V>, ResolveError> {
    let (owner, symbol) = locate(example, Store::Local, name)?;

    if let Some(value) = example.locals.get(&symbol) {
        trace!(name, %owner, "local value reused");
        return Ok(Rc::clone(value));
    }
    let Some(computation) = example.tree.local_computation(owner, symbol) else {
        return Err(undeclared(&*example.tree, example.scope, Store::Local, name));
    };

    let slot = Slot {
        store: Store::Local,
        owner,
        symbol,
    };
    let value = evaluate(example, slot, name, &computation)?;
    example.locals.insert(symbol, Rc::clone(&value));
    Ok(value)
}

/// Find the scope owning `name` as seen from the example
fn locate<V: 'static>(example: &Example<'_, V>, store: Store, name: &str) -> Result<(ScopeId, Symbol), ResolveError> {
    let tree = &*example.tree;
    let scope = example.scope;
    if !tree.contains(scope) {
        return Err(ResolveError::UnknownScope { scope });
    }

    tree.symbol(name)
        .and_then(|symbol| tree.owner_of(scope, store, symbol).map(|owner| (owner, symbol)))
        .ok_or_else(|| undeclared(tree, scope, store, name))
}

/// Run a computation against the example that requested it
///
/// Nothing is cached here; a failure leaves the caller's entry untouched.
fn evaluate<V: 'static>(
    example: &mut Example<'_, V>,
    slot: Slot,
    name: &str,
    computation: &Computation<V>,
) -> Result<Rc<V>, ResolveError> {
    if let Some(position) = example.in_flight.iter().position(|pending| *pending == slot) {
        let chain = example.in_flight[position..]
            .iter()
            .map(|pending| example.tree.name_of(pending.symbol).to_string())
            .chain(std::iter::once(name.to_string()))
            .collect();
        return Err(ResolveError::Cycle {
            name: name.to_string(),
            chain,
        });
    }

    debug!(name, owner = %slot.owner, requester = %example.scope, store = ?slot.store, "evaluating");
    example.in_flight.push(slot);
    let outcome = computation(&mut *example);
    example.in_flight.pop();

    match outcome {
        Ok(value) => {
            debug!(name, owner = %slot.owner, "evaluated");
            Ok(Rc::new(value))
        }
        Err(source) => {
            debug!(name, owner = %slot.owner, error = %source, "evaluation failed, left unevaluated");
            Err(ResolveError::Evaluation {
                name: name.to_string(),
                scope: slot.owner,
                source,
            })
        }
    }
}

fn undeclared<V: 'static>(tree: &ScopeTree<V>, scope: ScopeId, store: Store, name: &str) -> ResolveError {
    let limits = tree.config().suggestions;
    let suggestions = compute_suggestions(
        name,
        tree.visible_names(scope, store),
        limits.max_distance,
        limits.limit,
    );

    ResolveError::UndeclaredName {
        name: name.to_string(),
        scope,
        suggestions,
    }
}
