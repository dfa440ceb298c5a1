//! Error types for declaring and reading scoped values

use crate::ScopeId;

/// Errors raised while registering a declaration on a scope
///
/// These fail the declaration immediately instead of surfacing at read time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclarationError {
    /// The declaration did not carry a computation to evaluate
    #[error("`{name}` declared on {scope} without a computation")]
    MissingComputation {
        /// The declared name
        name: String,
        /// Scope the declaration targeted
        scope: ScopeId,
    },

    /// The declared name was empty or only whitespace
    #[error("cannot declare an empty name on {scope}")]
    EmptyName {
        /// Scope the declaration targeted
        scope: ScopeId,
    },

    /// The scope does not belong to the tree the declaration was made on
    #[error("{scope} does not belong to this scope tree")]
    UnknownScope {
        /// The foreign scope
        scope: ScopeId,
    },

    /// The name is already declared on the scope and redeclaration is rejected
    #[error("`{name}` is already declared on {scope}")]
    Duplicate {
        /// The redeclared name
        name: String,
        /// Scope holding the existing declaration
        scope: ScopeId,
    },
}

/// Errors raised while reading a declared name from an example
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No scope on the requesting scope's ancestor chain declares the name
    #[error("undeclared name `{name}` read from {scope}{}", did_you_mean(.suggestions))]
    UndeclaredName {
        /// The name that was read
        name: String,
        /// Scope the read was made from
        scope: ScopeId,
        /// Similar names visible from `scope`, closest first
        suggestions: Vec<String>,
    },

    /// Evaluating the name required evaluating itself
    #[error("cyclic evaluation of `{name}`: {}", .chain.join(" -> "))]
    Cycle {
        /// The name whose evaluation was re-entered
        name: String,
        /// Names under evaluation, outermost first, ending with `name`
        chain: Vec<String>,
    },

    /// The computation for the name failed; nothing was cached
    #[error("evaluating `{name}` declared on {scope} failed: {source}")]
    Evaluation {
        /// The name being evaluated
        name: String,
        /// Scope that declared the computation
        scope: ScopeId,
        /// The computation's failure
        source: anyhow::Error,
    },

    /// The requesting scope does not belong to the tree
    #[error("{scope} does not belong to this scope tree")]
    UnknownScope {
        /// The foreign scope
        scope: ScopeId,
    },
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let quoted: Vec<String> = suggestions.iter().map(|name| format!("`{name}`")).collect();
    format!(" (did you mean {}?)", quoted.join(", "))
}

/// Pick the names closest to `target` by edit distance
///
/// Candidates further than `max_distance` edits are dropped; ties keep
/// alphabetical order and duplicates are collapsed.
pub(crate) fn compute_suggestions<'name>(
    target: &str,
    candidates: impl IntoIterator<Item = &'name str>,
    max_distance: usize,
    limit: usize,
) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter(|candidate| *candidate != target)
        .map(|candidate| (levenshtein_distance(target, candidate), candidate))
        .filter(|(distance, _)| *distance <= max_distance)
        .collect();

    scored.sort_unstable();
    scored.dedup();
    scored
        .into_iter()
        .take(limit)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Compute Levenshtein distance between two strings
fn levenshtein_distance(source: &str, target: &str) -> usize {
    let source: Vec<char> = source.chars().collect();
    let target: Vec<char> = target.chars().collect();

    if source.is_empty() {
        return target.len();
    }
    if target.is_empty() {
        return source.len();
    }

    // Single rolling row of the edit matrix
    let mut row: Vec<usize> = (0..=target.len()).collect();
    for (idx, source_char) in source.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = idx + 1;
        for (jdx, target_char) in target.iter().enumerate() {
            let cost = usize::from(source_char != target_char);
            let next = (row[jdx + 1] + 1).min(row[jdx] + 1).min(diagonal + cost);
            diagonal = row[jdx + 1];
            row[jdx + 1] = next;
        }
    }

    row[target.len()]
}
