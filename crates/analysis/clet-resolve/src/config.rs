//! Resolver configuration loaded from TOML

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Behaviour knobs for a scope tree
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverConfig {
    /// What happens when a name is declared twice on the same scope
    pub redeclaration: RedeclarationPolicy,

    /// "Did you mean" hints attached to undeclared-name errors
    pub suggestions: SuggestionConfig,
}

/// Policy for declaring a name that the same scope already declares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedeclarationPolicy {
    /// Replace the computation and reset the entry to unevaluated
    #[default]
    Overwrite,
    /// Fail the second declaration
    Reject,
}

/// Limits for undeclared-name suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SuggestionConfig {
    /// Maximum number of names suggested; zero disables suggestions
    pub limit: usize,
    /// Maximum edit distance between the read name and a suggestion
    pub max_distance: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            limit: 3,
            max_distance: 3,
        }
    }
}

impl ResolverConfig {
    /// Parse a configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or names an unknown
    /// policy.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse resolver configuration")
    }

    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resolver configuration: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse resolver configuration: {}", path.display()))
    }
}
