//! Id substitution maps used when cloning entities between crafting systems.

use std::collections::BTreeMap;

/// Old-id to new-id maps for essences and components.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSubstitutions {
    /// Essence id replacements
    pub essences: BTreeMap<String, String>,
    /// Component id replacements
    pub components: BTreeMap<String, String>,
}

impl IdSubstitutions {
    /// Creates empty substitution maps.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component id replacement.
    #[must_use]
    pub fn component(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.components.insert(from.into(), to.into());
        self
    }

    /// Adds an essence id replacement.
    #[must_use]
    pub fn essence(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.essences.insert(from.into(), to.into());
        self
    }

    /// True if neither map holds a replacement.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.essences.is_empty() && self.components.is_empty()
    }
}
