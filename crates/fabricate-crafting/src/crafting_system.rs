//! Crafting systems: named groups of components, essences and recipes.

use fabricate_common::Identifiable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crafting system error types.
#[derive(Debug, Error)]
pub enum CraftingSystemError {
    /// A clone was requested onto the system's own id.
    #[error("Cannot clone crafting system {0} onto its own id")]
    SelfClone(String),
}

/// Result type for crafting system operations.
pub type CraftingSystemResult<T> = Result<T, CraftingSystemError>;

/// Descriptive details of a crafting system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingSystemDetails {
    /// Display name
    pub name: String,
    /// One-line summary
    #[serde(default)]
    pub summary: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Author credit
    #[serde(default)]
    pub author: String,
}

impl CraftingSystemDetails {
    /// Details with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Persisted crafting system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftingSystemJson {
    /// System id
    pub id: String,
    /// Descriptive details
    pub details: CraftingSystemDetails,
    /// Shipped with the module rather than user-created
    #[serde(default)]
    pub embedded: bool,
    /// Disabled systems are hidden from players
    #[serde(default)]
    pub disabled: bool,
}

/// A crafting system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftingSystem {
    id: String,
    details: CraftingSystemDetails,
    embedded: bool,
    disabled: bool,
}

impl CraftingSystem {
    /// Creates an enabled, user-defined system.
    #[must_use]
    pub fn new(id: impl Into<String>, details: CraftingSystemDetails) -> Self {
        Self {
            id: id.into(),
            details,
            embedded: false,
            disabled: false,
        }
    }

    /// Marks the system as shipped with the module.
    #[must_use]
    pub const fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    /// Descriptive details.
    #[must_use]
    pub const fn details(&self) -> &CraftingSystemDetails {
        &self.details
    }

    /// Replaces the details.
    pub fn set_details(&mut self, details: CraftingSystemDetails) {
        self.details = details;
    }

    /// True if shipped with the module.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.embedded
    }

    /// True if disabled.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Enables the system.
    pub fn enable(&mut self) {
        self.disabled = false;
    }

    /// Disables the system.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    /// Copies the system under a new id. Copies are never embedded.
    pub fn clone_with(&self, id: impl Into<String>) -> CraftingSystemResult<Self> {
        let id = id.into();
        if id == self.id {
            return Err(CraftingSystemError::SelfClone(id));
        }
        Ok(Self {
            id,
            details: self.details.clone(),
            embedded: false,
            disabled: self.disabled,
        })
    }

    /// Persisted form.
    #[must_use]
    pub fn to_json(&self) -> CraftingSystemJson {
        CraftingSystemJson {
            id: self.id.clone(),
            details: self.details.clone(),
            embedded: self.embedded,
            disabled: self.disabled,
        }
    }

    /// Builds a system from its persisted form.
    #[must_use]
    pub fn from_json(json: &CraftingSystemJson) -> Self {
        Self {
            id: json.id.clone(),
            details: json.details.clone(),
            embedded: json.embedded,
            disabled: json.disabled,
        }
    }
}

impl Identifiable for CraftingSystem {
    fn id(&self) -> &str {
        &self.id
    }
}
