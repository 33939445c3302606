//! Essences: abstract qualities carried by components and required by recipes.

use fabricate_common::Identifiable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Essence error types.
#[derive(Debug, Error)]
pub enum EssenceError {
    /// A clone was requested onto the essence's own id.
    #[error("Cannot clone essence {0} onto its own id")]
    SelfClone(String),
}

/// Result type for essence operations.
pub type EssenceResult<T> = Result<T, EssenceError>;

/// Persisted essence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssenceJson {
    /// Essence id
    pub id: String,
    /// Disabled essences are ignored by crafting
    #[serde(default)]
    pub disabled: bool,
    /// Display name
    pub name: String,
    /// Short hover text
    #[serde(default)]
    pub tooltip: String,
    /// Font icon class
    #[serde(default)]
    pub icon_code: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Owning crafting system
    pub crafting_system_id: String,
    /// Shipped with the module rather than user-created
    #[serde(default)]
    pub embedded: bool,
    /// Item whose active effect this essence applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_effect_source_item_uuid: Option<String>,
}

/// An essence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Essence {
    id: String,
    crafting_system_id: String,
    name: String,
    tooltip: String,
    icon_code: String,
    description: String,
    embedded: bool,
    disabled: bool,
    active_effect_source_item_uuid: Option<String>,
}

impl Essence {
    /// Creates an enabled, user-defined essence.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        crafting_system_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            crafting_system_id: crafting_system_id.into(),
            name: name.into(),
            tooltip: String::new(),
            icon_code: String::new(),
            description: String::new(),
            embedded: false,
            disabled: false,
            active_effect_source_item_uuid: None,
        }
    }

    /// Marks the record as shipped with the module.
    #[must_use]
    pub const fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    /// Sets the tooltip.
    #[must_use]
    pub fn with_tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    /// Sets the icon code.
    #[must_use]
    pub fn with_icon_code(mut self, icon_code: impl Into<String>) -> Self {
        self.icon_code = icon_code.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the active effect source item.
    #[must_use]
    pub fn with_active_effect_source(mut self, item_uuid: impl Into<String>) -> Self {
        self.active_effect_source_item_uuid = Some(item_uuid.into());
        self
    }

    /// Owning crafting system id.
    #[must_use]
    pub fn crafting_system_id(&self) -> &str {
        &self.crafting_system_id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tooltip.
    #[must_use]
    pub fn tooltip(&self) -> &str {
        &self.tooltip
    }

    /// Icon code.
    #[must_use]
    pub fn icon_code(&self) -> &str {
        &self.icon_code
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
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

    /// Enables the essence.
    pub fn enable(&mut self) {
        self.disabled = false;
    }

    /// Disables the essence.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    /// Active effect source item uuid.
    #[must_use]
    pub fn active_effect_source_item_uuid(&self) -> Option<&str> {
        self.active_effect_source_item_uuid.as_deref()
    }

    /// True if the essence applies an active effect.
    #[must_use]
    pub fn has_active_effect_source(&self) -> bool {
        self.active_effect_source_item_uuid.is_some()
    }

    /// Copies the essence under a new id, optionally into another crafting system.
    pub fn clone_with(
        &self,
        id: impl Into<String>,
        crafting_system_id: Option<String>,
    ) -> EssenceResult<Self> {
        let id = id.into();
        if id == self.id {
            return Err(EssenceError::SelfClone(id));
        }
        Ok(Self {
            id,
            crafting_system_id: crafting_system_id
                .unwrap_or_else(|| self.crafting_system_id.clone()),
            embedded: false,
            ..self.clone()
        })
    }

    /// Persisted form.
    #[must_use]
    pub fn to_json(&self) -> EssenceJson {
        EssenceJson {
            id: self.id.clone(),
            disabled: self.disabled,
            name: self.name.clone(),
            tooltip: self.tooltip.clone(),
            icon_code: self.icon_code.clone(),
            description: self.description.clone(),
            crafting_system_id: self.crafting_system_id.clone(),
            embedded: self.embedded,
            active_effect_source_item_uuid: self.active_effect_source_item_uuid.clone(),
        }
    }

    /// Builds an essence from its persisted form.
    #[must_use]
    pub fn from_json(json: &EssenceJson) -> Self {
        Self {
            id: json.id.clone(),
            crafting_system_id: json.crafting_system_id.clone(),
            name: json.name.clone(),
            tooltip: json.tooltip.clone(),
            icon_code: json.icon_code.clone(),
            description: json.description.clone(),
            embedded: json.embedded,
            disabled: json.disabled,
            active_effect_source_item_uuid: json.active_effect_source_item_uuid.clone(),
        }
    }
}

impl Identifiable for Essence {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let essence = Essence::new("fire", "alchemy", "Fire")
            .with_tooltip("Hot")
            .with_icon_code("fas fa-fire")
            .with_active_effect_source("Item.burning");
        let value = serde_json::to_value(essence.to_json()).expect("serialize");
        assert_eq!(value["iconCode"], "fas fa-fire");
        assert_eq!(value["activeEffectSourceItemUuid"], "Item.burning");

        let parsed: EssenceJson = serde_json::from_value(value).expect("parse");
        assert_eq!(Essence::from_json(&parsed), essence);
    }

    #[test]
    fn test_clone_with() {
        let essence = Essence::new("fire", "alchemy", "Fire");
        assert!(matches!(
            essence.clone_with("fire", None),
            Err(EssenceError::SelfClone(id)) if id == "fire"
        ));

        let copy = essence
            .clone_with("fire-2", Some("alchemy-2".to_string()))
            .expect("clone");
        assert_eq!(copy.id(), "fire-2");
        assert_eq!(copy.crafting_system_id(), "alchemy-2");
        assert_eq!(copy.name(), "Fire");
    }

    #[test]
    fn test_enable_disable() {
        let mut essence = Essence::new("fire", "alchemy", "Fire");
        essence.disable();
        assert!(essence.is_disabled());
        essence.enable();
        assert!(!essence.is_disabled());
        assert!(!essence.has_active_effect_source());
    }
}
