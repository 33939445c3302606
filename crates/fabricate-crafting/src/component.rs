//! Crafting components: items with essences that can be salvaged.

use fabricate_common::EssenceReference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::combination::{Combination, CombinationError, QuantityRecord};
use crate::item_data::{ItemData, ItemDataLoader};
use crate::options::{OptionInput, OptionJson, Options, OptionsError, SelectableOption};
use crate::salvage::{Salvage, SalvageJson};
use crate::substitution::IdSubstitutions;

/// Component error types.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// A clone was requested onto the component's own id.
    #[error("Cannot clone component {0} onto its own id")]
    SelfClone(String),

    /// A salvage option id was supplied that the component does not have.
    #[error("Component {component_id} has no salvage option with id \"{option_id}\"")]
    OptionNotFound {
        /// Component id
        component_id: String,
        /// Supplied option id
        option_id: String,
    },

    /// Essences failed to build.
    #[error("Component {component_id} has invalid essences: {source}")]
    Essences {
        /// Component id
        component_id: String,
        /// Underlying construction error
        #[source]
        source: CombinationError,
    },

    /// A salvage option failed to build.
    #[error("Component {component_id}: {source}")]
    Options {
        /// Component id
        component_id: String,
        /// Underlying options error
        #[source]
        source: OptionsError,
    },

    /// Id substitution failed during a clone.
    #[error("Failed to substitute ids while cloning component: {0}")]
    Substitution(#[from] CombinationError),
}

/// Result type for component operations.
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Persisted salvage option.
pub type SalvageOptionJson = OptionJson<SalvageJson>;

/// Input accepted by [`Component::set_salvage_option`].
pub type SalvageOptionInput = OptionInput<SalvageJson, Salvage>;

/// Persisted component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentJson {
    /// Component id
    pub id: String,
    /// Owning crafting system
    pub crafting_system_id: String,
    /// Shipped with the module rather than user-created
    #[serde(default)]
    pub embedded: bool,
    /// Disabled components are ignored by crafting
    #[serde(default)]
    pub disabled: bool,
    /// Uuid of the host item
    pub item_uuid: String,
    /// Essences the component carries
    #[serde(default)]
    pub essences: QuantityRecord,
    /// Salvage options by id
    #[serde(default)]
    pub salvage_options: BTreeMap<String, SalvageOptionJson>,
}

/// A crafting component.
#[derive(Debug, Clone)]
pub struct Component {
    id: String,
    crafting_system_id: String,
    item_uuid: String,
    embedded: bool,
    disabled: bool,
    item_data: ItemData,
    essences: Combination<EssenceReference>,
    salvage_options: Options<Salvage>,
}

impl Component {
    /// Creates an enabled, user-defined component without essences or salvage.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        crafting_system_id: impl Into<String>,
        item_uuid: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            crafting_system_id: crafting_system_id.into(),
            item_uuid: item_uuid.into(),
            embedded: false,
            disabled: false,
            item_data: ItemData::NotLoaded,
            essences: Combination::EMPTY,
            salvage_options: Options::new(),
        }
    }

    /// Marks the record as shipped with the module.
    #[must_use]
    pub const fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    /// Replaces the essences.
    #[must_use]
    pub fn with_essences(mut self, essences: Combination<EssenceReference>) -> Self {
        self.essences = essences;
        self
    }

    /// Replaces the salvage options wholesale.
    #[must_use]
    pub fn with_salvage_options(mut self, salvage_options: Options<Salvage>) -> Self {
        self.salvage_options = salvage_options;
        self
    }

    /// Component id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Owning crafting system id.
    #[must_use]
    pub fn crafting_system_id(&self) -> &str {
        &self.crafting_system_id
    }

    /// Host item uuid.
    #[must_use]
    pub fn item_uuid(&self) -> &str {
        &self.item_uuid
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

    /// Enables the component.
    pub fn enable(&mut self) {
        self.disabled = false;
    }

    /// Disables the component.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    /// Essences carried by the component.
    #[must_use]
    pub const fn essences(&self) -> &Combination<EssenceReference> {
        &self.essences
    }

    /// True if the component carries essences.
    #[must_use]
    pub fn has_essences(&self) -> bool {
        !self.essences.is_empty()
    }

    /// Salvage options.
    #[must_use]
    pub const fn salvage_options(&self) -> &Options<Salvage> {
        &self.salvage_options
    }

    /// True if any salvage option exists.
    #[must_use]
    pub fn is_salvageable(&self) -> bool {
        !self.salvage_options.is_empty()
    }

    /// Current item data.
    #[must_use]
    pub const fn item_data(&self) -> &ItemData {
        &self.item_data
    }

    /// Fetches item data unless already loaded and `force_reload` is false.
    pub fn load_item_data(&mut self, loader: &dyn ItemDataLoader, force_reload: bool) -> &ItemData {
        self.item_data.ensure_loaded(&self.item_uuid, loader, force_reload)
    }

    /// Creates or replaces a salvage option, returning its id.
    ///
    /// An id, when supplied, must name an existing option.
    pub fn set_salvage_option(
        &mut self,
        input: impl Into<SalvageOptionInput>,
    ) -> ComponentResult<String> {
        let config = input
            .into()
            .resolve(Salvage::from_json)
            .map_err(|source| ComponentError::Options {
                component_id: self.id.clone(),
                source,
            })?;
        if let Some(option_id) = &config.id {
            if !self.salvage_options.has(option_id) {
                return Err(ComponentError::OptionNotFound {
                    component_id: self.id.clone(),
                    option_id: option_id.clone(),
                });
            }
        }
        let id = self.salvage_options.set(config);
        debug!(component_id = %self.id, option_id = %id, "Set salvage option");
        Ok(id)
    }

    /// Deletes a salvage option. Absent ids are ignored.
    pub fn delete_salvage_option_by_id(&mut self, id: &str) -> Option<SelectableOption<Salvage>> {
        self.salvage_options.remove(id)
    }

    /// Drops the essence from this component.
    pub fn remove_essence(&mut self, id: &str) {
        self.essences = self.essences.without(id);
    }

    /// Drops the component from every salvage option's products and catalysts.
    pub fn remove_component(&mut self, id: &str) {
        self.salvage_options = self
            .salvage_options
            .clone_with(|salvage| salvage.without_component(id));
    }

    /// Copies the component under a new id, optionally into another crafting system.
    ///
    /// Item data is reset when the target system differs from the source.
    pub fn clone_with(
        &self,
        id: impl Into<String>,
        crafting_system_id: Option<String>,
        substitutions: &IdSubstitutions,
    ) -> ComponentResult<Self> {
        let id = id.into();
        if id == self.id {
            return Err(ComponentError::SelfClone(id));
        }
        let crafting_system_id =
            crafting_system_id.unwrap_or_else(|| self.crafting_system_id.clone());
        let item_data = if crafting_system_id == self.crafting_system_id {
            self.item_data.clone()
        } else {
            ItemData::NotLoaded
        };
        Ok(Self {
            id,
            crafting_system_id,
            item_uuid: self.item_uuid.clone(),
            embedded: false,
            disabled: self.disabled,
            item_data,
            essences: self.essences.substitute(&substitutions.essences)?,
            salvage_options: self
                .salvage_options
                .try_clone_with(|salvage| salvage.substitute(substitutions))?,
        })
    }

    /// Compares two components; see `Recipe::equals` for the two-tier rule.
    #[must_use]
    pub fn equals(&self, other: &Self, exclude_disabled: bool) -> bool {
        let same_identity = self.id == other.id
            && self.crafting_system_id == other.crafting_system_id
            && self.embedded == other.embedded
            && self.item_uuid == other.item_uuid
            && (exclude_disabled || self.disabled == other.disabled);
        if !same_identity {
            return false;
        }
        match (self.item_data.loaded(), other.item_data.loaded()) {
            (Some(ours), Some(theirs)) => {
                ours.name == theirs.name
                    && ours.image_url == theirs.image_url
                    && self.essences == other.essences
                    && self.salvage_options == other.salvage_options
            }
            _ => true,
        }
    }

    /// Persisted form.
    #[must_use]
    pub fn to_json(&self) -> ComponentJson {
        ComponentJson {
            id: self.id.clone(),
            crafting_system_id: self.crafting_system_id.clone(),
            embedded: self.embedded,
            disabled: self.disabled,
            item_uuid: self.item_uuid.clone(),
            essences: self.essences.to_json(),
            salvage_options: self.salvage_options.to_json(),
        }
    }

    /// Builds a component from its persisted form. Item data starts unloaded.
    pub fn from_json(json: &ComponentJson) -> ComponentResult<Self> {
        let essences =
            Combination::from_ids(&json.essences).map_err(|source| ComponentError::Essences {
                component_id: json.id.clone(),
                source,
            })?;
        let salvage_options = Options::try_from_json(&json.salvage_options, Salvage::from_json)
            .map_err(|source| ComponentError::Options {
                component_id: json.id.clone(),
                source,
            })?;
        Ok(Self {
            id: json.id.clone(),
            crafting_system_id: json.crafting_system_id.clone(),
            item_uuid: json.item_uuid.clone(),
            embedded: json.embedded,
            disabled: json.disabled,
            item_data: ItemData::NotLoaded,
            essences,
            salvage_options,
        })
    }
}
