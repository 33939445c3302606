//! Recipes: requirement options and result options for a crafted item.
//!
//! A recipe owns its options and refers to components and essences by id
//! only. Options are set through [`OptionInput`], which accepts either a
//! built value or the deprecated flat record shape.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::debug;

use crate::combination::CombinationError;
use crate::item_data::{ItemData, ItemDataLoader};
use crate::options::{
    OptionConfig, OptionInput, OptionJson, Options, OptionsError, SelectableOption,
};
use crate::output::{RecipeOutput, RecipeOutputJson};
use crate::requirement::{Requirement, RequirementJson};
use crate::substitution::IdSubstitutions;

/// Recipe error types.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// A clone was requested onto the recipe's own id.
    #[error("Cannot clone recipe {0} onto its own id")]
    SelfClone(String),

    /// An option id was supplied that the recipe does not have.
    #[error("Recipe {recipe_id} has no {kind} option with id \"{option_id}\"")]
    OptionNotFound {
        /// Recipe id
        recipe_id: String,
        /// "requirement" or "result"
        kind: &'static str,
        /// Supplied option id
        option_id: String,
    },

    /// An option failed to build.
    #[error("Recipe {recipe_id}: {source}")]
    Options {
        /// Recipe id
        recipe_id: String,
        /// Underlying options error
        #[source]
        source: OptionsError,
    },

    /// Id substitution failed during a clone.
    #[error("Failed to substitute ids while cloning recipe: {0}")]
    Substitution(#[from] CombinationError),
}

/// Result type for recipe operations.
pub type RecipeResult<T> = Result<T, RecipeError>;

/// Persisted requirement option.
pub type RequirementOptionJson = OptionJson<RequirementJson>;

/// Persisted result option.
pub type ResultOptionJson = OptionJson<RecipeOutputJson>;

/// Input accepted by [`Recipe::set_requirement_option`].
pub type RequirementOptionInput = OptionInput<RequirementJson, Requirement>;

/// Input accepted by [`Recipe::set_result_option`].
pub type ResultOptionInput = OptionInput<RecipeOutputJson, RecipeOutput>;

/// Persisted recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeJson {
    /// Recipe id
    pub id: String,
    /// Shipped with the module rather than user-created
    #[serde(default)]
    pub embedded: bool,
    /// Uuid of the host item describing the recipe
    pub item_uuid: String,
    /// Disabled recipes cannot be crafted
    #[serde(default)]
    pub disabled: bool,
    /// Owning crafting system
    pub crafting_system_id: String,
    /// Result options by id
    #[serde(default)]
    pub result_options: BTreeMap<String, ResultOptionJson>,
    /// Requirement options by id
    #[serde(default)]
    pub requirement_options: BTreeMap<String, RequirementOptionJson>,
}

/// Parameters for [`Recipe::clone_with`].
#[derive(Debug, Clone, Default)]
pub struct RecipeCloneParams {
    /// Id of the copy; must differ from the source id
    pub id: String,
    /// Target crafting system; `None` keeps the source system
    pub crafting_system_id: Option<String>,
    /// Id replacements applied to every option
    pub substitutions: IdSubstitutions,
}

impl RecipeCloneParams {
    /// Clone into the same crafting system without substitutions.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Targets another crafting system.
    #[must_use]
    pub fn into_system(mut self, crafting_system_id: impl Into<String>) -> Self {
        self.crafting_system_id = Some(crafting_system_id.into());
        self
    }

    /// Applies id substitutions.
    #[must_use]
    pub fn with_substitutions(mut self, substitutions: IdSubstitutions) -> Self {
        self.substitutions = substitutions;
        self
    }
}

/// A crafting recipe.
#[derive(Debug, Clone)]
pub struct Recipe {
    id: String,
    crafting_system_id: String,
    item_uuid: String,
    embedded: bool,
    disabled: bool,
    item_data: ItemData,
    requirement_options: Options<Requirement>,
    result_options: Options<RecipeOutput>,
}

impl Recipe {
    /// Creates an enabled, user-defined recipe with no options.
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
            requirement_options: Options::new(),
            result_options: Options::new(),
        }
    }

    /// Marks the recipe as embedded.
    #[must_use]
    pub fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    /// Replaces the requirement options wholesale.
    #[must_use]
    pub fn with_requirement_options(mut self, options: Options<Requirement>) -> Self {
        self.requirement_options = options;
        self
    }

    /// Replaces the result options wholesale.
    #[must_use]
    pub fn with_result_options(mut self, options: Options<RecipeOutput>) -> Self {
        self.result_options = options;
        self
    }

    /// Recipe id.
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

    /// Enables the recipe.
    pub fn enable(&mut self) {
        self.disabled = false;
    }

    /// Disables the recipe.
    pub fn disable(&mut self) {
        self.disabled = true;
    }

    /// Current item data.
    #[must_use]
    pub const fn item_data(&self) -> &ItemData {
        &self.item_data
    }

    /// True once item data has been fetched.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.item_data.is_loaded()
    }

    /// Item name, once loaded.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.item_data.name()
    }

    /// Item image, once loaded.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.item_data.image_url()
    }

    /// Fetches item data unless already loaded and `force_reload` is false.
    pub fn load_item_data(&mut self, loader: &dyn ItemDataLoader, force_reload: bool) -> &ItemData {
        self.item_data.ensure_loaded(&self.item_uuid, loader, force_reload)
    }

    /// Requirement options.
    #[must_use]
    pub const fn requirement_options(&self) -> &Options<Requirement> {
        &self.requirement_options
    }

    /// Result options.
    #[must_use]
    pub const fn result_options(&self) -> &Options<RecipeOutput> {
        &self.result_options
    }

    /// True if any requirement option exists.
    #[must_use]
    pub fn has_requirement_options(&self) -> bool {
        !self.requirement_options.is_empty()
    }

    /// True if any result option exists.
    #[must_use]
    pub fn has_result_options(&self) -> bool {
        !self.result_options.is_empty()
    }

    /// Requirement option by id.
    #[must_use]
    pub fn get_requirement_option(&self, id: &str) -> Option<&SelectableOption<Requirement>> {
        self.requirement_options.get(id)
    }

    /// Result option by id.
    #[must_use]
    pub fn get_result_option(&self, id: &str) -> Option<&SelectableOption<RecipeOutput>> {
        self.result_options.get(id)
    }

    /// Creates or replaces a requirement option, returning its id.
    ///
    /// An id, when supplied, must name an existing option.
    pub fn set_requirement_option(
        &mut self,
        input: impl Into<RequirementOptionInput>,
    ) -> RecipeResult<String> {
        let config = input
            .into()
            .resolve(Requirement::from_json)
            .map_err(|source| self.options_error(source))?;
        self.ensure_existing("requirement", &config, |id| self.requirement_options.has(id))?;
        let id = self.requirement_options.set(config);
        debug!(recipe_id = %self.id, option_id = %id, "Set requirement option");
        Ok(id)
    }

    /// Creates or replaces a result option, returning its id.
    ///
    /// An id, when supplied, must name an existing option.
    pub fn set_result_option(
        &mut self,
        input: impl Into<ResultOptionInput>,
    ) -> RecipeResult<String> {
        let config = input
            .into()
            .resolve(RecipeOutput::from_json)
            .map_err(|source| self.options_error(source))?;
        self.ensure_existing("result", &config, |id| self.result_options.has(id))?;
        let id = self.result_options.set(config);
        debug!(recipe_id = %self.id, option_id = %id, "Set result option");
        Ok(id)
    }

    /// Deletes a requirement option. Absent ids are ignored.
    pub fn delete_requirement_option_by_id(
        &mut self,
        id: &str,
    ) -> Option<SelectableOption<Requirement>> {
        self.requirement_options.remove(id)
    }

    /// Deletes a result option. Absent ids are ignored.
    pub fn delete_result_option_by_id(
        &mut self,
        id: &str,
    ) -> Option<SelectableOption<RecipeOutput>> {
        self.result_options.remove(id)
    }

    /// True if any requirement option needs essences.
    #[must_use]
    pub fn has_essences(&self) -> bool {
        self.requirement_options.values().any(Requirement::has_essences)
    }

    /// True if any requirement option needs the essence.
    #[must_use]
    pub fn uses_essence(&self, id: &str) -> bool {
        self.requirement_options
            .values()
            .any(|requirement| requirement.uses_essence(id))
    }

    /// True if the component is required or produced by any option.
    #[must_use]
    pub fn uses_component(&self, id: &str) -> bool {
        self.requirement_options
            .values()
            .any(|requirement| requirement.uses_component(id))
            || self
                .result_options
                .values()
                .any(|output| output.uses_component(id))
    }

    /// Every component id referenced by any option.
    #[must_use]
    pub fn referenced_component_ids(&self) -> BTreeSet<String> {
        let required = self.requirement_options.values().flat_map(|requirement| {
            requirement
                .catalysts()
                .ids()
                .chain(requirement.ingredients().ids())
        });
        let produced = self
            .result_options
            .values()
            .flat_map(|output| output.products().ids());
        required.chain(produced).map(str::to_string).collect()
    }

    /// Every essence id referenced by any requirement option.
    #[must_use]
    pub fn referenced_essence_ids(&self) -> BTreeSet<String> {
        self.requirement_options
            .values()
            .flat_map(|requirement| requirement.essences().ids())
            .map(str::to_string)
            .collect()
    }

    /// Drops the component from every requirement option.
    ///
    /// Result options are left untouched.
    pub fn remove_component(&mut self, id: &str) {
        self.requirement_options = self
            .requirement_options
            .clone_with(|requirement| requirement.without_component(id));
    }

    /// Drops the essence from every requirement option.
    pub fn remove_essence(&mut self, id: &str) {
        self.requirement_options = self
            .requirement_options
            .clone_with(|requirement| requirement.without_essence(id));
    }

    /// Copies the recipe under a new id, optionally into another crafting system.
    ///
    /// Item data is reset when the target system differs from the source.
    pub fn clone_with(&self, params: RecipeCloneParams) -> RecipeResult<Self> {
        if params.id == self.id {
            return Err(RecipeError::SelfClone(params.id));
        }
        let crafting_system_id = params
            .crafting_system_id
            .unwrap_or_else(|| self.crafting_system_id.clone());
        let item_data = if crafting_system_id == self.crafting_system_id {
            self.item_data.clone()
        } else {
            ItemData::NotLoaded
        };
        let substitutions = &params.substitutions;
        let requirement_options = self
            .requirement_options
            .try_clone_with(|requirement| requirement.substitute(substitutions))?;
        let result_options = self
            .result_options
            .try_clone_with(|output| output.substitute(substitutions))?;

        debug!(
            source = %self.id,
            target = %params.id,
            crafting_system_id = %crafting_system_id,
            "Cloned recipe"
        );
        Ok(Self {
            id: params.id,
            crafting_system_id,
            item_uuid: self.item_uuid.clone(),
            embedded: false,
            disabled: self.disabled,
            item_data,
            requirement_options,
            result_options,
        })
    }

    /// Compares two recipes.
    ///
    /// Identity fields are always compared; `disabled` only when
    /// `exclude_disabled` is false. Once both sides have loaded item data,
    /// item name, image and all options are compared as well.
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
                    && self.requirement_options == other.requirement_options
                    && self.result_options == other.result_options
            }
            _ => true,
        }
    }

    /// Persisted form.
    #[must_use]
    pub fn to_json(&self) -> RecipeJson {
        RecipeJson {
            id: self.id.clone(),
            embedded: self.embedded,
            item_uuid: self.item_uuid.clone(),
            disabled: self.disabled,
            crafting_system_id: self.crafting_system_id.clone(),
            result_options: self.result_options.to_json(),
            requirement_options: self.requirement_options.to_json(),
        }
    }

    /// Builds a recipe from its persisted form. Item data starts unloaded.
    pub fn from_json(json: &RecipeJson) -> RecipeResult<Self> {
        let wrap = |source| RecipeError::Options {
            recipe_id: json.id.clone(),
            source,
        };
        let requirement_options =
            Options::try_from_json(&json.requirement_options, Requirement::from_json)
                .map_err(wrap)?;
        let result_options =
            Options::try_from_json(&json.result_options, RecipeOutput::from_json).map_err(wrap)?;
        Ok(Self {
            id: json.id.clone(),
            crafting_system_id: json.crafting_system_id.clone(),
            item_uuid: json.item_uuid.clone(),
            embedded: json.embedded,
            disabled: json.disabled,
            item_data: ItemData::NotLoaded,
            requirement_options,
            result_options,
        })
    }

    fn options_error(&self, source: OptionsError) -> RecipeError {
        RecipeError::Options {
            recipe_id: self.id.clone(),
            source,
        }
    }

    fn ensure_existing<T>(
        &self,
        kind: &'static str,
        config: &OptionConfig<T>,
        exists: impl Fn(&str) -> bool,
    ) -> RecipeResult<()> {
        match &config.id {
            Some(option_id) if !exists(option_id) => Err(RecipeError::OptionNotFound {
                recipe_id: self.id.clone(),
                kind,
                option_id: option_id.clone(),
            }),
            _ => Ok(()),
        }
    }
}
