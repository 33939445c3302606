//! Migration from the V2 crafting systems blob to V3 entity stores.
//!
//! V2 kept every crafting system in one setting, with its essences, components
//! and recipes nested underneath and options keyed by name. V3 splits them into
//! four [`EntityDataStore`]s with reverse-lookup collections and gives every
//! option an id.
//!
//! All four stores are computed before anything is written. V2 and V3 share the
//! crafting systems key, so that store is written last, followed by the model
//! version stamp. An interrupted run leaves the V2 blob and the V2 version in
//! place and can simply be repeated.

use fabricate_common::{ComponentReference, EssenceReference, IdentityFactory, ModelVersion};
use fabricate_crafting::{
    Combination, CombinationError, Component, ComponentJson, CraftingSystem,
    CraftingSystemDetails, CraftingSystemJson, Essence, EssenceJson, OptionConfig, Options,
    QuantityRecord, Recipe, RecipeJson, RecipeOutput, Requirement, Salvage,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::MigrationConfig;
use crate::entity_store::{collection_key, EntityDataStore};
use crate::migration::{MigrationError, MigrationResult, SettingMigrationStep};
use crate::store::{SettingsStore, SettingsStoreExt};

/// Name of the requirement option created for recipes that only required essences.
pub const ESSENCES_ONLY_OPTION_NAME: &str = "Essences only";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct V2Details {
    name: String,
    summary: String,
    description: String,
    author: String,
}

impl From<V2Details> for CraftingSystemDetails {
    fn from(details: V2Details) -> Self {
        Self {
            name: details.name,
            summary: details.summary,
            description: details.description,
            author: details.author,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Essence {
    name: String,
    #[serde(default)]
    tooltip: String,
    #[serde(default)]
    icon_code: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    active_effect_source_item_uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Component {
    item_uuid: String,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    essences: QuantityRecord,
    #[serde(default)]
    salvage_options: BTreeMap<String, QuantityRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct V2IngredientOption {
    catalysts: QuantityRecord,
    ingredients: QuantityRecord,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V2Recipe {
    item_uuid: String,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    essences: QuantityRecord,
    #[serde(default)]
    ingredient_options: BTreeMap<String, V2IngredientOption>,
    #[serde(default)]
    result_options: BTreeMap<String, QuantityRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct V2Parts {
    essences: BTreeMap<String, V2Essence>,
    components: BTreeMap<String, V2Component>,
    recipes: BTreeMap<String, V2Recipe>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct V2CraftingSystem {
    #[serde(default)]
    details: V2Details,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    parts: V2Parts,
}

/// The four V3 stores produced by the migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct V3Stores {
    /// Crafting systems.
    pub crafting_systems: EntityDataStore<CraftingSystemJson>,
    /// Essences, filed by crafting system and active effect source item.
    pub essences: EntityDataStore<EssenceJson>,
    /// Components, filed by crafting system and item.
    pub components: EntityDataStore<ComponentJson>,
    /// Recipes, filed by crafting system and item.
    pub recipes: EntityDataStore<RecipeJson>,
}

/// Migrates V2 settings to V3.
#[derive(Debug)]
pub struct V2ToV3Step<F> {
    config: MigrationConfig,
    ids: F,
}

impl<F: IdentityFactory> V2ToV3Step<F> {
    /// Creates the step. `ids` supplies ids for options, which V2 did not have.
    #[must_use]
    pub fn new(config: MigrationConfig, ids: F) -> Self {
        Self { config, ids }
    }

    /// Builds the V3 stores from the V2 crafting systems setting.
    ///
    /// Embedded systems are skipped before they are parsed.
    pub fn convert(&self, source: Option<Value>) -> MigrationResult<V3Stores> {
        let systems = self.read_source(source)?;
        let mut stores = V3Stores::default();

        for (id, value) in systems {
            if self.config.is_embedded(&id) {
                info!("Skipping embedded crafting system {id}");
                continue;
            }
            let system: V2CraftingSystem =
                serde_json::from_value(value).map_err(|e| MigrationError::Entity {
                    kind: "crafting system",
                    id: id.clone(),
                    source: Box::new(e),
                })?;
            self.convert_system(&id, system, &mut stores)?;
        }

        Ok(stores)
    }

    fn source_error(&self, reason: impl Into<String>) -> MigrationError {
        MigrationError::SourceShape {
            key: self.config.keys.crafting_systems.clone(),
            reason: reason.into(),
        }
    }

    fn read_source(&self, source: Option<Value>) -> MigrationResult<Map<String, Value>> {
        let Some(source) = source else {
            info!("No V2 crafting systems found");
            return Ok(Map::new());
        };
        let Value::Object(mut setting) = source else {
            return Err(self.source_error("expected an object with \"version\" and \"value\""));
        };
        match setting.get("version") {
            Some(Value::String(version)) => {
                debug!("Reading crafting systems blob version {version}");
            }
            _ => return Err(self.source_error("missing \"version\"")),
        }
        match setting.remove("value") {
            Some(Value::Object(systems)) => Ok(systems),
            Some(_) => Err(self.source_error("\"value\" is not an object")),
            None => Err(self.source_error("missing \"value\"")),
        }
    }

    fn convert_system(
        &self,
        id: &str,
        system: V2CraftingSystem,
        stores: &mut V3Stores,
    ) -> MigrationResult<()> {
        info!(
            crafting_system_id = id,
            essences = system.parts.essences.len(),
            components = system.parts.components.len(),
            recipes = system.parts.recipes.len(),
            "Migrating crafting system"
        );
        let prefixes = &self.config.collections;
        let system_key = collection_key(&prefixes.crafting_system, id);

        let mut crafting_system = CraftingSystem::new(id, system.details.into());
        if !system.enabled {
            crafting_system.disable();
        }
        stores
            .crafting_systems
            .insert(id, crafting_system.to_json(), Vec::new());

        for (essence_id, v2) in system.parts.essences {
            let mut essence = Essence::new(essence_id.as_str(), id, v2.name)
                .with_tooltip(v2.tooltip)
                .with_icon_code(v2.icon_code)
                .with_description(v2.description);
            ensure_unique(&stores.essences, "essence", &essence_id, id)?;
            let mut keys = vec![system_key.clone()];
            if let Some(item_uuid) = v2.active_effect_source_item_uuid {
                keys.push(collection_key(&prefixes.item, &item_uuid));
                essence = essence.with_active_effect_source(item_uuid);
            }
            stores.essences.insert(essence_id, essence.to_json(), keys);
        }

        for (component_id, v2) in &system.parts.components {
            ensure_unique(&stores.components, "component", component_id, id)?;
            let component = self
                .convert_component(id, component_id, v2)
                .map_err(|source| MigrationError::Entity {
                    kind: "component",
                    id: component_id.clone(),
                    source: Box::new(source),
                })?;
            let keys = vec![
                system_key.clone(),
                collection_key(&prefixes.item, &v2.item_uuid),
            ];
            stores
                .components
                .insert(component_id.as_str(), component.to_json(), keys);
        }

        for (recipe_id, v2) in &system.parts.recipes {
            ensure_unique(&stores.recipes, "recipe", recipe_id, id)?;
            let recipe = self
                .convert_recipe(id, recipe_id, v2)
                .map_err(|source| MigrationError::Entity {
                    kind: "recipe",
                    id: recipe_id.clone(),
                    source: Box::new(source),
                })?;
            let keys = vec![
                system_key.clone(),
                collection_key(&prefixes.item, &v2.item_uuid),
            ];
            stores.recipes.insert(recipe_id.as_str(), recipe.to_json(), keys);
        }

        Ok(())
    }

    fn convert_component(
        &self,
        crafting_system_id: &str,
        id: &str,
        v2: &V2Component,
    ) -> Result<Component, CombinationError> {
        let mut salvage_options = Options::new();
        for (name, results) in &v2.salvage_options {
            let salvage = Salvage::new(
                Combination::<ComponentReference>::from_ids(results)?,
                Combination::EMPTY,
            );
            salvage_options.set(OptionConfig::new(name.as_str(), salvage).with_id(self.ids.make()));
        }

        let mut component = Component::new(id, crafting_system_id, v2.item_uuid.as_str())
            .with_essences(Combination::<EssenceReference>::from_ids(&v2.essences)?)
            .with_salvage_options(salvage_options);
        if v2.disabled {
            component.disable();
        }
        Ok(component)
    }

    fn convert_recipe(
        &self,
        crafting_system_id: &str,
        id: &str,
        v2: &V2Recipe,
    ) -> Result<Recipe, CombinationError> {
        let essences = Combination::<EssenceReference>::from_ids(&v2.essences)?;

        let mut requirement_options = Options::new();
        for (name, option) in &v2.ingredient_options {
            let requirement = Requirement::new(
                Combination::from_ids(&option.catalysts)?,
                Combination::from_ids(&option.ingredients)?,
                essences.clone(),
            );
            requirement_options
                .set(OptionConfig::new(name.as_str(), requirement).with_id(self.ids.make()));
        }
        if requirement_options.is_empty() && !essences.is_empty() {
            let requirement = Requirement::default().with_essences(essences);
            requirement_options.set(
                OptionConfig::new(ESSENCES_ONLY_OPTION_NAME, requirement).with_id(self.ids.make()),
            );
        }

        let mut result_options = Options::new();
        for (name, results) in &v2.result_options {
            let output = RecipeOutput::new(Combination::from_ids(results)?);
            result_options.set(OptionConfig::new(name.as_str(), output).with_id(self.ids.make()));
        }

        let mut recipe = Recipe::new(id, crafting_system_id, v2.item_uuid.as_str())
            .with_requirement_options(requirement_options)
            .with_result_options(result_options);
        if v2.disabled {
            recipe.disable();
        }
        Ok(recipe)
    }
}

/// Migrated entities that belong to a crafting system.
trait SystemOwned {
    fn crafting_system_id(&self) -> &str;
}

impl SystemOwned for EssenceJson {
    fn crafting_system_id(&self) -> &str {
        &self.crafting_system_id
    }
}

impl SystemOwned for ComponentJson {
    fn crafting_system_id(&self) -> &str {
        &self.crafting_system_id
    }
}

impl SystemOwned for RecipeJson {
    fn crafting_system_id(&self) -> &str {
        &self.crafting_system_id
    }
}

/// Entity ids are global in V3, so a second definition would overwrite the first.
fn ensure_unique<J: SystemOwned>(
    store: &EntityDataStore<J>,
    kind: &'static str,
    id: &str,
    crafting_system_id: &str,
) -> MigrationResult<()> {
    match store.entity(id) {
        Some(existing) => Err(MigrationError::DuplicateEntity {
            kind,
            id: id.to_string(),
            crafting_system_ids: vec![
                existing.crafting_system_id().to_string(),
                crafting_system_id.to_string(),
            ],
        }),
        None => Ok(()),
    }
}

impl<F: IdentityFactory> SettingMigrationStep for V2ToV3Step<F> {
    fn source_version(&self) -> ModelVersion {
        ModelVersion::V2
    }

    fn target_version(&self) -> ModelVersion {
        ModelVersion::V3
    }

    fn description(&self) -> &str {
        "Split crafting systems into essence, component and recipe stores"
    }

    fn perform(&self, store: &mut dyn SettingsStore) -> MigrationResult<()> {
        let keys = &self.config.keys;
        let stores = self.convert(store.get(&keys.crafting_systems))?;

        info!(
            crafting_systems = stores.crafting_systems.len(),
            essences = stores.essences.len(),
            components = stores.components.len(),
            recipes = stores.recipes.len(),
            "Writing V3 stores"
        );
        store.set_as(&keys.essences, &stores.essences)?;
        store.set_as(&keys.components, &stores.components)?;
        store.set_as(&keys.recipes, &stores.recipes)?;
        store.set_as(&keys.crafting_systems, &stores.crafting_systems)?;
        store.set_as(&keys.model_version, &ModelVersion::V3)?;
        Ok(())
    }
}
