//! Recipe requirements: catalysts, ingredients and essences.

use fabricate_common::{ComponentReference, EssenceReference};
use serde::{Deserialize, Serialize};

use crate::combination::{Combination, CombinationResult, QuantityRecord, Unit};
use crate::options::JsonSerializable;
use crate::substitution::IdSubstitutions;

/// Persisted requirement fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementJson {
    /// Components needed but not consumed
    #[serde(default)]
    pub catalysts: QuantityRecord,
    /// Components consumed
    #[serde(default)]
    pub ingredients: QuantityRecord,
    /// Essences consumed
    #[serde(default)]
    pub essences: QuantityRecord,
}

/// What a recipe needs in order to be crafted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    catalysts: Combination<ComponentReference>,
    ingredients: Combination<ComponentReference>,
    essences: Combination<EssenceReference>,
}

impl Requirement {
    /// The "no requirement" value.
    pub const EMPTY: Self = Self {
        catalysts: Combination::EMPTY,
        ingredients: Combination::EMPTY,
        essences: Combination::EMPTY,
    };

    /// Creates a requirement from its three combinations.
    #[must_use]
    pub const fn new(
        catalysts: Combination<ComponentReference>,
        ingredients: Combination<ComponentReference>,
        essences: Combination<EssenceReference>,
    ) -> Self {
        Self {
            catalysts,
            ingredients,
            essences,
        }
    }

    /// Catalysts.
    #[must_use]
    pub const fn catalysts(&self) -> &Combination<ComponentReference> {
        &self.catalysts
    }

    /// Ingredients.
    #[must_use]
    pub const fn ingredients(&self) -> &Combination<ComponentReference> {
        &self.ingredients
    }

    /// Essences.
    #[must_use]
    pub const fn essences(&self) -> &Combination<EssenceReference> {
        &self.essences
    }

    /// Replaces the catalysts.
    #[must_use]
    pub fn with_catalysts(self, catalysts: Combination<ComponentReference>) -> Self {
        Self { catalysts, ..self }
    }

    /// Replaces the ingredients.
    #[must_use]
    pub fn with_ingredients(self, ingredients: Combination<ComponentReference>) -> Self {
        Self {
            ingredients,
            ..self
        }
    }

    /// Replaces the essences.
    #[must_use]
    pub fn with_essences(self, essences: Combination<EssenceReference>) -> Self {
        Self { essences, ..self }
    }

    /// Adds a catalyst unit.
    #[must_use]
    pub fn add_catalyst(&self, unit: Unit<ComponentReference>) -> Self {
        self.clone().with_catalysts(self.catalysts.add_unit(unit))
    }

    /// Adds an ingredient unit.
    #[must_use]
    pub fn add_ingredient(&self, unit: Unit<ComponentReference>) -> Self {
        self.clone().with_ingredients(self.ingredients.add_unit(unit))
    }

    /// Adds an essence unit.
    #[must_use]
    pub fn add_essence(&self, unit: Unit<EssenceReference>) -> Self {
        self.clone().with_essences(self.essences.add_unit(unit))
    }

    /// Subtracts a catalyst unit.
    #[must_use]
    pub fn subtract_catalyst(&self, unit: &Unit<ComponentReference>) -> Self {
        self.clone().with_catalysts(self.catalysts.subtract_unit(unit))
    }

    /// Subtracts an ingredient unit.
    #[must_use]
    pub fn subtract_ingredient(&self, unit: &Unit<ComponentReference>) -> Self {
        self.clone()
            .with_ingredients(self.ingredients.subtract_unit(unit))
    }

    /// Subtracts an essence unit.
    #[must_use]
    pub fn subtract_essence(&self, unit: &Unit<EssenceReference>) -> Self {
        self.clone().with_essences(self.essences.subtract_unit(unit))
    }

    /// True if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalysts.is_empty() && self.ingredients.is_empty() && self.essences.is_empty()
    }

    /// True if any catalyst is required.
    #[must_use]
    pub fn has_catalysts(&self) -> bool {
        !self.catalysts.is_empty()
    }

    /// True if any ingredient is required.
    #[must_use]
    pub fn has_ingredients(&self) -> bool {
        !self.ingredients.is_empty()
    }

    /// True if any essence is required.
    #[must_use]
    pub fn has_essences(&self) -> bool {
        !self.essences.is_empty()
    }

    /// True if the component appears as a catalyst or ingredient.
    #[must_use]
    pub fn uses_component(&self, id: &str) -> bool {
        self.catalysts.has(id) || self.ingredients.has(id)
    }

    /// True if the essence is required.
    #[must_use]
    pub fn uses_essence(&self, id: &str) -> bool {
        self.essences.has(id)
    }

    /// Drops the component from catalysts and ingredients.
    #[must_use]
    pub fn without_component(&self, id: &str) -> Self {
        Self::new(
            self.catalysts.without(id),
            self.ingredients.without(id),
            self.essences.clone(),
        )
    }

    /// Drops the essence.
    #[must_use]
    pub fn without_essence(&self, id: &str) -> Self {
        self.clone().with_essences(self.essences.without(id))
    }

    /// Rewrites referenced ids using the substitution maps.
    pub fn substitute(&self, substitutions: &IdSubstitutions) -> CombinationResult<Self> {
        Ok(Self::new(
            self.catalysts.substitute(&substitutions.components)?,
            self.ingredients.substitute(&substitutions.components)?,
            self.essences.substitute(&substitutions.essences)?,
        ))
    }

    /// Builds a requirement from its persisted form.
    pub fn from_json(json: &RequirementJson) -> CombinationResult<Self> {
        Ok(Self::new(
            Combination::from_ids(&json.catalysts)?,
            Combination::from_ids(&json.ingredients)?,
            Combination::from_ids(&json.essences)?,
        ))
    }
}

impl JsonSerializable for Requirement {
    type Json = RequirementJson;

    fn to_json(&self) -> RequirementJson {
        RequirementJson {
            catalysts: self.catalysts.to_json(),
            ingredients: self.ingredients.to_json(),
            essences: self.essences.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str) -> ComponentReference {
        ComponentReference::new(id).expect("valid id")
    }

    fn essence(id: &str) -> EssenceReference {
        EssenceReference::new(id).expect("valid id")
    }

    fn sample() -> Requirement {
        Requirement::EMPTY
            .add_catalyst(Unit::new(component("hammer"), 1))
            .add_ingredient(Unit::new(component("iron"), 2))
            .add_essence(Unit::new(essence("fire"), 1))
    }

    #[test]
    fn test_empty_requirement() {
        assert!(Requirement::EMPTY.is_empty());
        assert!(!sample().is_empty());
    }

    #[test]
    fn test_builders_do_not_mutate() {
        let base = sample();
        let more = base.add_ingredient(Unit::new(component("iron"), 1));
        assert_eq!(base.ingredients().amount_for("iron"), 2);
        assert_eq!(more.ingredients().amount_for("iron"), 3);

        let less = more.subtract_ingredient(&Unit::new(component("iron"), 3));
        assert!(!less.has_ingredients());
    }

    #[test]
    fn test_usage_queries() {
        let requirement = sample();
        assert!(requirement.uses_component("hammer"));
        assert!(requirement.uses_component("iron"));
        assert!(!requirement.uses_component("fire"));
        assert!(requirement.uses_essence("fire"));
    }

    #[test]
    fn test_without_component_and_essence() {
        let requirement = sample().without_component("hammer").without_essence("fire");
        assert!(!requirement.has_catalysts());
        assert!(!requirement.has_essences());
        assert!(requirement.has_ingredients());
    }

    #[test]
    fn test_substitute() {
        let substitutions = IdSubstitutions::new()
            .component("iron", "steel")
            .essence("fire", "flame");
        let substituted = sample().substitute(&substitutions).expect("substitute");

        assert_eq!(substituted.ingredients().amount_for("steel"), 2);
        assert!(!substituted.uses_component("iron"));
        assert!(substituted.uses_essence("flame"));
        assert!(substituted.uses_component("hammer"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(sample().to_json()).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "catalysts": { "hammer": 1 },
                "ingredients": { "iron": 2 },
                "essences": { "fire": 1 }
            })
        );

        let parsed: RequirementJson = serde_json::from_value(json).expect("parse");
        assert_eq!(Requirement::from_json(&parsed).expect("build"), sample());
    }

    #[test]
    fn test_from_json_rejects_blank_id() {
        let mut json = RequirementJson::default();
        json.ingredients.insert(String::new(), 1);
        assert!(Requirement::from_json(&json).is_err());
    }
}
