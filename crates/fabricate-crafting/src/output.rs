//! Recipe outputs: the products a result option yields.

use fabricate_common::ComponentReference;
use serde::{Deserialize, Serialize};

use crate::combination::{Combination, CombinationResult, QuantityRecord, Unit};
use crate::options::JsonSerializable;
use crate::substitution::IdSubstitutions;

/// Persisted output fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOutputJson {
    /// Components produced
    #[serde(default)]
    pub results: QuantityRecord,
}

/// The products of one result option of a recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeOutput {
    products: Combination<ComponentReference>,
}

impl RecipeOutput {
    /// An output with no products.
    pub const EMPTY: Self = Self {
        products: Combination::EMPTY,
    };

    /// Creates an output.
    #[must_use]
    pub const fn new(products: Combination<ComponentReference>) -> Self {
        Self { products }
    }

    /// Products.
    #[must_use]
    pub const fn products(&self) -> &Combination<ComponentReference> {
        &self.products
    }

    /// Replaces the products.
    #[must_use]
    pub fn with_products(self, products: Combination<ComponentReference>) -> Self {
        Self { products }
    }

    /// Adds a product unit.
    #[must_use]
    pub fn add_product(&self, unit: Unit<ComponentReference>) -> Self {
        Self::new(self.products.add_unit(unit))
    }

    /// Subtracts a product unit.
    #[must_use]
    pub fn subtract_product(&self, unit: &Unit<ComponentReference>) -> Self {
        Self::new(self.products.subtract_unit(unit))
    }

    /// True if nothing is produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// True if the component is produced.
    #[must_use]
    pub fn uses_component(&self, id: &str) -> bool {
        self.products.has(id)
    }

    /// Drops the component from the products.
    #[must_use]
    pub fn without_component(&self, id: &str) -> Self {
        Self::new(self.products.without(id))
    }

    /// Rewrites product ids using the component substitution map.
    pub fn substitute(&self, substitutions: &IdSubstitutions) -> CombinationResult<Self> {
        Ok(Self::new(self.products.substitute(&substitutions.components)?))
    }

    /// Builds an output from its persisted form.
    pub fn from_json(json: &RecipeOutputJson) -> CombinationResult<Self> {
        Ok(Self::new(Combination::from_ids(&json.results)?))
    }
}

impl JsonSerializable for RecipeOutput {
    type Json = RecipeOutputJson;

    fn to_json(&self) -> RecipeOutputJson {
        RecipeOutputJson {
            results: self.products.to_json(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(id: &str) -> ComponentReference {
        ComponentReference::new(id).expect("valid id")
    }

    #[test]
    fn test_products() {
        let output = RecipeOutput::EMPTY.add_product(Unit::new(component("ingot"), 1));
        assert!(!output.is_empty());
        assert!(output.uses_component("ingot"));
        assert!(output.without_component("ingot").is_empty());
    }

    #[test]
    fn test_json_uses_results_key() {
        let output = RecipeOutput::new(Combination::of(component("ingot"), 2));
        let json = serde_json::to_value(output.to_json()).expect("serialize");
        assert_eq!(json, serde_json::json!({ "results": { "ingot": 2 } }));
    }

    #[test]
    fn test_substitute() {
        let output = RecipeOutput::new(Combination::of(component("ingot"), 2));
        let substituted = output
            .substitute(&IdSubstitutions::new().component("ingot", "bar"))
            .expect("substitute");
        assert_eq!(substituted.products().amount_for("bar"), 2);
    }
}
