//! Salvage: what a component breaks down into.

use fabricate_common::ComponentReference;
use serde::{Deserialize, Serialize};

use crate::combination::{Combination, CombinationResult, QuantityRecord, Unit};
use crate::options::JsonSerializable;
use crate::substitution::IdSubstitutions;

/// Persisted salvage fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalvageJson {
    /// Components produced
    #[serde(default)]
    pub results: QuantityRecord,
    /// Components needed but not consumed
    #[serde(default)]
    pub catalysts: QuantityRecord,
}

/// Products and catalysts of one salvage option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Salvage {
    products: Combination<ComponentReference>,
    catalysts: Combination<ComponentReference>,
}

impl Salvage {
    /// Creates a salvage record.
    #[must_use]
    pub const fn new(
        products: Combination<ComponentReference>,
        catalysts: Combination<ComponentReference>,
    ) -> Self {
        Self {
            products,
            catalysts,
        }
    }

    /// Products.
    #[must_use]
    pub const fn products(&self) -> &Combination<ComponentReference> {
        &self.products
    }

    /// Catalysts.
    #[must_use]
    pub const fn catalysts(&self) -> &Combination<ComponentReference> {
        &self.catalysts
    }

    /// Replaces the products.
    #[must_use]
    pub fn with_products(self, products: Combination<ComponentReference>) -> Self {
        Self { products, ..self }
    }

    /// Replaces the catalysts.
    #[must_use]
    pub fn with_catalysts(self, catalysts: Combination<ComponentReference>) -> Self {
        Self { catalysts, ..self }
    }

    /// Adds a product unit.
    #[must_use]
    pub fn add_product(&self, unit: Unit<ComponentReference>) -> Self {
        self.clone().with_products(self.products.add_unit(unit))
    }

    /// Subtracts a product unit.
    #[must_use]
    pub fn subtract_product(&self, unit: &Unit<ComponentReference>) -> Self {
        self.clone().with_products(self.products.subtract_unit(unit))
    }

    /// Adds a catalyst unit.
    #[must_use]
    pub fn add_catalyst(&self, unit: Unit<ComponentReference>) -> Self {
        self.clone().with_catalysts(self.catalysts.add_unit(unit))
    }

    /// Subtracts a catalyst unit.
    #[must_use]
    pub fn subtract_catalyst(&self, unit: &Unit<ComponentReference>) -> Self {
        self.clone().with_catalysts(self.catalysts.subtract_unit(unit))
    }

    /// True if salvaging yields products.
    #[must_use]
    pub fn has_products(&self) -> bool {
        !self.products.is_empty()
    }

    /// True if salvaging needs catalysts.
    #[must_use]
    pub fn has_catalysts(&self) -> bool {
        !self.catalysts.is_empty()
    }

    /// True if the component appears as a product or catalyst.
    #[must_use]
    pub fn uses_component(&self, id: &str) -> bool {
        self.products.has(id) || self.catalysts.has(id)
    }

    /// Drops the component from products and catalysts.
    #[must_use]
    pub fn without_component(&self, id: &str) -> Self {
        Self::new(self.products.without(id), self.catalysts.without(id))
    }

    /// Rewrites component ids using the substitution map.
    pub fn substitute(&self, substitutions: &IdSubstitutions) -> CombinationResult<Self> {
        Ok(Self::new(
            self.products.substitute(&substitutions.components)?,
            self.catalysts.substitute(&substitutions.components)?,
        ))
    }

    /// Builds a salvage record from its persisted form.
    pub fn from_json(json: &SalvageJson) -> CombinationResult<Self> {
        Ok(Self::new(
            Combination::from_ids(&json.results)?,
            Combination::from_ids(&json.catalysts)?,
        ))
    }
}

impl JsonSerializable for Salvage {
    type Json = SalvageJson;

    fn to_json(&self) -> SalvageJson {
        SalvageJson {
            results: self.products.to_json(),
            catalysts: self.catalysts.to_json(),
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
    fn test_salvage_builders() {
        let salvage = Salvage::default()
            .add_product(Unit::new(component("scrap"), 3))
            .add_catalyst(Unit::new(component("saw"), 1));

        assert!(salvage.has_products());
        assert!(salvage.has_catalysts());
        assert!(salvage.uses_component("saw"));

        let stripped = salvage.without_component("saw");
        assert!(!stripped.has_catalysts());
        assert_eq!(stripped.products().amount_for("scrap"), 3);
    }

    #[test]
    fn test_json_round_trip() {
        let json: SalvageJson = serde_json::from_value(serde_json::json!({
            "results": { "scrap": 3 },
            "catalysts": { "saw": 1 }
        }))
        .expect("parse");
        let salvage = Salvage::from_json(&json).expect("build");
        assert_eq!(salvage.to_json(), json);
    }

    #[test]
    fn test_missing_catalysts_default_empty() {
        let json: SalvageJson = serde_json::from_value(serde_json::json!({
            "results": { "scrap": 1 }
        }))
        .expect("parse");
        let salvage = Salvage::from_json(&json).expect("build");
        assert!(!salvage.has_catalysts());
    }
}
