//! Combinations: immutable multisets of identifiable elements.
//!
//! This module provides:
//! - `Unit`, a single (element, quantity) pair
//! - `Combination`, a mapping from element id to unit with multiset arithmetic
//! - Conversion to and from the persisted `id -> quantity` record form
//!
//! Every operation returns a new combination. Quantities are unsigned and a
//! unit whose quantity reaches zero is never stored.

use fabricate_common::{Identifiable, Reference};
use std::collections::BTreeMap;
use thiserror::Error;

/// Persisted form of a combination: element id to quantity.
pub type QuantityRecord = BTreeMap<String, u32>;

/// Errors raised while building a combination.
#[derive(Debug, Error)]
pub enum CombinationError {
    /// The element factory could not resolve an id.
    #[error("Unable to resolve element \"{id}\" while building a combination: {source}")]
    UnresolvedElement {
        /// Id that failed to resolve
        id: String,
        /// Underlying factory error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for combination construction.
pub type CombinationResult<T> = Result<T, CombinationError>;

/// An element together with a quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit<T> {
    element: T,
    quantity: u32,
}

impl<T> Unit<T> {
    /// Creates a new unit.
    #[must_use]
    pub const fn new(element: T, quantity: u32) -> Self {
        Self { element, quantity }
    }

    /// Returns the element.
    #[must_use]
    pub const fn element(&self) -> &T {
        &self.element
    }

    /// Returns the quantity.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Splits the unit into its element and quantity.
    #[must_use]
    pub fn into_parts(self) -> (T, u32) {
        (self.element, self.quantity)
    }
}

impl<T: Identifiable> Unit<T> {
    /// Id of the element.
    #[must_use]
    pub fn id(&self) -> &str {
        self.element.id()
    }
}

impl<T: Clone> Unit<T> {
    /// Returns a copy of this unit with a different quantity.
    #[must_use]
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self::new(self.element.clone(), quantity)
    }

    /// Returns a copy of this unit with its quantity scaled by `factor`.
    #[must_use]
    pub fn multiply(&self, factor: u32) -> Self {
        self.with_quantity(self.quantity.saturating_mul(factor))
    }
}

/// Immutable multiset of identifiable elements.
#[derive(Debug, Clone)]
pub struct Combination<T> {
    members: BTreeMap<String, Unit<T>>,
}

impl<T> Combination<T> {
    /// The empty combination.
    pub const EMPTY: Self = Self {
        members: BTreeMap::new(),
    };

    /// Returns the empty combination.
    #[must_use]
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// True if the combination has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of distinct elements.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.members.len()
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.members
            .values()
            .fold(0u32, |total, unit| total.saturating_add(unit.quantity))
    }

    /// True if the id is a member.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.members.contains_key(id)
    }

    /// Quantity held for the id, zero when absent.
    #[must_use]
    pub fn amount_for(&self, id: &str) -> u32 {
        self.members.get(id).map_or(0, |unit| unit.quantity)
    }

    /// Iterates over the units in id order.
    pub fn units(&self) -> impl Iterator<Item = &Unit<T>> + '_ {
        self.members.values()
    }

    /// Iterates over the member elements in id order.
    pub fn members(&self) -> impl Iterator<Item = &T> + '_ {
        self.members.values().map(Unit::element)
    }

    /// Iterates over the member ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.members.keys().map(String::as_str)
    }

    /// Lazily applies `f` to every unit.
    pub fn map<'a, U, F>(&'a self, f: F) -> impl Iterator<Item = U> + 'a
    where
        F: FnMut(&Unit<T>) -> U + 'a,
    {
        self.members.values().map(f)
    }

    /// True if both combinations share at least one element id.
    #[must_use]
    pub fn intersects<U>(&self, other: &Combination<U>) -> bool {
        self.members.keys().any(|id| other.members.contains_key(id))
    }

    /// True if every unit here is covered by an equal or larger amount in `other`.
    #[must_use]
    pub fn is_in<U>(&self, other: &Combination<U>) -> bool {
        self.members
            .iter()
            .all(|(id, unit)| other.amount_for(id) >= unit.quantity)
    }

    /// Persisted `id -> quantity` form.
    #[must_use]
    pub fn to_json(&self) -> QuantityRecord {
        self.members
            .iter()
            .map(|(id, unit)| (id.clone(), unit.quantity))
            .collect()
    }
}

impl<T: Identifiable + Clone> Combination<T> {
    /// Combination holding a single unit.
    #[must_use]
    pub fn of(element: T, quantity: u32) -> Self {
        Self::from_units([Unit::new(element, quantity)])
    }

    /// Builds a combination by accumulating units; repeated ids are summed.
    #[must_use]
    pub fn from_units(units: impl IntoIterator<Item = Unit<T>>) -> Self {
        let mut combination = Self::EMPTY;
        for unit in units {
            combination.accumulate(unit);
        }
        combination
    }

    /// Builds a combination from a persisted record, resolving each id with `factory`.
    pub fn from_record<F, E>(record: &QuantityRecord, mut factory: F) -> CombinationResult<Self>
    where
        F: FnMut(&str) -> Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut combination = Self::EMPTY;
        for (id, &quantity) in record {
            let element = factory(id).map_err(|source| CombinationError::UnresolvedElement {
                id: id.clone(),
                source: Box::new(source),
            })?;
            combination.accumulate(Unit::new(element, quantity));
        }
        Ok(combination)
    }

    /// Adds the unit's quantity to the amount held for its element.
    #[must_use]
    pub fn add_unit(&self, unit: Unit<T>) -> Self {
        let mut combination = self.clone();
        combination.accumulate(unit);
        combination
    }

    /// Adds `quantity` of `element`.
    #[must_use]
    pub fn add(&self, element: T, quantity: u32) -> Self {
        self.add_unit(Unit::new(element, quantity))
    }

    /// Removes the unit's quantity, dropping the element once it reaches zero.
    #[must_use]
    pub fn subtract_unit(&self, unit: &Unit<T>) -> Self {
        let mut combination = self.clone();
        combination.deplete(unit.id(), unit.quantity);
        combination
    }

    /// Union with quantities summed per shared id.
    #[must_use]
    pub fn combine_with(&self, other: &Self) -> Self {
        let mut combination = self.clone();
        for unit in other.units() {
            combination.accumulate(unit.clone());
        }
        combination
    }

    /// Subtracts every unit of `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        let mut combination = self.clone();
        for unit in other.units() {
            combination.deplete(unit.id(), unit.quantity);
        }
        combination
    }

    /// Removes the id entirely.
    #[must_use]
    pub fn without(&self, id: &str) -> Self {
        if !self.has(id) {
            return self.clone();
        }
        let mut combination = self.clone();
        combination.members.remove(id);
        combination
    }

    /// Scales every quantity by `factor`. A factor of zero yields `EMPTY`.
    #[must_use]
    pub fn multiply(&self, factor: u32) -> Self {
        if factor == 0 {
            return Self::EMPTY;
        }
        Self::from_units(self.units().map(|unit| unit.multiply(factor)))
    }

    /// Replaces every element via `f`, preserving quantities.
    ///
    /// Elements that convert to the same id are merged.
    #[must_use]
    pub fn convert_elements<U, F>(&self, mut f: F) -> Combination<U>
    where
        U: Identifiable + Clone,
        F: FnMut(&T) -> U,
    {
        Combination::from_units(self.units().map(|unit| Unit::new(f(&unit.element), unit.quantity)))
    }

    /// Fallible form of [`Combination::convert_elements`].
    pub fn try_convert_elements<U, E, F>(&self, mut f: F) -> Result<Combination<U>, E>
    where
        U: Identifiable + Clone,
        F: FnMut(&T) -> Result<U, E>,
    {
        let mut combination = Combination::EMPTY;
        for unit in self.units() {
            combination.accumulate(Unit::new(f(&unit.element)?, unit.quantity));
        }
        Ok(combination)
    }

    fn accumulate(&mut self, unit: Unit<T>) {
        if unit.quantity == 0 {
            return;
        }
        match self.members.get_mut(unit.id()) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(unit.quantity);
            }
            None => {
                self.members.insert(unit.id().to_string(), unit);
            }
        }
    }

    fn deplete(&mut self, id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        let remove = match self.members.get_mut(id) {
            Some(existing) if existing.quantity > quantity => {
                existing.quantity -= quantity;
                false
            }
            Some(_) => true,
            None => false,
        };
        if remove {
            self.members.remove(id);
        }
    }
}

impl<T: Reference> Combination<T> {
    /// Builds a reference combination from a persisted record.
    pub fn from_ids(record: &QuantityRecord) -> CombinationResult<Self> {
        Self::from_record(record, |id| T::from_id(id))
    }

    /// Rewrites element ids found in `substitutions`, keeping quantities.
    pub fn substitute(&self, substitutions: &BTreeMap<String, String>) -> CombinationResult<Self> {
        if substitutions.is_empty() {
            return Ok(self.clone());
        }
        self.try_convert_elements(|element| {
            let id = substitutions
                .get(element.id())
                .map_or(element.id(), String::as_str);
            if id == element.id() {
                return Ok(element.clone());
            }
            T::from_id(id).map_err(|source| CombinationError::UnresolvedElement {
                id: id.to_string(),
                source: Box::new(source),
            })
        })
    }
}

impl<T> Default for Combination<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> PartialEq for Combination<T> {
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self
                .members
                .iter()
                .all(|(id, unit)| other.amount_for(id) == unit.quantity)
    }
}

impl<T> Eq for Combination<T> {}

impl<T: Identifiable + Clone> FromIterator<Unit<T>> for Combination<T> {
    fn from_iter<I: IntoIterator<Item = Unit<T>>>(iter: I) -> Self {
        Self::from_units(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabricate_common::{ComponentReference, ReferenceError};
    use proptest::prelude::*;

    fn component(id: &str) -> ComponentReference {
        ComponentReference::new(id).expect("valid id")
    }

    fn from_pairs(pairs: &[(&str, u32)]) -> Combination<ComponentReference> {
        pairs
            .iter()
            .map(|(id, quantity)| Unit::new(component(id), *quantity))
            .collect()
    }

    #[test]
    fn test_empty() {
        let empty = Combination::<ComponentReference>::EMPTY;
        assert!(empty.is_empty());
        assert_eq!(empty.size(), 0);
        assert_eq!(empty.amount_for("iron"), 0);
    }

    #[test]
    fn test_add_unit_accumulates() {
        let combination = Combination::EMPTY
            .add(component("iron"), 2)
            .add(component("coal"), 1)
            .add(component("iron"), 3);

        assert_eq!(combination.amount_for("iron"), 5);
        assert_eq!(combination.amount_for("coal"), 1);
        assert_eq!(combination.distinct_count(), 2);
        assert_eq!(combination.size(), 6);
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let combination = Combination::EMPTY.add(component("iron"), 0);
        assert!(combination.is_empty());
        assert!(!combination.has("iron"));
    }

    #[test]
    fn test_receiver_untouched() {
        let original = from_pairs(&[("iron", 2)]);
        let added = original.add(component("iron"), 1);
        let subtracted = original.subtract_unit(&Unit::new(component("iron"), 1));

        assert_eq!(original.amount_for("iron"), 2);
        assert_eq!(added.amount_for("iron"), 3);
        assert_eq!(subtracted.amount_for("iron"), 1);
    }

    #[test]
    fn test_subtract_to_zero_removes_entry() {
        let combination = from_pairs(&[("iron", 2), ("coal", 1)]);

        let exact = combination.subtract_unit(&Unit::new(component("iron"), 2));
        assert!(!exact.has("iron"));

        let over = combination.subtract_unit(&Unit::new(component("coal"), 9));
        assert!(!over.has("coal"));
        assert!(over.has("iron"));
    }

    #[test]
    fn test_subtract_absent_is_noop() {
        let combination = from_pairs(&[("iron", 2)]);
        let result = combination.subtract_unit(&Unit::new(component("gold"), 1));
        assert_eq!(result, combination);
    }

    #[test]
    fn test_subtract_combination() {
        let have = from_pairs(&[("iron", 5), ("coal", 2)]);
        let spend = from_pairs(&[("iron", 2), ("coal", 2)]);
        let left = have.subtract(&spend);

        assert_eq!(left, from_pairs(&[("iron", 3)]));
    }

    #[test]
    fn test_without() {
        let combination = from_pairs(&[("iron", 2), ("coal", 1)]);
        assert_eq!(combination.without("iron"), from_pairs(&[("coal", 1)]));
        assert_eq!(combination.without("gold"), combination);
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = from_pairs(&[("iron", 2), ("coal", 1)]);
        let b = from_pairs(&[("coal", 1), ("iron", 2)]);
        let c = from_pairs(&[("coal", 1), ("iron", 3)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_multiply() {
        let combination = from_pairs(&[("iron", 2), ("coal", 1)]);
        assert_eq!(combination.multiply(3), from_pairs(&[("iron", 6), ("coal", 3)]));
        assert!(combination.multiply(0).is_empty());
    }

    #[test]
    fn test_intersects_and_is_in() {
        let small = from_pairs(&[("iron", 1)]);
        let large = from_pairs(&[("iron", 2), ("coal", 1)]);
        let other = from_pairs(&[("gold", 1)]);

        assert!(small.intersects(&large));
        assert!(!small.intersects(&other));
        assert!(small.is_in(&large));
        assert!(!large.is_in(&small));
        assert!(Combination::<ComponentReference>::EMPTY.is_in(&small));
    }

    #[test]
    fn test_map_is_lazy_sequence() {
        let combination = from_pairs(&[("iron", 2), ("coal", 1)]);
        let doubled: Combination<ComponentReference> =
            combination.map(|unit| unit.multiply(2)).collect();
        assert_eq!(doubled, combination.multiply(2));
    }

    #[test]
    fn test_convert_elements_merges_collisions() {
        let combination = from_pairs(&[("iron", 2), ("coal", 1)]);
        let converted = combination.convert_elements(|_| component("slag"));
        assert_eq!(converted.amount_for("slag"), 3);
        assert_eq!(converted.distinct_count(), 1);
    }

    #[test]
    fn test_from_record_round_trip() {
        let combination = from_pairs(&[("iron", 2), ("coal", 1)]);
        let record = combination.to_json();
        let rebuilt = Combination::<ComponentReference>::from_ids(&record).expect("build");
        assert_eq!(rebuilt, combination);
    }

    #[test]
    fn test_from_record_wraps_factory_error() {
        let mut record = QuantityRecord::new();
        record.insert("iron".to_string(), 1);
        record.insert("missing".to_string(), 1);

        let result = Combination::from_record(&record, |id| {
            if id == "missing" {
                Err(ReferenceError::BlankId { kind: "component" })
            } else {
                Ok(component(id))
            }
        });

        match result {
            Err(CombinationError::UnresolvedElement { id, source }) => {
                assert_eq!(id, "missing");
                assert!(source.to_string().contains("must not be blank"));
            }
            other => panic!("expected resolution failure, got {other:?}"),
        }
    }

    #[test]
    fn test_substitute_ids() {
        let combination = from_pairs(&[("iron", 2), ("coal", 1)]);
        let mut substitutions = BTreeMap::new();
        substitutions.insert("iron".to_string(), "iron-copy".to_string());

        let substituted = combination.substitute(&substitutions).expect("substitute");
        assert_eq!(substituted, from_pairs(&[("iron-copy", 2), ("coal", 1)]));
    }

    fn record_strategy() -> impl Strategy<Value = QuantityRecord> {
        prop::collection::btree_map("[a-f]", 1u32..100, 0..6)
    }

    proptest! {
        #[test]
        fn prop_combine_sums_amounts(a in record_strategy(), b in record_strategy()) {
            let a = Combination::<ComponentReference>::from_ids(&a).expect("build");
            let b = Combination::<ComponentReference>::from_ids(&b).expect("build");
            let combined = a.combine_with(&b);
            for id in ["a", "b", "c", "d", "e", "f"] {
                prop_assert_eq!(combined.amount_for(id), a.amount_for(id) + b.amount_for(id));
            }
        }

        #[test]
        fn prop_combine_is_commutative(a in record_strategy(), b in record_strategy()) {
            let a = Combination::<ComponentReference>::from_ids(&a).expect("build");
            let b = Combination::<ComponentReference>::from_ids(&b).expect("build");
            prop_assert_eq!(a.combine_with(&b), b.combine_with(&a));
        }

        #[test]
        fn prop_combine_with_empty_is_identity(a in record_strategy()) {
            let a = Combination::<ComponentReference>::from_ids(&a).expect("build");
            prop_assert_eq!(a.combine_with(&Combination::EMPTY), a.clone());
            prop_assert_eq!(Combination::EMPTY.combine_with(&a), a);
        }

        #[test]
        fn prop_over_subtraction_removes(a in record_strategy(), extra in 1u32..10) {
            let a = Combination::<ComponentReference>::from_ids(&a).expect("build");
            for unit in a.units() {
                let over = unit.with_quantity(unit.quantity() + extra);
                prop_assert!(!a.subtract_unit(&over).has(unit.id()));
            }
        }

        #[test]
        fn prop_record_round_trip(a in record_strategy()) {
            let built = Combination::<ComponentReference>::from_ids(&a).expect("build");
            let rebuilt =
                Combination::<ComponentReference>::from_ids(&built.to_json()).expect("build");
            prop_assert_eq!(rebuilt, built);
        }
    }
}
