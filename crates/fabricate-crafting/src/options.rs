//! Named, identified options and keyed collections of them.
//!
//! Recipes offer alternative requirement and result options, and components
//! offer alternative salvage options. Each option wraps a value under an id
//! and a display name. `Options` keys them by id and generates ids of the
//! form `option-<n>` for options created without one.

use fabricate_common::Identifiable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::combination::{CombinationError, CombinationResult};

/// Prefix of generated option ids.
pub const GENERATED_OPTION_ID_PREFIX: &str = "option";

/// Values with a persisted JSON form.
pub trait JsonSerializable {
    /// Persisted representation.
    type Json;

    /// Converts the value to its persisted representation.
    fn to_json(&self) -> Self::Json;
}

/// Errors raised while building or validating options.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// An option's value could not be built from its persisted form.
    #[error("Failed to build option \"{name}\" ({id}): {source}")]
    BuildFailed {
        /// Option id, or `<new>` for options without one
        id: String,
        /// Option name
        name: String,
        /// Underlying construction error
        #[source]
        source: CombinationError,
    },

    /// A persisted option is stored under a key that differs from its id.
    #[error("Option \"{id}\" is stored under mismatched key \"{key}\"")]
    KeyMismatch {
        /// Map key
        key: String,
        /// Id recorded inside the option
        id: String,
    },
}

/// Result type for options operations.
pub type OptionsResult<T> = Result<T, OptionsError>;

/// A named, identified wrapper around a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableOption<T> {
    id: String,
    name: String,
    value: T,
}

impl<T> SelectableOption<T> {
    /// Creates a new option.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, value: T) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value,
        }
    }

    /// Option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wrapped value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Consumes the option, returning its value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Transforms the value, keeping id and name.
    #[must_use]
    pub fn map_value<U>(self, f: impl FnOnce(T) -> U) -> SelectableOption<U> {
        SelectableOption {
            id: self.id,
            name: self.name,
            value: f(self.value),
        }
    }
}

impl<T: Clone> SelectableOption<T> {
    /// Copy of this option under a new id.
    #[must_use]
    pub fn clone_as(&self, id: impl Into<String>) -> Self {
        Self::new(id, self.name.clone(), self.value.clone())
    }
}

impl<T> Identifiable for SelectableOption<T> {
    fn id(&self) -> &str {
        &self.id
    }
}

impl<T: JsonSerializable> JsonSerializable for SelectableOption<T> {
    type Json = OptionJson<T::Json>;

    fn to_json(&self) -> Self::Json {
        OptionJson {
            id: self.id.clone(),
            name: self.name.clone(),
            value: self.value.to_json(),
        }
    }
}

/// Persisted option: id and name alongside the flattened value fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionJson<J> {
    /// Option id
    pub id: String,
    /// Option name
    pub name: String,
    /// Value fields
    #[serde(flatten)]
    pub value: J,
}

/// An option that may not have been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionConfig<T> {
    /// Existing id, or `None` to generate one
    pub id: Option<String>,
    /// Option name
    pub name: String,
    /// Option value
    pub value: T,
}

impl<T> OptionConfig<T> {
    /// Config for a new option; an id is generated when it is set.
    #[must_use]
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            id: None,
            name: name.into(),
            value,
        }
    }

    /// Targets an existing option id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl<T> From<SelectableOption<T>> for OptionConfig<T> {
    fn from(option: SelectableOption<T>) -> Self {
        Self {
            id: Some(option.id),
            name: option.name,
            value: option.value,
        }
    }
}

/// Deprecated flat option shape: persisted value fields with an optional id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyOptionConfig<J> {
    /// Existing id, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Option name
    pub name: String,
    /// Value fields
    #[serde(flatten)]
    pub value: J,
}

/// Input accepted by option setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionInput<J, T> {
    /// Deprecated flat record shape, upgraded on use.
    Legacy(LegacyOptionConfig<J>),
    /// Rich config carrying an already-built value.
    Config(OptionConfig<T>),
}

impl<J, T> OptionInput<J, T> {
    /// Resolves the input to an option config, building legacy values with `build`.
    pub fn resolve<F>(self, build: F) -> OptionsResult<OptionConfig<T>>
    where
        F: FnOnce(&J) -> CombinationResult<T>,
    {
        match self {
            Self::Config(config) => Ok(config),
            Self::Legacy(legacy) => {
                warn!(
                    name = %legacy.name,
                    "Legacy option config is deprecated; pass an OptionConfig instead"
                );
                let value = build(&legacy.value).map_err(|source| OptionsError::BuildFailed {
                    id: legacy.id.clone().unwrap_or_else(|| "<new>".to_string()),
                    name: legacy.name.clone(),
                    source,
                })?;
                Ok(OptionConfig {
                    id: legacy.id,
                    name: legacy.name,
                    value,
                })
            }
        }
    }
}

impl<J, T> From<OptionConfig<T>> for OptionInput<J, T> {
    fn from(config: OptionConfig<T>) -> Self {
        Self::Config(config)
    }
}

impl<J, T> From<LegacyOptionConfig<J>> for OptionInput<J, T> {
    fn from(legacy: LegacyOptionConfig<J>) -> Self {
        Self::Legacy(legacy)
    }
}

/// Collection of options keyed by id.
///
/// `PartialEq` compares ids, names and values. [`Options::same_ids`] is the
/// weaker by-id comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options<T> {
    values: BTreeMap<String, SelectableOption<T>>,
}

impl<T> Default for Options<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Options<T> {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no options.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if an option with the id exists.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    /// True if an option with the same id as `option` exists.
    #[must_use]
    pub fn contains(&self, option: &SelectableOption<T>) -> bool {
        self.has(option.id())
    }

    /// Option with the id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SelectableOption<T>> {
        self.values.get(id)
    }

    /// Option ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Options in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectableOption<T>> + '_ {
        self.values.values()
    }

    /// Option values in id order.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.values.values().map(SelectableOption::value)
    }

    /// Inserts or replaces an option, returning its id.
    ///
    /// A config without an id is stored under the next free generated id.
    pub fn set(&mut self, config: OptionConfig<T>) -> String {
        let id = match config.id {
            Some(id) => id,
            None => self.next_id(),
        };
        self.values.insert(
            id.clone(),
            SelectableOption::new(id.clone(), config.name, config.value),
        );
        id
    }

    /// Removes and returns the option with the id. Absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<SelectableOption<T>> {
        self.values.remove(id)
    }

    /// True if both collections hold exactly the same ids, ignoring values.
    #[must_use]
    pub fn same_ids<U>(&self, other: &Options<U>) -> bool {
        self.values.len() == other.values.len()
            && self.values.keys().all(|id| other.values.contains_key(id))
    }

    /// Next unused id of the form `option-<len + k>`.
    #[must_use]
    pub fn next_id(&self) -> String {
        let mut offset = 1;
        loop {
            let candidate = format!("{GENERATED_OPTION_ID_PREFIX}-{}", self.values.len() + offset);
            if !self.values.contains_key(&candidate) {
                return candidate;
            }
            offset += 1;
        }
    }

    /// Copies every option, transforming each value with `f`.
    #[must_use]
    pub fn clone_with<U>(&self, mut f: impl FnMut(&T) -> U) -> Options<U> {
        Options {
            values: self
                .values
                .iter()
                .map(|(id, option)| {
                    (
                        id.clone(),
                        SelectableOption::new(id.clone(), option.name.clone(), f(&option.value)),
                    )
                })
                .collect(),
        }
    }

    /// Fallible form of [`Options::clone_with`].
    pub fn try_clone_with<U, E>(
        &self,
        mut f: impl FnMut(&T) -> Result<U, E>,
    ) -> Result<Options<U>, E> {
        let mut values = BTreeMap::new();
        for (id, option) in &self.values {
            values.insert(
                id.clone(),
                SelectableOption::new(id.clone(), option.name.clone(), f(&option.value)?),
            );
        }
        Ok(Options { values })
    }

    /// Builds a collection from persisted options.
    pub fn try_from_json<J, F>(
        json: &BTreeMap<String, OptionJson<J>>,
        mut build: F,
    ) -> OptionsResult<Self>
    where
        F: FnMut(&J) -> CombinationResult<T>,
    {
        let mut values = BTreeMap::new();
        for (key, option) in json {
            if *key != option.id {
                return Err(OptionsError::KeyMismatch {
                    key: key.clone(),
                    id: option.id.clone(),
                });
            }
            let value = build(&option.value).map_err(|source| OptionsError::BuildFailed {
                id: option.id.clone(),
                name: option.name.clone(),
                source,
            })?;
            values.insert(
                option.id.clone(),
                SelectableOption::new(option.id.clone(), option.name.clone(), value),
            );
        }
        Ok(Self { values })
    }
}

impl<T: JsonSerializable> Options<T> {
    /// Persisted `id -> option` form.
    #[must_use]
    pub fn to_json(&self) -> BTreeMap<String, OptionJson<T::Json>> {
        self.values
            .iter()
            .map(|(id, option)| (id.clone(), option.to_json()))
            .collect()
    }
}

impl<T> FromIterator<SelectableOption<T>> for Options<T> {
    fn from_iter<I: IntoIterator<Item = SelectableOption<T>>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|option| (option.id.clone(), option))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_without_id_generates_id() {
        let mut options = Options::new();
        let first = options.set(OptionConfig::new("First", 1));
        let second = options.set(OptionConfig::new("Second", 2));

        assert_eq!(first, "option-1");
        assert_eq!(second, "option-2");
        assert_ne!(first, second);
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_generated_id_skips_collisions() {
        let mut options = Options::new();
        options.set(OptionConfig::new("Taken", 1).with_id("option-2"));
        options.set(OptionConfig::new("Also taken", 1).with_id("option-3"));

        let id = options.set(OptionConfig::new("New", 3));
        assert_eq!(id, "option-4");
        assert!(options.has("option-2"));
        assert!(options.has("option-3"));
    }

    #[test]
    fn test_set_with_existing_id_replaces() {
        let mut options = Options::new();
        let id = options.set(OptionConfig::new("Original", 1));
        options.set(OptionConfig::new("Renamed", 5).with_id(id.clone()));

        assert_eq!(options.len(), 1);
        let option = options.get(&id).expect("option present");
        assert_eq!(option.name(), "Renamed");
        assert_eq!(*option.value(), 5);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut options: Options<u32> = Options::new();
        assert!(options.remove("missing").is_none());
        assert!(options.is_empty());
    }

    #[test]
    fn test_same_ids_ignores_values() {
        let mut a = Options::new();
        let mut b = Options::new();
        a.set(OptionConfig::new("A", 1));
        b.set(OptionConfig::new("B", 2));

        assert!(a.same_ids(&b));
        assert_ne!(a, b);

        b.set(OptionConfig::new("C", 3));
        assert!(!a.same_ids(&b));
    }

    #[test]
    fn test_clone_with_transforms_values() {
        let mut options = Options::new();
        let id = options.set(OptionConfig::new("Double me", 2));
        let doubled = options.clone_with(|value| value * 2);

        assert_eq!(*doubled.get(&id).expect("present").value(), 4);
        assert_eq!(*options.get(&id).expect("present").value(), 2);
    }

    #[test]
    fn test_clone_as_new_id() {
        let option = SelectableOption::new("a", "Name", 7);
        let copy = option.clone_as("b");
        assert_eq!(copy.id(), "b");
        assert_eq!(copy.name(), "Name");
        assert_eq!(*copy.value(), 7);
    }

    #[test]
    fn test_key_mismatch_rejected() {
        let mut json = BTreeMap::new();
        json.insert(
            "key".to_string(),
            OptionJson {
                id: "other".to_string(),
                name: "Bad".to_string(),
                value: 1u32,
            },
        );
        let result = Options::<u32>::try_from_json(&json, |value| Ok(*value));
        assert!(matches!(result, Err(OptionsError::KeyMismatch { .. })));
    }
}
