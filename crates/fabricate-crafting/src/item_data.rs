//! Lazily loaded item data for recipes and components.
//!
//! Recipes and components point at a host item by uuid. The item's name and
//! image are resolved on demand through an `ItemDataLoader` and cached until a
//! forced reload.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Image shown for items that failed to load.
pub const DEFAULT_ITEM_IMAGE: &str = "icons/svg/mystery-man.svg";

/// Name shown for items that failed to load.
pub const UNKNOWN_ITEM_NAME: &str = "Unknown item";

/// Resolved data of a host item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedItemData {
    /// Item uuid
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Image url
    pub image_url: String,
    /// Problems encountered while loading
    #[serde(default)]
    pub errors: Vec<String>,
}

impl LoadedItemData {
    /// Successfully loaded item.
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            image_url: image_url.into(),
            errors: Vec::new(),
        }
    }

    /// Placeholder for an item that could not be found.
    #[must_use]
    pub fn missing(uuid: impl Into<String>) -> Self {
        let uuid = uuid.into();
        let error = format!("No item found with UUID \"{uuid}\"");
        Self {
            uuid,
            name: UNKNOWN_ITEM_NAME.to_string(),
            image_url: DEFAULT_ITEM_IMAGE.to_string(),
            errors: vec![error],
        }
    }

    /// True if loading reported problems.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Item data state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemData {
    /// Not fetched yet.
    #[default]
    NotLoaded,
    /// Fetched.
    Loaded(LoadedItemData),
}

impl ItemData {
    /// True once fetched.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// The loaded data, if any.
    #[must_use]
    pub fn loaded(&self) -> Option<&LoadedItemData> {
        match self {
            Self::Loaded(data) => Some(data),
            Self::NotLoaded => None,
        }
    }

    /// Loaded item name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.loaded().map(|data| data.name.as_str())
    }

    /// Loaded image url.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.loaded().map(|data| data.image_url.as_str())
    }

    /// True if loaded with errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.loaded().is_some_and(LoadedItemData::has_errors)
    }

    /// Fetches the item unless it is already loaded and `force_reload` is false.
    pub fn ensure_loaded(
        &mut self,
        item_uuid: &str,
        loader: &dyn ItemDataLoader,
        force_reload: bool,
    ) -> &Self {
        if force_reload || !self.is_loaded() {
            debug!(item_uuid, force_reload, "Loading item data");
            let data = loader.load(item_uuid);
            if data.has_errors() {
                warn!(item_uuid, errors = ?data.errors, "Item data loaded with errors");
            }
            *self = Self::Loaded(data);
        }
        self
    }
}

/// Resolves item uuids to item data.
pub trait ItemDataLoader {
    /// Loads the item. Missing items are reported through `LoadedItemData::errors`.
    fn load(&self, item_uuid: &str) -> LoadedItemData;
}

/// In-memory item catalogue.
#[derive(Debug, Clone, Default)]
pub struct StaticItemDataLoader {
    items: BTreeMap<String, LoadedItemData>,
}

impl StaticItemDataLoader {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an item.
    pub fn register(
        &mut self,
        uuid: impl Into<String>,
        name: impl Into<String>,
        image_url: impl Into<String>,
    ) {
        let data = LoadedItemData::new(uuid, name, image_url);
        self.items.insert(data.uuid.clone(), data);
    }

    /// Builder form of [`StaticItemDataLoader::register`].
    #[must_use]
    pub fn with_item(
        mut self,
        uuid: impl Into<String>,
        name: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        self.register(uuid, name, image_url);
        self
    }

    /// Number of registered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if no items are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ItemDataLoader for StaticItemDataLoader {
    fn load(&self, item_uuid: &str) -> LoadedItemData {
        self.items
            .get(item_uuid)
            .cloned()
            .unwrap_or_else(|| LoadedItemData::missing(item_uuid))
    }
}
