//! Migration configuration.
//!
//! Loaded from `$XDG_CONFIG_HOME/fabricate/migration.toml` (or
//! `~/.config/fabricate/migration.toml`). A missing or invalid file yields the
//! defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::store::SettingsResult;

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "migration.toml";

/// Configuration directory name.
pub const CONFIG_DIR_NAME: &str = "fabricate";

/// Crafting systems shipped with the module; reseeded rather than migrated.
pub const DEFAULT_EMBEDDED_CRAFTING_SYSTEM_IDS: [&str; 1] = ["alchemists-supplies-v16"];

/// Setting keys of the persisted stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingKeys {
    /// Crafting systems store (also the V2 crafting systems blob).
    pub crafting_systems: String,
    /// Essences store.
    pub essences: String,
    /// Components store.
    pub components: String,
    /// Recipes store.
    pub recipes: String,
    /// Model version stamp.
    pub model_version: String,
}

impl Default for SettingKeys {
    fn default() -> Self {
        Self {
            crafting_systems: "craftingSystems".to_string(),
            essences: "essences".to_string(),
            components: "components".to_string(),
            recipes: "recipes".to_string(),
            model_version: "modelVersion".to_string(),
        }
    }
}

/// Prefixes of reverse-lookup collection keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionPrefixes {
    /// Collections by owning crafting system.
    pub crafting_system: String,
    /// Collections by source item.
    pub item: String,
}

impl Default for CollectionPrefixes {
    fn default() -> Self {
        Self {
            crafting_system: "craftingSystem".to_string(),
            item: "item".to_string(),
        }
    }
}

/// Migration configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Crafting system ids excluded from migration.
    pub embedded_crafting_system_ids: Vec<String>,
    /// Setting keys.
    pub keys: SettingKeys,
    /// Collection key prefixes.
    pub collections: CollectionPrefixes,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            embedded_crafting_system_ids: DEFAULT_EMBEDDED_CRAFTING_SYSTEM_IDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            keys: SettingKeys::default(),
            collections: CollectionPrefixes::default(),
        }
    }
}

impl MigrationConfig {
    /// Loads from the default location.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Loads from `path`.
    /// Returns the defaults if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Migration config {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read migration config: {e}");
                return Self::default();
            }
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded migration config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to parse migration config: {e}");
                Self::default()
            }
        }
    }

    /// Saves to `path`, creating parent directories.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SettingsResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        info!("Saved migration config to {}", path.display());
        Ok(())
    }

    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            return PathBuf::from(config_dir)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME);
        }

        if let Some(home) = dirs::home_dir() {
            return home
                .join(".config")
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME);
        }

        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// True if the crafting system is excluded from migration.
    #[must_use]
    pub fn is_embedded(&self, crafting_system_id: &str) -> bool {
        self.embedded_crafting_system_ids
            .iter()
            .any(|id| id == crafting_system_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::default();
        assert_eq!(config.keys.crafting_systems, "craftingSystems");
        assert_eq!(config.keys.model_version, "modelVersion");
        assert_eq!(config.collections.crafting_system, "craftingSystem");
        assert!(config.is_embedded("alchemists-supplies-v16"));
        assert!(!config.is_embedded("smithing"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("fabricate").join(CONFIG_FILE_NAME);

        let mut config = MigrationConfig::default();
        config.embedded_crafting_system_ids.push("tutorial".to_string());
        config.save_to(&path).expect("save");

        assert_eq!(MigrationConfig::load_from(&path), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[collections]\nitem = \"source\"\n").expect("write");

        let config = MigrationConfig::load_from(&path);
        assert_eq!(config.collections.item, "source");
        assert_eq!(config.collections.crafting_system, "craftingSystem");
        assert_eq!(config.keys, SettingKeys::default());
    }

    #[test]
    fn test_missing_or_invalid_file_uses_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert_eq!(MigrationConfig::load_from(&path), MigrationConfig::default());

        fs::write(&path, "keys = 5").expect("write");
        assert_eq!(MigrationConfig::load_from(&path), MigrationConfig::default());
    }
}
