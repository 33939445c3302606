//! Settings model versioning and migration.
//!
//! This module provides:
//! - The `SettingMigrationStep` trait, one step per model version bump
//! - A migrator that detects the stored model version and runs steps in order
//! - Records of applied migrations

use fabricate_common::ModelVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SettingKeys;
use crate::store::{SettingsError, SettingsStore};

/// Errors related to settings migration.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Stored version is unknown, or from a newer Fabricate.
    #[error("Settings model version \"{found}\" is unknown or newer than {current}")]
    UnsupportedVersion {
        /// Stored version.
        found: String,
        /// Current model version.
        current: ModelVersion,
    },

    /// No step is registered for a version that needs migrating.
    #[error("No migration registered from model version {0}")]
    MissingStep(ModelVersion),

    /// A step finished without stamping its target version.
    #[error("Migration {from} -> {to} did not record model version {to}")]
    Incomplete {
        /// Source version.
        from: ModelVersion,
        /// Target version.
        to: ModelVersion,
    },

    /// Source settings do not have the expected shape.
    #[error("Setting \"{key}\" cannot be migrated: {reason}")]
    SourceShape {
        /// Setting key.
        key: String,
        /// What was wrong.
        reason: String,
    },

    /// An entity could not be rebuilt in the new model.
    #[error("Failed to migrate {kind} \"{id}\": {source}")]
    Entity {
        /// Entity type.
        kind: &'static str,
        /// Entity id.
        id: String,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Two crafting systems define an entity with the same id.
    #[error(
        "{kind} \"{id}\" is defined by more than one crafting system: {}",
        .crafting_system_ids.join(", ")
    )]
    DuplicateEntity {
        /// Entity type.
        kind: &'static str,
        /// Entity id.
        id: String,
        /// Crafting systems defining the id.
        crafting_system_ids: Vec<String>,
    },

    /// Settings storage failed.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Result type for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Record of an applied migration step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Source version.
    pub from_version: ModelVersion,
    /// Target version.
    pub to_version: ModelVersion,
    /// Step description.
    pub description: String,
    /// When the step completed, in seconds since the epoch.
    pub timestamp: u64,
}

/// Migrates settings from one model version to the next.
pub trait SettingMigrationStep {
    /// Source version this step applies to.
    fn source_version(&self) -> ModelVersion;

    /// Version after the step.
    fn target_version(&self) -> ModelVersion;

    /// Description of changes made.
    fn description(&self) -> &str;

    /// Rewrites the settings. Must stamp the target version as its last write.
    fn perform(&self, store: &mut dyn SettingsStore) -> MigrationResult<()>;
}

/// Registry of migration steps keyed by source version.
pub struct SettingsMigrator {
    keys: SettingKeys,
    steps: BTreeMap<ModelVersion, Box<dyn SettingMigrationStep>>,
}

impl SettingsMigrator {
    /// Creates a migrator without steps.
    #[must_use]
    pub fn new(keys: SettingKeys) -> Self {
        Self {
            keys,
            steps: BTreeMap::new(),
        }
    }

    /// Registers a step, replacing any step with the same source version.
    pub fn register(&mut self, step: Box<dyn SettingMigrationStep>) {
        debug!(
            "Registered migration {} -> {}",
            step.source_version(),
            step.target_version()
        );
        self.steps.insert(step.source_version(), step);
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with_step(mut self, step: Box<dyn SettingMigrationStep>) -> Self {
        self.register(step);
        self
    }

    /// Lists registered steps as `(source, target, description)`.
    #[must_use]
    pub fn list_steps(&self) -> Vec<(ModelVersion, ModelVersion, &str)> {
        self.steps
            .values()
            .map(|step| (step.source_version(), step.target_version(), step.description()))
            .collect()
    }

    /// Version stamp as stored, without inference.
    pub fn stored_version(
        &self,
        store: &dyn SettingsStore,
    ) -> MigrationResult<Option<ModelVersion>> {
        match store.get(&self.keys.model_version) {
            None => Ok(None),
            Some(Value::String(raw)) => raw
                .parse()
                .map(Some)
                .map_err(|_| MigrationError::UnsupportedVersion {
                    found: raw,
                    current: ModelVersion::CURRENT,
                }),
            Some(other) => Err(MigrationError::UnsupportedVersion {
                found: other.to_string(),
                current: ModelVersion::CURRENT,
            }),
        }
    }

    /// Effective model version of the settings.
    ///
    /// Without a stamp, settings holding a crafting systems blob are V2 and
    /// empty settings are treated as current.
    pub fn current_version(&self, store: &dyn SettingsStore) -> MigrationResult<ModelVersion> {
        if let Some(version) = self.stored_version(store)? {
            return Ok(version);
        }
        if store.get(&self.keys.crafting_systems).is_some() {
            Ok(ModelVersion::V2)
        } else {
            Ok(ModelVersion::CURRENT)
        }
    }

    /// True if the settings are older than the current model.
    pub fn needs_migration(&self, store: &dyn SettingsStore) -> MigrationResult<bool> {
        Ok(self.current_version(store)?.needs_migration())
    }

    /// Runs every step from the stored version up to the current one.
    pub fn migrate(&self, store: &mut dyn SettingsStore) -> MigrationResult<Vec<MigrationRecord>> {
        let mut version = self.current_version(store)?;
        let mut records = Vec::new();

        if !version.needs_migration() {
            debug!("Settings already at model version {version}");
            return Ok(records);
        }

        while version.needs_migration() {
            let step = self
                .steps
                .get(&version)
                .ok_or(MigrationError::MissingStep(version))?;
            let target = step.target_version();

            info!(
                "Applying migration: {} ({} -> {})",
                step.description(),
                version,
                target
            );
            step.perform(store)?;

            if self.stored_version(store)? != Some(target) {
                return Err(MigrationError::Incomplete {
                    from: version,
                    to: target,
                });
            }

            records.push(MigrationRecord {
                from_version: version,
                to_version: target,
                description: step.description().to_string(),
                timestamp: std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            });
            version = target;
        }

        info!("Settings migrated to model version {version}");
        Ok(records)
    }
}

impl std::fmt::Debug for SettingsMigrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsMigrator")
            .field("keys", &self.keys)
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySettingsStore;
    use serde_json::json;

    struct StampOnly {
        stamp: bool,
    }

    impl SettingMigrationStep for StampOnly {
        fn source_version(&self) -> ModelVersion {
            ModelVersion::V2
        }

        fn target_version(&self) -> ModelVersion {
            ModelVersion::V3
        }

        fn description(&self) -> &str {
            "Stamp only"
        }

        fn perform(&self, store: &mut dyn SettingsStore) -> MigrationResult<()> {
            if self.stamp {
                store.set("modelVersion", json!("V3"))?;
            }
            Ok(())
        }
    }

    fn migrator(stamp: bool) -> SettingsMigrator {
        SettingsMigrator::new(SettingKeys::default()).with_step(Box::new(StampOnly { stamp }))
    }

    #[test]
    fn test_version_detection() {
        let migrator = migrator(true);

        let empty = InMemorySettingsStore::new();
        assert_eq!(migrator.current_version(&empty).expect("version"), ModelVersion::V3);
        assert!(!migrator.needs_migration(&empty).expect("check"));

        let legacy = InMemorySettingsStore::new().with("craftingSystems", json!({}));
        assert_eq!(migrator.current_version(&legacy).expect("version"), ModelVersion::V2);
        assert!(migrator.needs_migration(&legacy).expect("check"));

        let stamped = legacy.with("modelVersion", json!("V3"));
        assert!(!migrator.needs_migration(&stamped).expect("check"));
    }

    #[test]
    fn test_migrate_records_steps() {
        let migrator = migrator(true);
        let mut store = InMemorySettingsStore::new().with("craftingSystems", json!({}));

        let records = migrator.migrate(&mut store).expect("migrate");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from_version, ModelVersion::V2);
        assert_eq!(records[0].to_version, ModelVersion::V3);

        assert!(migrator.migrate(&mut store).expect("rerun").is_empty());
    }

    #[test]
    fn test_unstamped_step_is_incomplete() {
        let migrator = migrator(false);
        let mut store = InMemorySettingsStore::new().with("craftingSystems", json!({}));

        assert!(matches!(
            migrator.migrate(&mut store),
            Err(MigrationError::Incomplete { .. })
        ));
    }

    #[test]
    fn test_unknown_version_refused() {
        let migrator = migrator(true);
        let mut store = InMemorySettingsStore::new().with("modelVersion", json!("V9"));

        let err = migrator.migrate(&mut store).expect_err("refused");
        assert!(matches!(err, MigrationError::UnsupportedVersion { .. }));
        assert!(err.to_string().contains("newer than V3"));
    }

    #[test]
    fn test_missing_step() {
        let migrator = SettingsMigrator::new(SettingKeys::default());
        let mut store = InMemorySettingsStore::new().with("modelVersion", json!("V1"));

        assert!(matches!(
            migrator.migrate(&mut store),
            Err(MigrationError::MissingStep(ModelVersion::V1))
        ));
    }
}
