//! # Fabricate Settings
//!
//! Settings storage and model migrations for Fabricate.
//!
//! This crate provides:
//! - The settings storage capability (in memory or a JSON file)
//! - Entity stores with reverse-lookup collections
//! - Migration configuration
//! - The settings migrator and the V2 to V3 migration step

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod entity_store;
pub mod migration;
pub mod store;
pub mod v2_to_v3;

use fabricate_common::IdentityFactory;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::entity_store::*;
    pub use crate::migration::*;
    pub use crate::store::*;
    pub use crate::v2_to_v3::*;
}

pub use prelude::*;

/// Creates a migrator with every built-in step.
#[must_use]
pub fn builtin_migrator<F>(config: &MigrationConfig, ids: F) -> SettingsMigrator
where
    F: IdentityFactory + 'static,
{
    SettingsMigrator::new(config.keys.clone())
        .with_step(Box::new(V2ToV3Step::new(config.clone(), ids)))
}
