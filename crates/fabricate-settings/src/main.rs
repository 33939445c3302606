//! # Fabricate Migrate
//!
//! Upgrades a Fabricate settings document to the current model version.
//!
//! Usage: `fabricate-migrate <settings.json> [config.toml]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{bail, Context, Result};
use fabricate_common::UuidIdentityFactory;
use fabricate_settings::{builtin_migrator, JsonFileSettingsStore, MigrationConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("fabricate=info".parse()?))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(settings_path) = args.next().map(PathBuf::from) else {
        bail!("usage: fabricate-migrate <settings.json> [config.toml]");
    };
    let config = match args.next() {
        Some(path) => MigrationConfig::load_from(path),
        None => MigrationConfig::load(),
    };

    info!("Fabricate migrate {}", env!("CARGO_PKG_VERSION"));

    let mut store = JsonFileSettingsStore::open(&settings_path)
        .with_context(|| format!("failed to open {}", settings_path.display()))?;
    let migrator = builtin_migrator(&config, UuidIdentityFactory);

    if !migrator.needs_migration(&store)? {
        info!("{} is already up to date", settings_path.display());
        return Ok(());
    }

    let records = migrator
        .migrate(&mut store)
        .context("settings migration failed")?;
    store
        .save_if_dirty()
        .with_context(|| format!("failed to save {}", settings_path.display()))?;

    for record in &records {
        info!(
            "Applied {} -> {}: {}",
            record.from_version, record.to_version, record.description
        );
    }
    Ok(())
}
