//! Run configuration.
//!
//! The file is parsed once into a [`MigrationFile`], adjusted by environment
//! and command-line overrides, then frozen into a [`MigrationConfig`] whose
//! derived resource urls never change for the lifetime of the run.

pub mod parser;
pub mod schema;

use std::path::{Path, PathBuf};

use anyhow::Context;

pub use parser::{parse_config, parse_config_str, read_config};
pub use schema::{MigrationFile, ZoneFile};

use crate::auth::Credentials;
use crate::bulk::ConcurrencyPolicy;
use crate::resource::ResourceKind;

pub const CONFIG_FILE_NAME: &str = "views-migrate.toml";
pub const ORIGIN_CREDENTIALS_ENV: &str = "VIEWS_MIGRATE_ORIGIN_UAA_CREDENTIALS";
pub const DESTINATION_CREDENTIALS_ENV: &str = "VIEWS_MIGRATE_DESTINATION_UAA_CREDENTIALS";

/// Which side of the migration a zone is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Origin,
    Destination,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Origin => f.write_str("origin"),
            Side::Destination => f.write_str("destination"),
        }
    }
}

/// Immutable per-zone settings with the resource urls already derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneConfig {
    pub zone_id: String,
    pub views_url: String,
    pub uaa_url: String,
    pub credentials: Credentials,
    pub cards_url: String,
    pub decks_url: String,
}

impl ZoneConfig {
    fn from_file(side: Side, zone: &ZoneFile) -> anyhow::Result<Self> {
        let credentials = zone
            .credentials()
            .ok_or_else(|| anyhow::anyhow!("[{}] has no UAA credentials", side))?;
        let views_url = zone.views_url.trim_end_matches('/').to_string();
        Ok(Self {
            zone_id: zone.zone_id.clone(),
            cards_url: format!("{}{}", views_url, ResourceKind::Cards.api_path()),
            decks_url: format!("{}{}", views_url, ResourceKind::Decks.api_path()),
            views_url,
            uaa_url: zone.uaa_url.clone(),
            credentials,
        })
    }

    pub fn resource_url(&self, kind: ResourceKind) -> &str {
        match kind {
            ResourceKind::Cards => &self.cards_url,
            ResourceKind::Decks => &self.decks_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationConfig {
    pub origin: ZoneConfig,
    pub destination: ZoneConfig,
    pub clear_destination: bool,
    pub associate_origin: bool,
    pub concurrency: ConcurrencyPolicy,
}

impl MigrationConfig {
    pub fn from_file(file: &MigrationFile) -> anyhow::Result<Self> {
        file.validate()?;
        Ok(Self {
            origin: ZoneConfig::from_file(Side::Origin, &file.origin)?,
            destination: ZoneConfig::from_file(Side::Destination, &file.destination)?,
            clear_destination: file.clear_destination,
            associate_origin: file.associate_origin,
            concurrency: ConcurrencyPolicy::from_limit(file.max_concurrency),
        })
    }

    pub fn zone(&self, side: Side) -> &ZoneConfig {
        match side {
            Side::Origin => &self.origin,
            Side::Destination => &self.destination,
        }
    }
}

/// Command-line adjustments applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub clear_destination: Option<bool>,
    pub associate_origin: Option<bool>,
    pub max_concurrency: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(&self, file: &mut MigrationFile) {
        if let Some(clear) = self.clear_destination {
            file.clear_destination = clear;
        }
        if let Some(associate) = self.associate_origin {
            file.associate_origin = associate;
        }
        if let Some(limit) = self.max_concurrency {
            file.max_concurrency = limit;
        }
    }
}

/// Replace file credentials with the ones found in the environment.
///
/// `lookup` is `std::env::var` in production.
pub fn apply_env_overrides(file: &mut MigrationFile, lookup: impl Fn(&str) -> Option<String>) {
    for (key, zone) in [
        (ORIGIN_CREDENTIALS_ENV, &mut file.origin),
        (DESTINATION_CREDENTIALS_ENV, &mut file.destination),
    ] {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(variable = key, "using UAA credentials from environment");
            zone.uaa_credentials = Some(value);
        }
    }
}

/// Resolve the config file: explicit path, then `./views-migrate.toml`,
/// then `<config_dir>/views-migrate/config.toml`.
pub fn locate_config(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let local = std::env::current_dir()?.join(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    let global = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("views-migrate")
        .join("config.toml");
    if global.exists() {
        return Ok(global);
    }

    anyhow::bail!(
        "No configuration found. Pass --config, or create ./{} or {}",
        CONFIG_FILE_NAME,
        global.display()
    )
}

/// Load, override and freeze the run configuration.
pub fn load_config(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> anyhow::Result<MigrationConfig> {
    let path = locate_config(explicit)?;
    tracing::debug!(path = %path.display(), "loading configuration");

    let mut file = read_config(&path)?;

    apply_env_overrides(&mut file, |key| std::env::var(key).ok());
    overrides.apply(&mut file);

    MigrationConfig::from_file(&file)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}
