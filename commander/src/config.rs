//! Aggregate configuration loaded from TOML.

use std::{
    fs,
    path::{Path, PathBuf},
};

use arena_tactics_system_economy::{ConstructionConfig, ProductionConfig};
use serde::Deserialize;
use thiserror::Error;

/// Settings for every system the commander drives.
///
/// Every table and field is optional; omitted values fall back to the
/// defaults of the owning system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path cache and movement controller.
    pub movement: arena_tactics_system_movement::Config,
    /// Squad formation, targeting and wave cadence.
    pub squads: arena_tactics_system_squads::Config,
    /// Flanking waypoint selection.
    pub flanking: arena_tactics_system_flanking::Config,
    /// Behaviour executor radii.
    pub behavior: arena_tactics_system_behavior::Config,
    /// Unit production priority list.
    pub production: ProductionConfig,
    /// Defensive construction around the home base.
    pub construction: ConstructionConfig,
}

impl Config {
    /// Parses a configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses the configuration file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

/// Errors raised while loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration from {}", path.display())]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid configuration TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
