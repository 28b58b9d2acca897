//! Application configuration

use crate::error::PersistenceError;
use crate::monitor::MonitorConfig;
use crate::settings::TomlSettingsStore;
use crate::status::StatusConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure for simgit
///
/// Every section is optional in the file; missing values fall back to
/// their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Debounce and event filtering
    pub monitor: MonitorConfig,

    /// What counts as a pending change
    pub status: StatusConfig,

    /// Where the repository list is persisted; the per-user default when unset
    pub settings_path: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file {:?}", path))
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Settings store for this configuration
    pub fn settings_store(&self) -> Result<TomlSettingsStore, PersistenceError> {
        match &self.settings_path {
            Some(path) => Ok(TomlSettingsStore::new(path)),
            None => TomlSettingsStore::default_location(),
        }
    }
}
