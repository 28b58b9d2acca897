//! Persistent settings: the known repositories and the last active one

use crate::error::PersistenceError;
use crate::registry::RepositoryInfo;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The persisted record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Known repositories, in insertion order
    #[serde(default)]
    pub repositories: Vec<RepositoryInfo>,

    /// Repository that was active when the settings were last saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<RepositoryInfo>,
}

impl Settings {
    /// Load from `store`, substituting empty settings on any failure
    ///
    /// Corrupt settings must never prevent start-up.
    pub fn load_or_default(store: &dyn SettingsStore) -> Self {
        match store.load() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, starting empty: {}", e);
                Self::default()
            }
        }
    }
}

/// Storage backend for [`Settings`]
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Settings, PersistenceError>;
    fn save(&self, settings: &Settings) -> Result<(), PersistenceError>;
}

/// Settings stored as TOML in a per-user configuration directory
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/simgit/settings.toml`
    pub fn default_location() -> Result<Self, PersistenceError> {
        let config_dir = dirs::config_dir().ok_or(PersistenceError::NoConfigDir)?;
        Ok(Self::new(config_dir.join("simgit").join("settings.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<Settings, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {:?} yet", self.path);
                return Ok(Settings::default());
            }
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };

        Ok(toml::from_str(&content)?)
    }

    fn save(&self, settings: &Settings) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }

        let content = toml::to_string_pretty(settings)?;

        // Write then rename so a crash never leaves a truncated file behind
        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, content).map_err(|e| PersistenceError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;

        debug!("Saved {} repositories to {:?}", settings.repositories.len(), self.path);
        Ok(())
    }
}
