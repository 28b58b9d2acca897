//! Registry of known repositories
//!
//! Keeps insertion order for persistence and presents a name-sorted view
//! for display.

use crate::error::PersistenceError;
use crate::settings::{Settings, SettingsStore};
use crate::sink::PresentationSink;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A repository the user has added
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    pub path: PathBuf,
}

impl RepositoryInfo {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Name the repository after the last component of its path
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    /// Identity check: repositories are the same when their paths are
    pub fn same_path(&self, path: &Path) -> bool {
        paths_equal(&self.path, path)
    }
}

/// Path equality following the host filesystem's case sensitivity
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    if cfg!(any(windows, target_os = "macos")) {
        a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
    } else {
        a == b
    }
}

/// In-memory set of known repositories, unique by path
pub struct RepositoryRegistry {
    store: Arc<dyn SettingsStore>,
    entries: Vec<RepositoryInfo>,
    last_active: Option<RepositoryInfo>,
}

impl RepositoryRegistry {
    /// Create an empty registry persisted to `store`
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            entries: Vec::new(),
            last_active: None,
        }
    }

    /// Load from `store`; any failure yields an empty registry
    pub fn load(store: Arc<dyn SettingsStore>) -> Self {
        let settings = Settings::load_or_default(store.as_ref());
        let mut registry = Self::new(store);
        for info in settings.repositories {
            registry.insert(info);
        }
        registry.last_active = settings.last_active;
        debug!("Loaded {} repositories", registry.entries.len());
        registry
    }

    fn insert(&mut self, info: RepositoryInfo) -> bool {
        if self.contains(&info.path) {
            return false;
        }
        self.entries.push(info);
        true
    }

    /// Append `info`; returns false (and changes nothing) if its path is already known
    pub fn add(&mut self, info: RepositoryInfo) -> bool {
        let name = info.name.clone();
        let added = self.insert(info);
        if added {
            info!("Added repository '{}'", name);
        }
        added
    }

    /// Remove the repository at `path`; returns false if it was not known
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.same_path(path));
        let removed = self.entries.len() != before;

        if removed {
            if self.last_active.as_ref().is_some_and(|last| last.same_path(path)) {
                self.last_active = None;
            }
            info!("Removed repository at {:?}", path);
        }
        removed
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn get(&self, path: &Path) -> Option<&RepositoryInfo> {
        self.entries.iter().find(|entry| entry.same_path(path))
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &RepositoryInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Repository that was active when last persisted
    pub fn last_active(&self) -> Option<&RepositoryInfo> {
        self.last_active.as_ref()
    }

    /// Record which repository should be persisted as last active
    pub fn set_last_active(&mut self, info: Option<RepositoryInfo>) {
        self.last_active = info;
    }

    /// Entries sorted by name for display, ties broken by path
    pub fn display_order(&self) -> Vec<&RepositoryInfo> {
        let mut sorted: Vec<&RepositoryInfo> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        sorted
    }

    pub fn display_names(&self) -> Vec<String> {
        self.display_order()
            .into_iter()
            .map(|info| info.name.clone())
            .collect()
    }

    /// Send the display view to `sink`
    pub fn publish(&self, sink: &dyn PresentationSink) {
        sink.show_repositories(&self.display_names());
    }

    /// Persist the current set in insertion order
    ///
    /// On failure the in-memory state stays authoritative.
    pub fn save(&self) -> Result<(), PersistenceError> {
        let settings = Settings {
            repositories: self.entries.clone(),
            last_active: self.last_active.clone(),
        };
        self.store.save(&settings)
    }
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("entries", &self.entries)
            .field("last_active", &self.last_active)
            .finish()
    }
}
