// Command implementations

pub mod repo;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use simgit_core::{AppConfig, RepositoryRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load the registry from the configured settings location
pub fn open_registry(config: &AppConfig) -> Result<RepositoryRegistry> {
    let store = config
        .settings_store()
        .context("Failed to locate the settings file")?;
    Ok(RepositoryRegistry::load(Arc::new(store)))
}

/// Absolute form of a user-supplied repository path
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).with_context(|| format!("Repository path {:?} does not exist", path))
}
