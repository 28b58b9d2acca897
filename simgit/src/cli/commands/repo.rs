//! Repository list commands

use super::{open_registry, resolve_path};
use crate::cli::app::{AddArgs, RemoveArgs};
use anyhow::{Context, Result};
use simgit_core::{AppConfig, RepositoryInfo};

/// Print the known repositories, sorted by name
pub fn list(config: &AppConfig) -> Result<()> {
    let registry = open_registry(config)?;

    if registry.is_empty() {
        println!("No repositories added yet");
        return Ok(());
    }

    let last_active = registry.last_active();
    for info in registry.display_order() {
        let marker = if last_active.is_some_and(|last| last.same_path(&info.path)) {
            "*"
        } else {
            " "
        };
        println!("{} {:<24} {}", marker, info.name, info.path.display());
    }
    Ok(())
}

/// Add a repository to the known list
pub fn add(args: AddArgs, config: &AppConfig) -> Result<()> {
    let path = resolve_path(&args.path)?;
    let info = match args.name {
        Some(name) => RepositoryInfo::new(name, path),
        None => RepositoryInfo::from_path(path),
    };

    let mut registry = open_registry(config)?;
    if !registry.add(info.clone()) {
        println!("{} is already known", info.path.display());
        return Ok(());
    }

    registry.save().context("Failed to save the repository list")?;
    println!("Added '{}' ({})", info.name, info.path.display());
    Ok(())
}

/// Remove a repository from the known list
pub fn remove(args: RemoveArgs, config: &AppConfig) -> Result<()> {
    // The directory may already be gone; fall back to the path as given
    let path = resolve_path(&args.path).unwrap_or(args.path);

    let mut registry = open_registry(config)?;
    if !registry.remove(&path) {
        println!("{} is not a known repository", path.display());
        return Ok(());
    }

    registry.save().context("Failed to save the repository list")?;
    println!("Removed {}", path.display());
    Ok(())
}
