//! One-shot status command

use super::{open_registry, resolve_path};
use crate::cli::app::StatusArgs;
use crate::cli::sink::TerminalSink;
use anyhow::{Context, Result};
use simgit_core::{AppConfig, GitStatusProvider, PresentationSink, RepositoryStatusProvider};

/// Print the pending changes of a repository once
pub fn execute(args: StatusArgs, config: &AppConfig) -> Result<()> {
    let root = match args.path {
        Some(path) => resolve_path(&path)?,
        None => open_registry(config)?
            .last_active()
            .map(|info| info.path.clone())
            .context("No repository given and no last active repository")?,
    };

    let provider = GitStatusProvider::new(config.status.clone());
    let sink = TerminalSink::new();
    match provider.changed_paths(&root) {
        Ok(paths) => sink.show_changes(&paths),
        Err(e) => sink.show_status_unavailable(&e.to_string()),
    }
    Ok(())
}
