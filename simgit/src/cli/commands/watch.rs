//! Watch command: keep the pending changes of one repository on screen

use super::{open_registry, resolve_path};
use crate::cli::app::WatchArgs;
use crate::cli::sink::TerminalSink;
use anyhow::{Context, Result};
use simgit_core::{AppConfig, GitStatusProvider, MonitorLifecycleManager, RepositoryInfo};
use std::sync::Arc;
use tracing::{info, warn};

/// Watch the given (or last active) repository until Ctrl-C
pub async fn execute(args: WatchArgs, config: AppConfig) -> Result<()> {
    let mut registry = open_registry(&config)?;
    let sink = Arc::new(TerminalSink::new());
    let provider = Arc::new(GitStatusProvider::new(config.status.clone()));
    let manager = MonitorLifecycleManager::new(config.monitor.clone(), provider, sink.clone());

    let active = match args.path {
        Some(path) => {
            let path = resolve_path(&path)?;
            let info = registry
                .get(&path)
                .cloned()
                .unwrap_or_else(|| RepositoryInfo::from_path(&path));
            registry.add(info.clone());
            manager
                .set_active(Some(info.clone()))
                .with_context(|| format!("Failed to watch {}", info.path.display()))?;
            info
        }
        None => manager
            .restore(registry.last_active().cloned())
            .context("No repository to watch: pass a path, or watch one once so it is remembered")?,
    };

    registry.publish(sink.as_ref());
    registry.set_last_active(Some(active.clone()));
    if let Err(e) = registry.save() {
        warn!("Failed to save the repository list: {}", e);
    }

    info!("Watching '{}', press Ctrl-C to stop", active.name);
    tokio::signal::ctrl_c().await?;

    manager.set_active(None)?;
    info!("Stopped");
    Ok(())
}
