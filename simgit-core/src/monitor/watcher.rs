//! OS-level watch source using the notify crate

use crate::error::MonitorError;
use crate::monitor::RawNotification;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Decides which raw events count as "something changed"
pub struct EventFilter {
    roots: Vec<PathBuf>,
    ignore: Gitignore,
}

impl EventFilter {
    /// Build a filter for `root` from gitignore-style patterns
    pub fn new(root: &Path, patterns: &[String]) -> Result<Self, MonitorError> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| MonitorError::InvalidIgnorePattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
        }
        let ignore = builder.build().map_err(|e| MonitorError::InvalidIgnorePattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;

        // notify may report canonical paths (e.g. /private/var on macOS)
        let mut roots = vec![root.to_path_buf()];
        if let Ok(canonical) = root.canonicalize() {
            if canonical != root {
                roots.push(canonical);
            }
        }

        Ok(Self { roots, ignore })
    }

    /// Whether `event` should reset the quiet period
    pub fn is_relevant(&self, event: &Event) -> bool {
        // Reading files (the status provider does) must not retrigger a recomputation
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        // Rescan hints arrive without paths; treat them as a change
        if event.paths.is_empty() {
            return true;
        }
        event.paths.iter().any(|path| !self.is_ignored(path))
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let Some(relative) = self.roots.iter().find_map(|root| path.strip_prefix(root).ok()) else {
            return false;
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        self.ignore
            .matched_path_or_any_parents(relative, path.is_dir())
            .is_ignore()
    }
}

/// Subscribe to recursive changes under `root`
///
/// The notify callback runs on the watcher's own thread and only pushes a
/// marker into an unbounded channel, so it never blocks.
pub(crate) fn watch(
    root: &Path,
    filter: EventFilter,
    tx: mpsc::UnboundedSender<RawNotification>,
) -> Result<RecommendedWatcher, MonitorError> {
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        match res {
            Ok(event) => {
                if !filter.is_relevant(&event) {
                    return;
                }
                trace!("Raw event {:?} on {:?}", event.kind, event.paths);
                if tx.send(RawNotification).is_err() {
                    trace!("Watch session already disposed, dropping event");
                }
            }
            Err(e) => {
                // Errors can mean dropped events; a full recomputation covers them
                warn!("Watch error: {}", e);
                let _ = tx.send(RawNotification);
            }
        }
    })?;

    watcher.watch(root, RecursiveMode::Recursive)?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MonitorConfig;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: Vec<PathBuf>) -> Event {
        let mut event = Event::new(kind);
        event.paths = paths;
        event
    }

    fn default_filter(root: &Path) -> EventFilter {
        EventFilter::new(root, &MonitorConfig::default().ignore_patterns).unwrap()
    }

    #[test]
    fn test_access_events_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let filter = default_filter(temp_dir.path());

        let read = event(
            EventKind::Access(AccessKind::Any),
            vec![temp_dir.path().join("src/main.rs")],
        );
        assert!(!filter.is_relevant(&read));
    }

    #[test]
    fn test_working_tree_changes_are_relevant() {
        let temp_dir = TempDir::new().unwrap();
        let filter = default_filter(temp_dir.path());

        let created = event(
            EventKind::Create(CreateKind::File),
            vec![temp_dir.path().join("src/lib.rs")],
        );
        assert!(filter.is_relevant(&created));

        let index = event(
            EventKind::Modify(ModifyKind::Any),
            vec![temp_dir.path().join(".git/index")],
        );
        assert!(filter.is_relevant(&index));
    }

    #[test]
    fn test_git_internals_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let filter = default_filter(temp_dir.path());

        let object = event(
            EventKind::Create(CreateKind::File),
            vec![temp_dir.path().join(".git/objects/ab/cdef0123")],
        );
        assert!(!filter.is_relevant(&object));

        let lock = event(
            EventKind::Create(CreateKind::File),
            vec![temp_dir.path().join(".git/index.lock")],
        );
        assert!(!filter.is_relevant(&lock));
    }

    #[test]
    fn test_event_with_one_relevant_path_counts() {
        let temp_dir = TempDir::new().unwrap();
        let filter = default_filter(temp_dir.path());

        let rename = event(
            EventKind::Modify(ModifyKind::Any),
            vec![
                temp_dir.path().join(".git/index.lock"),
                temp_dir.path().join(".git/index"),
            ],
        );
        assert!(filter.is_relevant(&rename));
    }

    #[test]
    fn test_paths_outside_root_and_rescans_are_relevant() {
        let temp_dir = TempDir::new().unwrap();
        let filter = default_filter(temp_dir.path());

        assert!(filter.is_relevant(&event(EventKind::Other, vec![])));
        assert!(filter.is_relevant(&event(
            EventKind::Modify(ModifyKind::Any),
            vec![PathBuf::from("/somewhere/else")],
        )));
    }

    #[test]
    fn test_custom_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let filter = EventFilter::new(temp_dir.path(), &["target/".to_string(), "*.tmp".to_string()])
            .unwrap();

        assert!(!filter.is_relevant(&event(
            EventKind::Create(CreateKind::File),
            vec![temp_dir.path().join("target/debug/build.log")],
        )));
        assert!(!filter.is_relevant(&event(
            EventKind::Create(CreateKind::File),
            vec![temp_dir.path().join("notes.tmp")],
        )));
        assert!(filter.is_relevant(&event(
            EventKind::Create(CreateKind::File),
            vec![temp_dir.path().join("notes.md")],
        )));
    }
}
