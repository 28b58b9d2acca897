//! Filesystem monitoring and change-set publication
//!
//! This module turns the raw notification stream of a repository working
//! tree into a low-frequency stream of status recomputations:
//! - Raw events are filtered at the source (access events, ignore patterns)
//! - Bursts are coalesced until a quiet period elapses (a "settle")
//! - Each settle triggers at most one in-flight status computation
//! - Results are published, tagged with the session they belong to

pub mod debouncer;
pub mod session;
pub mod watcher;

pub use session::{SessionState, WatchSession};
pub use watcher::EventFilter;

use crate::error::{MonitorError, StatusError};
use crate::status::RepositoryStatusProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use session::SessionShared;

/// Process-unique identifier of one watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Allocate the next identifier; identifiers only ever increase
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of the paths that currently differ from the last commit
///
/// Always replaced wholesale; there is no incremental update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    paths: Vec<String>,
}

impl ChangeSet {
    pub fn new(paths: Vec<String>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}

impl From<Vec<String>> for ChangeSet {
    fn from(paths: Vec<String>) -> Self {
        Self::new(paths)
    }
}

/// Result of one status recomputation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// The repository was read; an empty set means no pending changes
    Changes(ChangeSet),
    /// The status could not be computed this time
    Unavailable(StatusError),
}

/// A recomputation result, tagged with where it came from
#[derive(Debug, Clone)]
pub struct Publication {
    pub session: SessionId,
    pub root: PathBuf,
    pub outcome: StatusOutcome,
}

/// What happened to a publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The originating session is no longer current; dropped silently
    StaleSession,
}

/// The single consumer of a monitor's publications
///
/// Called from a tokio task while the session's state lock is held, so
/// implementations must not start or stop sessions from inside `publish`.
pub trait Publisher: Send + Sync {
    fn publish(&self, publication: Publication) -> Delivery;
}

impl<F> Publisher for F
where
    F: Fn(Publication) -> Delivery + Send + Sync,
{
    fn publish(&self, publication: Publication) -> Delivery {
        self(publication)
    }
}

/// Configuration for the monitoring pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Quiet period in milliseconds that must pass without events before a recomputation
    pub quiet_period_ms: u64,
    /// Gitignore-style patterns, relative to the repository root, whose events are dropped
    pub ignore_patterns: Vec<String>,
}

impl MonitorConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 300,
            ignore_patterns: vec![
                ".git/objects/".to_string(),
                ".git/logs/".to_string(),
                ".git/**/*.lock".to_string(),
            ],
        }
    }
}

/// Marker sent for every relevant raw filesystem event
///
/// Events are never interpreted individually; any of them just means
/// "something changed, recompute".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawNotification;

/// Watches one repository root at a time and publishes its change sets
pub struct ChangeMonitor {
    config: MonitorConfig,
    provider: Arc<dyn RepositoryStatusProvider>,
    publisher: Arc<dyn Publisher>,
    live: Arc<Mutex<Option<SessionId>>>,
}

impl ChangeMonitor {
    /// Create a new change monitor
    pub fn new(
        config: MonitorConfig,
        provider: Arc<dyn RepositoryStatusProvider>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            provider,
            publisher,
            live: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Begin recursive observation of `root`
    ///
    /// Must be called from within a tokio runtime. One recomputation is
    /// scheduled immediately so the initial state is populated without
    /// waiting for a file event.
    pub fn start(&self, root: impl AsRef<Path>) -> Result<WatchSession, MonitorError> {
        self.start_session(SessionId::next(), root.as_ref())
    }

    /// Start a session under an identifier the caller allocated up front
    pub(crate) fn start_session(&self, id: SessionId, root: &Path) -> Result<WatchSession, MonitorError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;
        validate_root(root)?;

        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = *live {
            return Err(MonitorError::SessionStillActive { session });
        }

        let filter = EventFilter::new(root, &self.config.ignore_patterns)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let os_watcher = watcher::watch(root, filter, events_tx.clone())?;

        let shared = Arc::new(SessionShared::new(id, root.to_path_buf()));
        let tasks = vec![
            runtime.spawn(debouncer::run(events_rx, self.config.quiet_period(), shared.clone())),
            runtime.spawn(session::recompute_loop(
                shared.clone(),
                self.provider.clone(),
                self.publisher.clone(),
            )),
        ];
        shared.request_recompute();

        *live = Some(id);
        info!("Watching {:?} (session {}, quiet period {}ms)", root, id, self.config.quiet_period_ms);

        Ok(WatchSession::new(shared, os_watcher, events_tx, tasks, self.live.clone()))
    }

    /// End observation for `session`; idempotent
    pub fn stop(&self, session: &mut WatchSession) {
        session.dispose();
    }

    /// Identifier of the session that is currently active, if any
    pub fn live_session(&self) -> Option<SessionId> {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_root(root: &Path) -> Result<(), MonitorError> {
    let invalid = |reason: String| MonitorError::InvalidRoot {
        path: root.to_path_buf(),
        reason,
    };

    let metadata = std::fs::metadata(root).map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    std::fs::read_dir(root).map_err(|e| invalid(format!("not readable: {}", e)))?;
    Ok(())
}
