//! Watch sessions and the recomputation task that serves them

use crate::error::StatusError;
use crate::monitor::{
    ChangeSet, Delivery, Publication, Publisher, RawNotification, SessionId, StatusOutcome,
};
use crate::status::RepositoryStatusProvider;
use notify::RecommendedWatcher;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Lifecycle of a watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Receiving events
    Active,
    /// No further events, recomputations or publications are possible
    Disposed,
}

struct SessionInner {
    state: SessionState,
    settles: u64,
    recomputations: u64,
}

/// State shared between a session handle and its tasks
///
/// Every trigger and every publication checks `state` under the same lock
/// that disposal takes, so nothing happens for a session after
/// [`WatchSession::dispose`] returns.
pub(crate) struct SessionShared {
    id: SessionId,
    root: PathBuf,
    inner: Mutex<SessionInner>,
    /// Holds at most one permit: the "dirty again" flag
    recompute: Notify,
}

impl SessionShared {
    pub(crate) fn new(id: SessionId, root: PathBuf) -> Self {
        Self {
            id,
            root,
            inner: Mutex::new(SessionInner {
                state: SessionState::Active,
                settles: 0,
                recomputations: 0,
            }),
            recompute: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask for a recomputation; requests made while one is queued collapse
    pub(crate) fn request_recompute(&self) {
        self.recompute.notify_one();
    }

    /// Record a settled burst; returns false once the session is disposed
    pub(crate) fn settle(&self, burst: usize) -> bool {
        let mut inner = self.lock();
        if inner.state == SessionState::Disposed {
            return false;
        }
        inner.settles += 1;
        debug!("Session {} settled after {} raw events", self.id, burst);
        self.request_recompute();
        true
    }

    fn begin_recompute(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == SessionState::Disposed {
            return false;
        }
        inner.recomputations += 1;
        true
    }

    fn publish(&self, outcome: StatusOutcome, publisher: &dyn Publisher) -> Delivery {
        let inner = self.lock();
        if inner.state == SessionState::Disposed {
            trace!("Session {} disposed, discarding its result", self.id);
            return Delivery::StaleSession;
        }
        publisher.publish(Publication {
            session: self.id,
            root: self.root.clone(),
            outcome,
        })
    }

    /// Move to `Disposed`; returns false if it already was
    pub(crate) fn dispose(&self) -> bool {
        let mut inner = self.lock();
        if inner.state == SessionState::Disposed {
            return false;
        }
        inner.state = SessionState::Disposed;
        true
    }

    pub(crate) fn state(&self) -> SessionState {
        self.lock().state
    }

    pub(crate) fn settle_count(&self) -> u64 {
        self.lock().settles
    }

    pub(crate) fn recompute_count(&self) -> u64 {
        self.lock().recomputations
    }
}

/// Run status computations one at a time, as requested
pub(crate) async fn recompute_loop(
    shared: Arc<SessionShared>,
    provider: Arc<dyn RepositoryStatusProvider>,
    publisher: Arc<dyn Publisher>,
) {
    loop {
        shared.recompute.notified().await;
        if !shared.begin_recompute() {
            break;
        }

        let started = Instant::now();
        let root = shared.root.clone();
        let task_provider = provider.clone();
        let outcome = match tokio::task::spawn_blocking(move || task_provider.changed_paths(&root)).await {
            Ok(Ok(paths)) => StatusOutcome::Changes(ChangeSet::new(paths)),
            Ok(Err(e)) => {
                warn!("Status unavailable for {:?}: {}", shared.root, e);
                StatusOutcome::Unavailable(e)
            }
            Err(e) => {
                warn!("Status computation for {:?} did not complete: {}", shared.root, e);
                StatusOutcome::Unavailable(StatusError::IoFailure {
                    path: shared.root.clone(),
                    message: e.to_string(),
                })
            }
        };

        debug!(
            "Session {} recomputed status in {:?}",
            shared.id,
            started.elapsed()
        );
        if shared.publish(outcome, publisher.as_ref()) == Delivery::StaleSession {
            trace!("Publication from session {} was stale", shared.id);
        }
    }
}

/// One live filesystem subscription bound to one repository root
///
/// Dropping the session disposes it.
pub struct WatchSession {
    shared: Arc<SessionShared>,
    watcher: Option<RecommendedWatcher>,
    events: Option<mpsc::UnboundedSender<RawNotification>>,
    tasks: Vec<JoinHandle<()>>,
    live: Arc<Mutex<Option<SessionId>>>,
}

impl WatchSession {
    pub(crate) fn new(
        shared: Arc<SessionShared>,
        watcher: RecommendedWatcher,
        events: mpsc::UnboundedSender<RawNotification>,
        tasks: Vec<JoinHandle<()>>,
        live: Arc<Mutex<Option<SessionId>>>,
    ) -> Self {
        Self {
            shared,
            watcher: Some(watcher),
            events: Some(events),
            tasks,
            live,
        }
    }

    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    pub fn root(&self) -> &Path {
        &self.shared.root
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Feed a raw notification as if the filesystem had reported one
    pub fn signal_change(&self) {
        if let Some(events) = &self.events {
            let _ = events.send(RawNotification);
        }
    }

    /// Number of settled bursts so far
    pub fn settle_count(&self) -> u64 {
        self.shared.settle_count()
    }

    /// Number of status computations started so far
    pub fn recompute_count(&self) -> u64 {
        self.shared.recompute_count()
    }

    /// Stop observing; idempotent
    ///
    /// Cancels any pending quiet period. A computation already running is
    /// allowed to finish but its result is discarded.
    pub fn dispose(&mut self) {
        if !self.shared.dispose() {
            return;
        }

        // Dropping the watcher ends the OS subscription
        self.watcher.take();
        self.events.take();
        for task in self.tasks.drain(..) {
            task.abort();
        }

        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if *live == Some(self.shared.id) {
            *live = None;
        }
        info!("Stopped watching {:?} (session {})", self.shared.root, self.shared.id);
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("id", &self.shared.id)
            .field("root", &self.shared.root)
            .field("state", &self.state())
            .finish()
    }
}
