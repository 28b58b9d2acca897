//! Lifecycle of the active repository's watch session
//!
//! Exactly one session runs at a time, bound to the active repository.
//! Switching repositories invalidates and disposes the old session before
//! the new one starts, and every publication is checked against the current
//! binding, so a result computed for one repository is never shown for
//! another.

use crate::error::MonitorError;
use crate::monitor::{
    ChangeMonitor, ChangeSet, Delivery, MonitorConfig, Publication, Publisher, SessionId,
    StatusOutcome, WatchSession,
};
use crate::registry::RepositoryInfo;
use crate::sink::PresentationSink;
use crate::status::RepositoryStatusProvider;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace, warn};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which session is allowed to publish, and for which repository
struct Binding {
    session: SessionId,
    repository: RepositoryInfo,
    latest: Option<StatusOutcome>,
}

/// Forwards publications of the current session to the sink
///
/// Holds the binding lock while delivering, so a switch cannot complete
/// in the middle of a delivery.
struct ActivePublisher {
    binding: Arc<Mutex<Option<Binding>>>,
    sink: Arc<dyn PresentationSink>,
}

impl Publisher for ActivePublisher {
    fn publish(&self, publication: Publication) -> Delivery {
        let mut binding = lock(&self.binding);
        let Some(current) = binding.as_mut().filter(|b| b.session == publication.session) else {
            trace!(
                "Dropping result of stale session {} for {:?}",
                publication.session, publication.root
            );
            return Delivery::StaleSession;
        };

        match &publication.outcome {
            StatusOutcome::Changes(changes) => {
                debug!("{} pending changes in '{}'", changes.len(), current.repository.name);
                self.sink.show_changes(changes.paths());
            }
            StatusOutcome::Unavailable(e) => {
                self.sink
                    .show_status_unavailable(&format!("{}: {}", current.repository.name, e));
            }
        }
        current.latest = Some(publication.outcome);
        Delivery::Delivered
    }
}

/// Owns the single active watch session
pub struct MonitorLifecycleManager {
    monitor: ChangeMonitor,
    /// Also serialises concurrent switches
    session: Mutex<Option<WatchSession>>,
    binding: Arc<Mutex<Option<Binding>>>,
    sink: Arc<dyn PresentationSink>,
}

impl MonitorLifecycleManager {
    pub fn new(
        config: MonitorConfig,
        provider: Arc<dyn RepositoryStatusProvider>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        let binding = Arc::new(Mutex::new(None));
        let publisher = Arc::new(ActivePublisher {
            binding: binding.clone(),
            sink: sink.clone(),
        });

        Self {
            monitor: ChangeMonitor::new(config, provider, publisher),
            session: Mutex::new(None),
            binding,
            sink,
        }
    }

    /// Make `repository` the active one, or clear it with `None`
    ///
    /// The previous session is fully disposed before anything else happens.
    /// On a start failure no session is left running and the error is
    /// returned. Must be called from within a tokio runtime.
    pub fn set_active(&self, repository: Option<RepositoryInfo>) -> Result<(), MonitorError> {
        let mut session = lock(&self.session);

        // Invalidate first: in-flight results of the old session are now stale.
        // The binding lock is released before disposing, since a publishing
        // task may hold its session lock while waiting for the binding.
        let previous = lock(&self.binding).take();
        if let Some(mut old) = session.take() {
            old.dispose();
        }
        if let Some(previous) = previous {
            info!("Deactivated repository '{}'", previous.repository.name);
        }
        self.sink.show_changes(&[]);

        let Some(repository) = repository else {
            info!("No active repository");
            return Ok(());
        };

        let id = SessionId::next();
        *lock(&self.binding) = Some(Binding {
            session: id,
            repository: repository.clone(),
            latest: None,
        });

        match self.monitor.start_session(id, &repository.path) {
            Ok(started) => {
                info!("Activated repository '{}' at {:?}", repository.name, repository.path);
                *session = Some(started);
                Ok(())
            }
            Err(e) => {
                lock(&self.binding).take();
                warn!("Failed to activate repository '{}': {}", repository.name, e);
                Err(e)
            }
        }
    }

    /// Re-activate the persisted last-active repository if its directory still exists
    pub fn restore(&self, last_active: Option<RepositoryInfo>) -> Option<RepositoryInfo> {
        let repository = last_active?;
        if !repository.path.is_dir() {
            debug!("Last active repository {:?} no longer exists", repository.path);
            return None;
        }

        match self.set_active(Some(repository.clone())) {
            Ok(()) => Some(repository),
            Err(e) => {
                warn!("Could not restore '{}': {}", repository.name, e);
                None
            }
        }
    }

    /// The active repository, if any
    pub fn active(&self) -> Option<RepositoryInfo> {
        lock(&self.binding).as_ref().map(|b| b.repository.clone())
    }

    /// Identifier of the session currently allowed to publish
    pub fn active_session(&self) -> Option<SessionId> {
        lock(&self.binding).as_ref().map(|b| b.session)
    }

    /// Last change set delivered for the active repository
    pub fn current_changes(&self) -> Option<ChangeSet> {
        lock(&self.binding)
            .as_ref()
            .and_then(|b| match &b.latest {
                Some(StatusOutcome::Changes(changes)) => Some(changes.clone()),
                _ => None,
            })
    }

    /// Last outcome delivered for the active repository, failures included
    pub fn latest_outcome(&self) -> Option<StatusOutcome> {
        lock(&self.binding).as_ref().and_then(|b| b.latest.clone())
    }

    /// Ask the active session for a recomputation, as if files had changed
    pub fn refresh(&self) {
        if let Some(session) = lock(&self.session).as_ref() {
            session.signal_change();
        }
    }

    /// Number of status computations started by the active session
    pub fn recompute_count(&self) -> Option<u64> {
        lock(&self.session).as_ref().map(|s| s.recompute_count())
    }
}
