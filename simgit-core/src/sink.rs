//! Presentation boundary
//!
//! The core pushes ordered string sequences into a sink and never cares
//! which thread it is called from; thread affinity is the sink's problem.

use tracing::warn;

/// Receives what should be displayed
pub trait PresentationSink: Send + Sync {
    /// Repository names, already in display order
    fn show_repositories(&self, names: &[String]);

    /// Changed paths of the active repository; empty means no pending changes
    fn show_changes(&self, paths: &[String]);

    /// The active repository's status could not be computed
    ///
    /// Distinct from an empty change list.
    fn show_status_unavailable(&self, reason: &str) {
        warn!("Repository status unavailable: {}", reason);
    }
}
