//! Core functionality for simgit
//!
//! This crate keeps a "pending changes" view of a git working tree in sync
//! with the filesystem. Raw filesystem notifications are debounced into
//! settles, each settle triggers a full status recomputation, and the result
//! is published to a single presentation sink, tagged with the watch session
//! it belongs to so that switching repositories can never leak stale results.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod monitor;
pub mod registry;
pub mod settings;
pub mod sink;
pub mod status;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::AppConfig;
pub use error::{MonitorError, PersistenceError, StatusError};
pub use lifecycle::MonitorLifecycleManager;
pub use monitor::{
    ChangeMonitor, ChangeSet, Delivery, MonitorConfig, Publication, Publisher, SessionId,
    SessionState, StatusOutcome, WatchSession,
};
pub use registry::{RepositoryInfo, RepositoryRegistry};
pub use settings::{Settings, SettingsStore, TomlSettingsStore};
pub use sink::PresentationSink;
pub use status::{GitStatusProvider, RepositoryStatusProvider, StatusConfig};
