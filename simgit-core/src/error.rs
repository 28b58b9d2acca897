//! Error types for the change-monitoring pipeline
//!
//! Each collaborator boundary gets its own strongly-typed error, using
//! thiserror for the trait implementations. None of them is fatal to the
//! process: callers decide whether to report, retry or absorb.

use std::path::PathBuf;
use thiserror::Error;

use crate::monitor::SessionId;

/// Errors raised when a watch session cannot be started
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The watch target is missing, not a directory, or unreadable
    #[error("Invalid watch root {path:?}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// The OS-level watch could not be established
    #[error("Failed to establish filesystem watch: {0}")]
    Watch(#[from] notify::Error),

    /// A previous session of the same monitor has not been disposed yet
    #[error("Session {session} is still active")]
    SessionStillActive { session: SessionId },

    /// Sessions spawn tasks and need a tokio runtime
    #[error("No tokio runtime available to drive the watch session")]
    NoRuntime,

    /// An ignore pattern could not be compiled
    #[error("Invalid ignore pattern '{pattern}': {message}")]
    InvalidIgnorePattern { pattern: String, message: String },
}

/// Errors reported by a repository status provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    /// The path is not the root of a valid repository
    #[error("{path:?} is not a repository")]
    NotARepository { path: PathBuf },

    /// The repository exists but reading its state failed
    #[error("Failed to read repository status at {path:?}: {message}")]
    IoFailure { path: PathBuf, message: String },
}

/// Errors raised while loading or saving persisted settings
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Settings I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("No per-user configuration directory on this platform")]
    NoConfigDir,
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
