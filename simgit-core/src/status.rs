//! Repository status providers
//!
//! The monitor only needs one question answered: which files differ from
//! HEAD right now. [`GitStatusProvider`] answers it with git2.

use crate::error::StatusError;
use git2::{DiffOptions, ErrorCode, Repository};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::trace;

/// Computes the ordered set of changed paths of a repository
///
/// Implementations may block on I/O; the monitor calls them off the async
/// executor.
pub trait RepositoryStatusProvider: Send + Sync {
    /// Paths relative to `root` that differ from HEAD
    fn changed_paths(&self, root: &Path) -> Result<Vec<String>, StatusError>;
}

/// Status provider configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Also report files that are not tracked yet
    pub include_untracked: bool,
}

/// Git status via git2
///
/// Compares the HEAD tree against the working directory, with the index
/// in between, so both staged and unstaged changes are reported.
#[derive(Debug, Clone, Default)]
pub struct GitStatusProvider {
    config: StatusConfig,
}

impl GitStatusProvider {
    pub fn new(config: StatusConfig) -> Self {
        Self { config }
    }

    fn open(root: &Path) -> Result<Repository, StatusError> {
        let repo = Repository::open(root).map_err(|e| match e.code() {
            ErrorCode::NotFound => StatusError::NotARepository {
                path: root.to_path_buf(),
            },
            _ => io_failure(root, e),
        })?;

        if repo.is_bare() {
            return Err(StatusError::NotARepository {
                path: root.to_path_buf(),
            });
        }
        Ok(repo)
    }
}

impl RepositoryStatusProvider for GitStatusProvider {
    fn changed_paths(&self, root: &Path) -> Result<Vec<String>, StatusError> {
        let repo = Self::open(root)?;

        // An unborn branch has no tree yet: diff against the empty tree
        let head_tree = match repo.head() {
            Ok(head) => Some(head.peel_to_tree().map_err(|e| io_failure(root, e))?),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
            Err(e) => return Err(io_failure(root, e)),
        };

        let mut opts = DiffOptions::new();
        opts.include_untracked(self.config.include_untracked)
            .recurse_untracked_dirs(self.config.include_untracked);

        let diff = repo
            .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))
            .map_err(|e| io_failure(root, e))?;

        let mut paths: Vec<String> = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().replace('\\', "/"))
            .collect();
        paths.sort();
        paths.dedup();

        trace!("{} changed paths in {:?}", paths.len(), root);
        Ok(paths)
    }
}

fn io_failure(root: &Path, e: git2::Error) -> StatusError {
    StatusError::IoFailure {
        path: root.to_path_buf(),
        message: e.message().to_string(),
    }
}
