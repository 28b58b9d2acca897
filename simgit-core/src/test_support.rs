//! Shared fixtures for unit tests

use crate::error::{PersistenceError, StatusError};
use crate::monitor::{Delivery, Publication, Publisher};
use crate::settings::{Settings, SettingsStore};
use crate::sink::PresentationSink;
use crate::status::RepositoryStatusProvider;
use git2::{Repository, Signature};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Provider returning a fixed answer, counting calls and overlap
pub struct ScriptedProvider {
    paths: Vec<String>,
    failure: Mutex<Option<StatusError>>,
    delay: Duration,
    calls: AtomicUsize,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(paths: Vec<String>) -> Self {
        Self {
            paths,
            failure: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_with(&self, failure: Option<StatusError>) {
        *self.failure.lock().unwrap() = failure;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

impl RepositoryStatusProvider for ScriptedProvider {
    fn changed_paths(&self, _root: &Path) -> Result<Vec<String>, StatusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let result = match self.failure.lock().unwrap().clone() {
            Some(failure) => Err(failure),
            None => Ok(self.paths.clone()),
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Publisher keeping every publication it receives
#[derive(Default)]
pub struct RecordingPublisher {
    publications: Mutex<Vec<Publication>>,
}

impl RecordingPublisher {
    pub fn len(&self) -> usize {
        self.publications.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Publication> {
        self.publications.lock().unwrap().last().cloned()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, publication: Publication) -> Delivery {
        self.publications.lock().unwrap().push(publication);
        Delivery::Delivered
    }
}

/// Sink keeping every call it receives
#[derive(Default)]
pub struct RecordingSink {
    repositories: Mutex<Vec<Vec<String>>>,
    changes: Mutex<Vec<Vec<String>>>,
    unavailable: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn repositories(&self) -> Vec<Vec<String>> {
        self.repositories.lock().unwrap().clone()
    }

    pub fn change_count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }

    pub fn last_changes(&self) -> Option<Vec<String>> {
        self.changes.lock().unwrap().last().cloned()
    }

    pub fn changes_since(&self, index: usize) -> Vec<Vec<String>> {
        self.changes.lock().unwrap()[index..].to_vec()
    }

    pub fn unavailable(&self) -> Vec<String> {
        self.unavailable.lock().unwrap().clone()
    }
}

impl PresentationSink for RecordingSink {
    fn show_repositories(&self, names: &[String]) {
        self.repositories.lock().unwrap().push(names.to_vec());
    }

    fn show_changes(&self, paths: &[String]) {
        self.changes.lock().unwrap().push(paths.to_vec());
    }

    fn show_status_unavailable(&self, reason: &str) {
        self.unavailable.lock().unwrap().push(reason.to_string());
    }
}

/// In-memory settings store
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
    failing: bool,
}

impl MemorySettingsStore {
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            settings: Mutex::new(Settings::default()),
            failing: true,
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    fn failure() -> PersistenceError {
        PersistenceError::io(
            "memory",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "store unavailable"),
        )
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, PersistenceError> {
        if self.failing {
            return Err(Self::failure());
        }
        Ok(self.snapshot())
    }

    fn save(&self, settings: &Settings) -> Result<(), PersistenceError> {
        if self.failing {
            return Err(Self::failure());
        }
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

/// Initialise a non-bare repository at `path`
pub fn init_repo(path: &Path) -> Repository {
    Repository::init(path).unwrap()
}

/// Write `relative` with `content`, stage it and commit on top of HEAD
pub fn commit_file(repo: &Repository, relative: &str, content: &str) {
    let workdir = repo.workdir().unwrap();
    let full_path = workdir.join(relative);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&full_path, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(relative)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let signature = Signature::now("Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, &format!("Add {}", relative), &tree, &parents)
        .unwrap();
}
