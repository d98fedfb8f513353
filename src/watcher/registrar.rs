//! Directory registration with the OS notification facility
//!
//! Every directory under the root (minus the version store and ignored
//! paths) is watched non-recursively and exactly once. Directories that
//! appear at runtime are registered before their contents are scanned so
//! nothing written into them afterwards is missed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::RevwatchResult;
use crate::fs::{FileSystem, WalkErrors};
use crate::scope::WatchScope;

/// Seam over the OS watch facility
pub trait WatchFacility: Send {
    /// Start delivering create/modify/delete notifications for `dir`'s entries
    fn watch(&mut self, dir: &Path) -> notify::Result<()>;

    /// Stop watching `dir`
    fn unwatch(&mut self, dir: &Path) -> notify::Result<()>;
}

/// The platform's native watcher
pub struct NotifyFacility {
    watcher: RecommendedWatcher,
}

impl NotifyFacility {
    pub fn new(watcher: RecommendedWatcher) -> Self {
        Self { watcher }
    }
}

impl WatchFacility for NotifyFacility {
    fn watch(&mut self, dir: &Path) -> notify::Result<()> {
        self.watcher.watch(dir, RecursiveMode::NonRecursive)
    }

    fn unwatch(&mut self, dir: &Path) -> notify::Result<()> {
        self.watcher.unwatch(dir)
    }
}

/// Facility that records calls instead of talking to the OS
#[derive(Debug, Clone, Default)]
pub struct RecordingFacility {
    watched: Arc<Mutex<Vec<PathBuf>>>,
    unwatched: Arc<Mutex<Vec<PathBuf>>>,
}

impl RecordingFacility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn unwatched(&self) -> Vec<PathBuf> {
        self.unwatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl WatchFacility for RecordingFacility {
    fn watch(&mut self, dir: &Path) -> notify::Result<()> {
        self.watched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(dir.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, dir: &Path) -> notify::Result<()> {
        self.unwatched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(dir.to_path_buf());
        Ok(())
    }
}

/// Outcome of registering a single directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered,
    AlreadyRegistered,
    /// Gone (or no longer a directory) by the time we got to it
    Vanished,
    /// Outside the scope (version store, ignored)
    Excluded,
    /// The facility refused; the subtree stays unwatched
    Failed(String),
    /// The facility has been shut down
    Closed,
}

/// A directory that appeared at runtime, after registration and scanning
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NewDirectory {
    /// Directories (the new one and any nested ones) now being watched
    pub registered: Vec<PathBuf>,
    /// Files already inside, to be versioned as creations
    pub files: Vec<PathBuf>,
}

struct Inner {
    facility: Option<Box<dyn WatchFacility>>,
    registered: HashSet<PathBuf>,
}

pub struct WatchRegistrar {
    inner: Mutex<Inner>,
    fs: Arc<dyn FileSystem>,
    scope: WatchScope,
}

impl WatchRegistrar {
    pub fn new(
        facility: Box<dyn WatchFacility>,
        fs: Arc<dyn FileSystem>,
        scope: WatchScope,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                facility: Some(facility),
                registered: HashSet::new(),
            }),
            fs,
            scope,
        }
    }

    /// Register the root and every directory below it.
    ///
    /// A failed walk is fatal: without it we cannot promise the whole tree is
    /// watched. Individual registration failures are logged and skipped.
    pub fn watch_all(&self) -> RevwatchResult<usize> {
        let dirs = self
            .fs
            .list_dirs(self.scope.root(), &self.scope, WalkErrors::Abort)?;
        let registered = dirs
            .iter()
            .filter(|dir| self.register_directory(dir) == Registration::Registered)
            .count();
        info!(
            root = %self.scope.root().display(),
            directories = registered,
            "registered directory tree"
        );
        Ok(registered)
    }

    /// Register one directory unless it is already registered.
    pub fn register_directory(&self, dir: &Path) -> Registration {
        if !self.scope.covers(dir, true) {
            return Registration::Excluded;
        }
        if !self.fs.exists(dir) || !self.fs.is_dir(dir) {
            debug!(path = %dir.display(), "directory vanished before registration");
            return Registration::Vanished;
        }

        let mut inner = self.lock();
        if inner.registered.contains(dir) {
            return Registration::AlreadyRegistered;
        }
        let Some(facility) = inner.facility.as_mut() else {
            return Registration::Closed;
        };

        match facility.watch(dir) {
            Ok(()) => {
                inner.registered.insert(dir.to_path_buf());
                debug!(path = %dir.display(), "watching directory");
                Registration::Registered
            }
            Err(e) if matches!(e.kind, notify::ErrorKind::PathNotFound) => {
                debug!(path = %dir.display(), "directory vanished during registration");
                Registration::Vanished
            }
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to register directory, subtree unwatched");
                Registration::Failed(e.to_string())
            }
        }
    }

    /// Handle a directory created at runtime: register it and everything
    /// nested in it, then list the files it already contains. An entry that
    /// cannot be read only costs its own subtree.
    pub fn on_directory_created(&self, dir: &Path) -> NewDirectory {
        let dirs = match self.fs.list_dirs(dir, &self.scope, WalkErrors::Skip) {
            Ok(dirs) => dirs,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to list new directory");
                vec![dir.to_path_buf()]
            }
        };

        let registered: Vec<PathBuf> = dirs
            .into_iter()
            .filter(|d| self.register_directory(d) == Registration::Registered)
            .collect();

        let files = match self.fs.list_files(dir, &self.scope, WalkErrors::Skip) {
            Ok(files) => files,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to scan new directory");
                Vec::new()
            }
        };

        NewDirectory { registered, files }
    }

    pub fn is_registered(&self, dir: &Path) -> bool {
        self.lock().registered.contains(dir)
    }

    /// Forget a deleted directory and everything registered below it so the
    /// same path can be registered again if it reappears.
    pub fn forget_tree(&self, dir: &Path) -> Vec<PathBuf> {
        let mut inner = self.lock();
        let gone: Vec<PathBuf> = inner
            .registered
            .iter()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect();
        for path in &gone {
            inner.registered.remove(path);
        }
        if let Some(facility) = inner.facility.as_mut() {
            for path in &gone {
                // The OS usually drops the watch together with the directory.
                let _ = facility.unwatch(path);
            }
        }
        gone
    }

    pub fn registered_count(&self) -> usize {
        self.lock().registered.len()
    }

    /// Release the OS watch handle. Later registrations return `Closed`.
    pub fn close(&self) {
        let mut inner = self.lock();
        if inner.facility.take().is_some() {
            debug!("watch facility closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.lock().facility.is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
