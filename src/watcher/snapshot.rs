//! Last-known content of every tracked file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use crate::fs::FileSystem;

/// Shared, immutable file content
pub type Content = Arc<[u8]>;

/// Result of [`SnapshotStore::swap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swap {
    Replaced,
    /// Another worker changed the entry since it was read; left as is
    Stale,
    /// The path is no longer tracked (deleted meanwhile); nothing re-added
    Untracked,
}

/// Maps absolute file paths to the bytes seen at the last processed event.
///
/// The map is the synchronization boundary: every operation is atomic per
/// key and no caller holds a lock across operations.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    files: DashMap<PathBuf, Content>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every path into a fresh store. Files that cannot be read are left
    /// untracked.
    pub fn load(fs: &dyn FileSystem, paths: &[PathBuf]) -> Self {
        let store = Self::new();
        for path in paths {
            match fs.read(path) {
                Ok(bytes) => store.insert(path.clone(), bytes),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }
        store
    }

    pub fn get(&self, path: &Path) -> Option<Content> {
        self.files.get(path).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// True if `path` is tracked with exactly `bytes`
    pub fn holds(&self, path: &Path, bytes: &[u8]) -> bool {
        self.files
            .get(path)
            .is_some_and(|entry| entry.value().as_ref() == bytes)
    }

    /// Track `path` with `bytes`, replacing any previous content
    pub fn insert(&self, path: PathBuf, bytes: impl Into<Content>) {
        self.files.insert(path, bytes.into());
    }

    /// Replace the content of `path` only while it still holds `expected`,
    /// the very buffer returned by an earlier [`get`](Self::get). Equal bytes
    /// from a different read do not count.
    pub fn swap(&self, path: &Path, expected: &Content, bytes: impl Into<Content>) -> Swap {
        match self.files.get_mut(path) {
            Some(mut entry) if Arc::ptr_eq(entry.value(), expected) => {
                *entry.value_mut() = bytes.into();
                Swap::Replaced
            }
            Some(_) => Swap::Stale,
            None => Swap::Untracked,
        }
    }

    pub fn remove(&self, path: &Path) -> Option<Content> {
        self.files.remove(path).map(|(_, content)| content)
    }

    /// Tracked files strictly below `dir`, sorted
    pub fn paths_under(&self, dir: &Path) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self
            .files
            .iter()
            .filter(|entry| entry.key() != dir && entry.key().starts_with(dir))
            .map(|entry| entry.key().clone())
            .collect();
        paths.sort();
        paths
    }

    /// True if any tracked file lives below `dir`
    pub fn tracks_under(&self, dir: &Path) -> bool {
        self.files
            .iter()
            .any(|entry| entry.key() != dir && entry.key().starts_with(dir))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
