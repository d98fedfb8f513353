//! Which paths under the watched root are protected.
//!
//! Everything under the root is in scope except the version store and
//! whatever `.revwatchignore` excludes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::ignore_patterns::IgnorePatterns;

#[derive(Debug, Clone)]
pub struct WatchScope {
    root: PathBuf,
    versions_root: PathBuf,
    ignore: Arc<IgnorePatterns>,
}

impl WatchScope {
    /// Scope for `root` with the version store at `root/<versions_dir>`
    pub fn new(root: PathBuf, versions_dir: &str) -> Self {
        let versions_root = root.join(versions_dir);
        Self {
            root,
            versions_root,
            ignore: Arc::new(IgnorePatterns::empty()),
        }
    }

    pub fn with_ignore(mut self, patterns: IgnorePatterns) -> Self {
        self.ignore = Arc::new(patterns);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_root(&self) -> &Path {
        &self.versions_root
    }

    /// True for the version store directory and anything inside it
    pub fn is_version_store(&self, path: &Path) -> bool {
        path.starts_with(&self.versions_root)
    }

    /// True if `path` lies under the root and is neither part of the version
    /// store nor ignored.
    pub fn covers(&self, path: &Path, is_dir: bool) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        !self.is_version_store(path) && !self.ignore.is_ignored(relative, is_dir)
    }
}
