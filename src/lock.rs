//! Single-instance lock on the version store.
//!
//! Two watchers on the same root would race each other writing artifacts,
//! so the service holds an exclusive advisory lock for its whole lifetime.
//! The OS drops the lock when the process dies.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{RevwatchError, RevwatchResult};

/// Lock file name inside the version store
pub const LOCK_FILE: &str = ".revwatch.lock";

#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Try to take the lock in `versions_root` without blocking.
    pub fn acquire(versions_root: &Path) -> RevwatchResult<Self> {
        fs::create_dir_all(versions_root)?;
        let path = versions_root.join(LOCK_FILE);
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(RevwatchError::AlreadyRunning { lock: path });
        }

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
