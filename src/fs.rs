//! File system collaborator
//!
//! The watcher core only needs a handful of primitives from the disk:
//! existence checks, whole-file reads, create-once writes and recursive
//! listings that respect the [`WatchScope`]. `LocalFs` is the real
//! implementation; tests wrap it to inject failures.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use ignore::{DirEntry, WalkBuilder};
use tracing::warn;

use crate::scope::WatchScope;

/// What a recursive listing does with an entry it cannot read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkErrors {
    /// Fail the whole listing (startup: the tree must be complete)
    Abort,
    /// Log the entry and list the rest of the tree
    Skip,
}

/// Abstract file system interface
pub trait FileSystem: Send + Sync {
    /// Check if a path exists (symlinks are not followed)
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path is a directory (symlinks are not followed)
    fn is_dir(&self, path: &Path) -> bool;

    /// Read the full content of a file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write content to a path that must not exist yet.
    ///
    /// Fails with `ErrorKind::AlreadyExists` when the target is present;
    /// the existing file is never touched.
    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()>;

    /// Create directory and parents
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// List regular, readable, writable files under `root` that the scope covers,
    /// sorted and deduplicated.
    fn list_files(
        &self,
        root: &Path,
        scope: &WatchScope,
        errors: WalkErrors,
    ) -> io::Result<Vec<PathBuf>>;

    /// List `root` and every directory below it that the scope covers, sorted.
    fn list_dirs(
        &self,
        root: &Path,
        scope: &WatchScope,
        errors: WalkErrors,
    ) -> io::Result<Vec<PathBuf>>;
}

/// Local file system implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new LocalFs instance
    pub fn new() -> Self {
        Self
    }

    fn walk(&self, root: &Path, scope: &WatchScope) -> WalkBuilder {
        let scope = scope.clone();
        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                scope.covers(entry.path(), is_dir)
            });
        builder
    }

    fn entries(
        &self,
        root: &Path,
        scope: &WatchScope,
        errors: WalkErrors,
    ) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in self.walk(root, scope).build() {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) if errors == WalkErrors::Skip => {
                    warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                }
                Err(e) => return Err(walk_error(e)),
            }
        }
        Ok(entries)
    }
}

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_new(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(content)?;
        file.sync_all()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn list_files(
        &self,
        root: &Path,
        scope: &WatchScope,
        errors: WalkErrors,
    ) -> io::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .entries(root, scope, errors)?
            .into_iter()
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter(|entry| is_readable_and_writable(entry.path()))
            .map(DirEntry::into_path)
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn list_dirs(
        &self,
        root: &Path,
        scope: &WatchScope,
        errors: WalkErrors,
    ) -> io::Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = self
            .entries(root, scope, errors)?
            .into_iter()
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_dir()))
            .map(DirEntry::into_path)
            .collect();
        dirs.sort();
        dirs.dedup();
        Ok(dirs)
    }
}

fn is_readable_and_writable(path: &Path) -> bool {
    let writable = fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false);
    writable && fs::File::open(path).is_ok()
}

fn walk_error(err: ignore::Error) -> io::Error {
    match err.into_io_error() {
        Some(io_err) => io_err,
        None => io::Error::other("directory walk failed"),
    }
}
