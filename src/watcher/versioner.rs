//! Artifact naming and create-once persistence
//!
//! Layout: `<root>/versions/Version_<yyyy-MM-dd>/<kind>/<stem>_<timestamp>.<ext>`.
//! The date is taken when the artifact is written; the timestamp is the
//! capture time of the event, so redelivering the same event maps to the
//! same path and the second write is skipped.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::clock::{format_date, format_timestamp, Clock};
use crate::fs::FileSystem;

/// Result of a create-once write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The artifact already existed and was left untouched
    AlreadyPresent,
}

/// Build the artifact path for `source`.
///
/// `folder` is one of `created`, `modified` or `deleted`. Files without an
/// extension get no trailing dot; dotfiles keep their full name as the stem.
pub fn artifact_path(
    versions_root: &Path,
    source: &Path,
    folder: &str,
    date: &str,
    timestamp: &str,
) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("unnamed"));

    let mut name = stem;
    name.push("_");
    name.push(timestamp);
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }

    versions_root
        .join(format!("Version_{date}"))
        .join(folder)
        .join(name)
}

/// Computes artifact locations and persists bytes to them exactly once.
pub struct VersionWriter {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    versions_root: PathBuf,
}

impl VersionWriter {
    pub fn new(fs: Arc<dyn FileSystem>, clock: Arc<dyn Clock>, versions_root: PathBuf) -> Self {
        Self {
            fs,
            clock,
            versions_root,
        }
    }

    pub fn versions_root(&self) -> &Path {
        &self.versions_root
    }

    /// Where the artifact for this change goes, dated with the current day.
    pub fn locate(&self, source: &Path, folder: &str, captured_at: &DateTime<Local>) -> PathBuf {
        artifact_path(
            &self.versions_root,
            source,
            folder,
            &format_date(&self.clock.now()),
            &format_timestamp(captured_at),
        )
    }

    /// Write `bytes` to `artifact`, creating parent directories on demand.
    /// An existing artifact is never overwritten.
    pub fn persist(&self, artifact: &Path, bytes: &[u8]) -> io::Result<WriteOutcome> {
        if self.fs.exists(artifact) {
            debug!(artifact = %artifact.display(), "artifact already present");
            return Ok(WriteOutcome::AlreadyPresent);
        }
        if let Some(parent) = artifact.parent() {
            self.fs.create_dir_all(parent)?;
        }
        match self.fs.write_new(artifact, bytes) {
            Ok(()) => Ok(WriteOutcome::Written),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(artifact = %artifact.display(), "artifact created concurrently");
                Ok(WriteOutcome::AlreadyPresent)
            }
            Err(e) => Err(e),
        }
    }
}
