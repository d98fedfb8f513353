//! Per-kind versioning logic
//!
//! | Kind           | Artifact content      | Snapshot after            |
//! |----------------|-----------------------|---------------------------|
//! | created        | current bytes         | current bytes             |
//! | modified       | previous bytes        | current bytes             |
//! | deleted        | last tracked bytes    | removed                   |
//! | folder deleted | one `deleted` per file tracked below the folder      |
//!
//! The snapshot is only updated after the artifact is written (or found
//! already written). Deletions are the exception: the source is gone, so the
//! entry is removed whatever happens to the write.
//!
//! Batches are dispatched concurrently. A modification only replaces the
//! snapshot entry it diffed against; if another worker replaced it first,
//! that newer entry stays.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, error, warn};

use super::backoff::{RetryFailure, RetryPolicy, Sleeper};
use super::event::{EventKind, FileEvent};
use super::snapshot::{Content, SnapshotStore, Swap};
use super::versioner::{VersionWriter, WriteOutcome};
use crate::fs::FileSystem;


/// What dispatching one file-level change amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new artifact was written
    Versioned(PathBuf),
    /// The artifact already existed; nothing was written
    AlreadyVersioned(PathBuf),
    /// Content matches the snapshot
    Unchanged,
    /// No snapshot entry to diff against or to preserve
    Untracked,
    /// Gave up on this change; the reason has been logged
    Abandoned(String),
}

/// One file-level result. A folder deletion yields one per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub path: PathBuf,
    /// The artifact kind (never `FolderDeleted`)
    pub kind: EventKind,
    pub outcome: DispatchOutcome,
}

impl Dispatched {
    fn new(path: &Path, kind: EventKind, outcome: DispatchOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            kind,
            outcome,
        }
    }

    /// The artifact written by this dispatch, if any
    pub fn written(&self) -> Option<&Path> {
        match &self.outcome {
            DispatchOutcome::Versioned(artifact) => Some(artifact),
            _ => None,
        }
    }
}

pub struct EventDispatcher {
    snapshot: Arc<SnapshotStore>,
    writer: VersionWriter,
    fs: Arc<dyn FileSystem>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl EventDispatcher {
    pub fn new(
        snapshot: Arc<SnapshotStore>,
        writer: VersionWriter,
        fs: Arc<dyn FileSystem>,
        retry: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            snapshot,
            writer,
            fs,
            retry,
            sleeper,
        }
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    /// Route an event to the handler for its kind.
    pub fn dispatch(&self, event: &FileEvent) -> Vec<Dispatched> {
        let path = event.path.as_path();
        let at = &event.captured_at;
        match event.kind {
            EventKind::Created => vec![self.handle_creation(path, at)],
            EventKind::Modified => vec![self.handle_modification(path, at)],
            EventKind::Deleted => vec![self.handle_deletion(path, at)],
            EventKind::FolderDeleted => self.handle_folder_deletion(path, at),
        }
    }

    /// Version a new file with its current bytes and start tracking it.
    ///
    /// Locked files are retried per the policy; a file that is gone is
    /// abandoned at once. A path that is already tracked is not new: identical
    /// bytes make this a no-op, different bytes are versioned as a
    /// modification so the replaced content is kept.
    pub fn handle_creation(&self, path: &Path, captured_at: &DateTime<Local>) -> Dispatched {
        let kind = EventKind::Created;
        let bytes = match self.retry.run(self.sleeper.as_ref(), |_| self.fs.read(path)) {
            Ok(bytes) => bytes,
            Err(failure) => {
                warn!(path = %path.display(), error = %failure, "abandoning creation");
                return Dispatched::new(path, kind, abandoned(&failure));
            }
        };

        if let Some(previous) = self.snapshot.get(path) {
            if previous.as_ref() == bytes.as_slice() {
                debug!(path = %path.display(), "creation of already tracked content");
                return Dispatched::new(path, kind, DispatchOutcome::Unchanged);
            }
            debug!(path = %path.display(), "created over a tracked file, versioning as modification");
            return self.version_change(path, previous, bytes, captured_at);
        }

        let artifact = self.writer.locate(path, "created", captured_at);
        let written = self
            .retry
            .run(self.sleeper.as_ref(), |_| self.writer.persist(&artifact, &bytes));
        match written {
            Ok(outcome) => {
                self.snapshot.insert(path.to_path_buf(), bytes);
                Dispatched::new(path, kind, persisted(outcome, artifact))
            }
            Err(failure) => {
                error!(path = %path.display(), artifact = %artifact.display(), error = %failure, "failed to write version");
                Dispatched::new(path, kind, abandoned(&failure))
            }
        }
    }

    /// Preserve the pre-change bytes of a tracked file whose content changed.
    pub fn handle_modification(&self, path: &Path, captured_at: &DateTime<Local>) -> Dispatched {
        let kind = EventKind::Modified;
        let Some(previous) = self.snapshot.get(path) else {
            debug!(path = %path.display(), "modification of untracked file ignored");
            return Dispatched::new(path, kind, DispatchOutcome::Untracked);
        };

        let current = match self.fs.read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // The deletion notification that follows versions the last content.
                debug!(path = %path.display(), "modified file vanished before read");
                return Dispatched::new(path, kind, DispatchOutcome::Abandoned(e.to_string()));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read modified file");
                return Dispatched::new(path, kind, DispatchOutcome::Abandoned(e.to_string()));
            }
        };

        if previous.as_ref() == current.as_slice() {
            return Dispatched::new(path, kind, DispatchOutcome::Unchanged);
        }
        self.version_change(path, previous, current, captured_at)
    }

    /// Preserve the last tracked content of a deleted file and stop tracking it.
    pub fn handle_deletion(&self, path: &Path, captured_at: &DateTime<Local>) -> Dispatched {
        let kind = EventKind::Deleted;
        let Some(last) = self.snapshot.remove(path) else {
            debug!(path = %path.display(), "deletion of untracked file ignored");
            return Dispatched::new(path, kind, DispatchOutcome::Untracked);
        };

        let artifact = self.writer.locate(path, "deleted", captured_at);
        match self.writer.persist(&artifact, &last) {
            Ok(outcome) => Dispatched::new(path, kind, persisted(outcome, artifact)),
            Err(e) => {
                error!(path = %path.display(), artifact = %artifact.display(), error = %e, "failed to write version");
                Dispatched::new(path, kind, DispatchOutcome::Abandoned(e.to_string()))
            }
        }
    }

    /// Version every file tracked below a deleted folder. Each file is
    /// handled independently; one failure does not stop the rest.
    pub fn handle_folder_deletion(
        &self,
        dir: &Path,
        captured_at: &DateTime<Local>,
    ) -> Vec<Dispatched> {
        let mut paths = self.snapshot.paths_under(dir);
        if self.snapshot.contains(dir) {
            // Inferred as a folder but tracked as a file.
            paths.push(dir.to_path_buf());
        }
        debug!(path = %dir.display(), files = paths.len(), "folder deleted");
        paths
            .iter()
            .map(|path| self.handle_deletion(path, captured_at))
            .collect()
    }

    fn version_change(
        &self,
        path: &Path,
        previous: Content,
        current: Vec<u8>,
        captured_at: &DateTime<Local>,
    ) -> Dispatched {
        let kind = EventKind::Modified;
        let artifact = self.writer.locate(path, "modified", captured_at);
        match self.writer.persist(&artifact, &previous) {
            Ok(outcome) => {
                match self.snapshot.swap(path, &previous, current) {
                    Swap::Replaced => {}
                    Swap::Stale => {
                        debug!(path = %path.display(), "snapshot moved on while versioning, keeping newer entry")
                    }
                    Swap::Untracked => {
                        debug!(path = %path.display(), "file deleted while versioning, not re-tracked")
                    }
                }
                Dispatched::new(path, kind, persisted(outcome, artifact))
            }
            Err(e) => {
                error!(path = %path.display(), artifact = %artifact.display(), error = %e, "failed to write version");
                Dispatched::new(path, kind, DispatchOutcome::Abandoned(e.to_string()))
            }
        }
    }
}

fn persisted(outcome: WriteOutcome, artifact: PathBuf) -> DispatchOutcome {
    match outcome {
        WriteOutcome::Written => DispatchOutcome::Versioned(artifact),
        WriteOutcome::AlreadyPresent => DispatchOutcome::AlreadyVersioned(artifact),
    }
}

fn abandoned(failure: &RetryFailure) -> DispatchOutcome {
    DispatchOutcome::Abandoned(failure.to_string())
}
