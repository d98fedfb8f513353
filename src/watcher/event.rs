//! Event types flowing through the watcher

use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

/// What happened to a path, in dispatch priority order.
///
/// The declaration order is the service order: a modification is handled
/// before a file deletion, which is handled before a creation, which is
/// handled before a folder deletion. Replacing a file (delete + create, or
/// create + modify of the same name) is therefore versioned against the
/// content that was there before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Modified,
    Deleted,
    Created,
    FolderDeleted,
}

impl EventKind {
    /// Lower is serviced first.
    pub fn priority(self) -> u8 {
        match self {
            EventKind::Modified => 1,
            EventKind::Deleted => 2,
            EventKind::Created => 3,
            EventKind::FolderDeleted => 4,
        }
    }

    /// Folder name used in the version store, if this kind writes artifacts
    /// directly. Folder deletions fan out into file deletions.
    pub fn version_folder(self) -> Option<&'static str> {
        match self {
            EventKind::Created => Some("created"),
            EventKind::Modified => Some("modified"),
            EventKind::Deleted => Some("deleted"),
            EventKind::FolderDeleted => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Modified => "modified",
            EventKind::Deleted => "deleted",
            EventKind::Created => "created",
            EventKind::FolderDeleted => "folder_deleted",
        };
        f.write_str(name)
    }
}

/// A classified, file-level event waiting to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: EventKind,
    /// When the raw notification was picked up; names the artifact.
    pub captured_at: DateTime<Local>,
}

impl FileEvent {
    pub fn new(path: PathBuf, kind: EventKind, captured_at: DateTime<Local>) -> Self {
        Self {
            path,
            kind,
            captured_at,
        }
    }
}

impl PartialOrd for FileEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Events order by kind priority only; the path and capture time break ties
/// so that the order is total and consistent with `Eq`.
impl Ord for FileEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.captured_at.cmp(&other.captured_at))
            .then_with(|| self.path.cmp(&other.path))
    }
}

/// Progress reported by the running watcher (NDJSON in `--json` mode)
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum VersionEvent {
    /// Initial scan and registration finished
    WatchStarted {
        root: String,
        tracked_files: usize,
        watched_directories: usize,
    },
    /// A directory created at runtime is now watched
    DirectoryRegistered { path: String },
    /// An artifact was written
    Versioned {
        kind: EventKind,
        path: String,
        artifact: String,
    },
    /// Something went wrong (the watcher keeps running unless followed by `shutdown`)
    Error { message: String },
    /// Watch stopped
    Shutdown,
}

impl VersionEvent {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
