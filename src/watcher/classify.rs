//! Turning raw notifications into typed events
//!
//! A notification names a path and a coarse kind. Whether a deleted path
//! was a folder cannot be checked on disk any more, so it is decided from
//! what was known about it: a registered directory, or a prefix of tracked
//! files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use notify::event::{ModifyKind, RemoveKind, RenameMode};
use tracing::trace;

use super::debounce::Debouncer;
use super::event::{EventKind, FileEvent};
use super::registrar::WatchRegistrar;
use super::snapshot::SnapshotStore;
use crate::fs::FileSystem;
use crate::scope::WatchScope;

/// What a raw notification turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A file-level event for the priority queue
    File(FileEvent),
    /// A directory appeared and passed the debouncer
    NewDirectory(PathBuf),
}

/// Everything classification needs to look at; nothing here is mutated
/// except the debouncer's timestamps.
pub struct Classifier<'a> {
    pub scope: &'a WatchScope,
    pub fs: &'a dyn FileSystem,
    pub registrar: &'a WatchRegistrar,
    pub snapshot: &'a SnapshotStore,
    pub debouncer: &'a Debouncer,
}

impl Classifier<'_> {
    /// Classify one notification. `captured_at` names the artifacts;
    /// `now` feeds the debouncer.
    pub fn classify(
        &self,
        event: &notify::Event,
        captured_at: DateTime<Local>,
        now: Instant,
    ) -> Vec<Classified> {
        use notify::EventKind as Raw;

        let mut out = Vec::new();
        match event.kind {
            Raw::Create(_) => {
                for path in &event.paths {
                    self.appeared(path, captured_at, now, &mut out);
                }
            }
            Raw::Remove(kind) => {
                let folder_hint = matches!(kind, RemoveKind::Folder);
                for path in &event.paths {
                    self.disappeared(path, folder_hint, captured_at, &mut out);
                }
            }
            Raw::Modify(ModifyKind::Name(mode)) => match (mode, event.paths.as_slice()) {
                (RenameMode::Both, [from, to]) => {
                    self.disappeared(from, false, captured_at, &mut out);
                    self.appeared(to, captured_at, now, &mut out);
                }
                (RenameMode::From, paths) => {
                    for path in paths {
                        self.disappeared(path, false, captured_at, &mut out);
                    }
                }
                (RenameMode::To, paths) => {
                    for path in paths {
                        self.appeared(path, captured_at, now, &mut out);
                    }
                }
                (_, paths) => {
                    for path in paths {
                        if self.fs.exists(path) {
                            self.appeared(path, captured_at, now, &mut out);
                        } else {
                            self.disappeared(path, false, captured_at, &mut out);
                        }
                    }
                }
            },
            Raw::Modify(_) => {
                for path in &event.paths {
                    self.changed(path, captured_at, &mut out);
                }
            }
            Raw::Any | Raw::Other => {
                for path in &event.paths {
                    if !self.fs.exists(path) {
                        self.disappeared(path, false, captured_at, &mut out);
                    } else if self.snapshot.contains(path) {
                        self.changed(path, captured_at, &mut out);
                    } else {
                        self.appeared(path, captured_at, now, &mut out);
                    }
                }
            }
            Raw::Access(_) => {}
        }
        out
    }

    fn appeared(
        &self,
        path: &Path,
        captured_at: DateTime<Local>,
        now: Instant,
        out: &mut Vec<Classified>,
    ) {
        let is_dir = self.fs.is_dir(path);
        if !self.scope.covers(path, is_dir) {
            return;
        }
        if is_dir {
            if self.debouncer.accept(path, now) {
                out.push(Classified::NewDirectory(path.to_path_buf()));
            } else {
                trace!(path = %path.display(), "duplicate directory creation dropped");
            }
        } else {
            out.push(file_event(path, EventKind::Created, captured_at));
        }
    }

    fn changed(&self, path: &Path, captured_at: DateTime<Local>, out: &mut Vec<Classified>) {
        // Directory mtime changes are implied by the entry events.
        if self.fs.is_dir(path) || !self.scope.covers(path, false) {
            return;
        }
        out.push(file_event(path, EventKind::Modified, captured_at));
    }

    fn disappeared(
        &self,
        path: &Path,
        folder_hint: bool,
        captured_at: DateTime<Local>,
        out: &mut Vec<Classified>,
    ) {
        let was_dir = folder_hint
            || self.registrar.is_registered(path)
            || self.snapshot.tracks_under(path);
        if !self.scope.covers(path, was_dir) {
            return;
        }
        let kind = if was_dir {
            EventKind::FolderDeleted
        } else {
            EventKind::Deleted
        };
        out.push(file_event(path, kind, captured_at));
    }
}

fn file_event(path: &Path, kind: EventKind, captured_at: DateTime<Local>) -> Classified {
    Classified::File(FileEvent::new(path.to_path_buf(), kind, captured_at))
}
