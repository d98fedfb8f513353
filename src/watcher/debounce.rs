//! Per-path debouncing of directory-creation notifications
//!
//! Creating a deep tree quickly makes the OS report the same new directory
//! several times. Only directory creations go through here; file events are
//! never dropped.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Default debounce window in milliseconds
pub const DEBOUNCE_MS: u64 = 500;

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_seen: DashMap<PathBuf, Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEBOUNCE_MS))
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: DashMap::new(),
        }
    }

    /// Returns true if the event should be processed: the path is unseen or
    /// its last accepted event is more than one window old. Accepting records
    /// `now` as the new last-seen time.
    pub fn accept(&self, path: &Path, now: Instant) -> bool {
        match self.last_seen.entry(path.to_path_buf()) {
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
            Entry::Occupied(mut entry) => {
                if now.saturating_duration_since(*entry.get()) > self.window {
                    entry.insert(now);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Drop entries whose window has passed; they would be accepted anyway.
    pub fn prune(&self, now: Instant) {
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) <= self.window);
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}
