//! Priority-ordered buffer between classification and dispatch

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;

use super::event::FileEvent;

/// Unbounded, thread-safe min-heap of classified events.
///
/// `pop` always returns the event with the lowest kind priority
/// (modification, then deletion, then creation, then folder deletion).
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: Mutex<BinaryHeap<Reverse<FileEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: FileEvent) {
        self.lock().push(Reverse(event));
    }

    pub fn extend(&self, events: impl IntoIterator<Item = FileEvent>) {
        self.lock().extend(events.into_iter().map(Reverse));
    }

    pub fn pop(&self) -> Option<FileEvent> {
        self.lock().pop().map(|Reverse(event)| event)
    }

    /// Pop until empty, in priority order. Events pushed while draining are
    /// picked up if they sort ahead of what is left.
    pub fn drain(&self) -> impl Iterator<Item = FileEvent> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BinaryHeap<Reverse<FileEvent>>> {
        // A panic while holding the lock cannot leave the heap half-updated.
        self.heap.lock().unwrap_or_else(|e| e.into_inner())
    }
}
