//! Watch-and-version pipeline
//!
//! ```text
//! OS notification -> classify (debounce dir creations) -> EventQueue
//!     -> EventDispatcher -> SnapshotStore compare -> VersionWriter
//! ```
//!
//! - Every directory under the root is registered non-recursively
//! - Each batch of notifications is re-ordered by kind priority
//! - Artifacts are written create-once; redelivery is a no-op
//! - Ctrl+C stops the wait loop and drains the worker pool

pub mod backoff;
pub mod classify;
pub mod debounce;
pub mod dispatcher;
pub mod event;
pub mod queue;
pub mod registrar;
pub mod service;
pub mod snapshot;
pub mod versioner;

pub use backoff::{RetryPolicy, Sleeper, ThreadSleeper};
pub use debounce::Debouncer;
pub use dispatcher::{DispatchOutcome, Dispatched, EventDispatcher};
pub use event::{EventKind, FileEvent, VersionEvent};
pub use queue::EventQueue;
pub use registrar::{WatchFacility, WatchRegistrar};
pub use service::{ShutdownHandle, VersionWatcher, WatchOptions};
pub use snapshot::SnapshotStore;
pub use versioner::VersionWriter;
