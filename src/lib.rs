//! revwatch - keeps every version of every file in a directory tree
//!
//! A long-running watcher that, for each create, modify or delete under a
//! root directory, writes the relevant content to an immutable, timestamped
//! artifact under `<root>/versions/`.

pub mod clock;
pub mod config;
pub mod error;
pub mod fs;
pub mod ignore_patterns;
pub mod lock;
pub mod logging;
pub mod scope;
pub mod watcher;

// Re-exports for convenience
pub use config::Config;
pub use error::{RevwatchError, RevwatchResult};
pub use watcher::{EventKind, ShutdownHandle, VersionEvent, VersionWatcher, WatchOptions};
