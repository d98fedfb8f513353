//! Error types for revwatch
//!
//! Setup failures surface as `RevwatchError`. Failures while versioning a
//! single event never leave the dispatcher; they are classified with
//! [`AccessError`] and logged.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for revwatch operations
pub type RevwatchResult<T> = Result<T, RevwatchError>;

/// Main error type for revwatch operations
#[derive(Error, Debug)]
pub enum RevwatchError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The OS notification facility failed
    #[error("watch facility error: {0}")]
    Watch(#[from] notify::Error),

    /// Watched root does not exist
    #[error("watched root not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Watched root is not a directory
    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid or unreadable configuration
    #[error("invalid config in {file}: {message}")]
    Config { file: PathBuf, message: String },

    /// Invalid `.revwatchignore`
    #[error("{0}")]
    IgnorePattern(#[from] crate::ignore_patterns::IgnoreError),

    /// Another watcher already owns the version store
    #[error("another revwatch instance holds {lock}")]
    AlreadyRunning { lock: PathBuf },

    /// The dispatch worker pool could not be started
    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// How a failed read or write of a tracked file should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The file no longer exists; abandon without retry.
    Vanished,
    /// The file is locked or briefly inaccessible; worth retrying.
    Transient,
    /// Anything else; abandon.
    Fatal,
}

impl AccessError {
    /// Classify an I/O error by its kind (and OS code for sharing violations).
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AccessError::Vanished,
            io::ErrorKind::PermissionDenied
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::Interrupted
            | io::ErrorKind::TimedOut => AccessError::Transient,
            _ if is_busy_os_error(err) => AccessError::Transient,
            _ => AccessError::Fatal,
        }
    }
}

#[cfg(windows)]
fn is_busy_os_error(err: &io::Error) -> bool {
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    matches!(err.raw_os_error(), Some(32) | Some(33))
}

#[cfg(not(windows))]
fn is_busy_os_error(err: &io::Error) -> bool {
    // EBUSY, ETXTBSY
    matches!(err.raw_os_error(), Some(16) | Some(26))
}
