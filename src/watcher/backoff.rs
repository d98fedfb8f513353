//! Fixed-delay, bounded retry for transient file access failures.
//!
//! Sleeping goes through [`Sleeper`] so retry behaviour can be tested
//! without real delays.

use std::io;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

use crate::error::AccessError;

/// Default number of attempts for reading a freshly created file
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts in milliseconds
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Trait for pausing between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper that uses `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Sleeper that returns immediately and remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    naps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn naps(&self) -> Vec<Duration> {
        self.naps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.naps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryFailure {
    /// The file disappeared; no retry was attempted after that
    Vanished(io::Error),
    /// Every attempt hit a transient error
    Exhausted { attempts: u32, last: io::Error },
    /// A non-retryable error
    Failed(io::Error),
}

impl std::fmt::Display for RetryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryFailure::Vanished(e) => write!(f, "file vanished: {e}"),
            RetryFailure::Exhausted { attempts, last } => {
                write!(f, "still locked or inaccessible after {attempts} attempts: {last}")
            }
            RetryFailure::Failed(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds, fails for a non-transient reason, or the
    /// attempt budget is spent. `op` receives the 1-based attempt number.
    pub fn run<T>(
        &self,
        sleeper: &dyn Sleeper,
        mut op: impl FnMut(u32) -> io::Result<T>,
    ) -> Result<T, RetryFailure> {
        let mut attempt = 1;
        loop {
            let err = match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match AccessError::classify(&err) {
                AccessError::Vanished => return Err(RetryFailure::Vanished(err)),
                AccessError::Fatal => return Err(RetryFailure::Failed(err)),
                AccessError::Transient if attempt >= self.max_attempts => {
                    return Err(RetryFailure::Exhausted {
                        attempts: attempt,
                        last: err,
                    })
                }
                AccessError::Transient => {
                    debug!(attempt, error = %err, "transient access failure, retrying");
                    sleeper.sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }
}
