//! Configuration type definitions

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RevwatchError, RevwatchResult};
use crate::logging::LogLevel;
use crate::watcher::backoff::{RetryPolicy, DEFAULT_DELAY_MS, DEFAULT_MAX_ATTEMPTS};
use crate::watcher::debounce::DEBOUNCE_MS;
use crate::watcher::service::{WatchOptions, VERSIONS_DIR};

use super::loader::{self, ConfigWarning};

/// Watch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Version store directory name under the watched root
    #[serde(default = "default_versions_dir")]
    pub versions_dir: String,

    /// Directory-creation debounce window
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Worker threads (0 = one per core)
    #[serde(default)]
    pub workers: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            versions_dir: default_versions_dir(),
            debounce_ms: default_debounce_ms(),
            workers: 0,
        }
    }
}

fn default_versions_dir() -> String {
    VERSIONS_DIR.to_string()
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

/// Retry configuration for files that are locked right after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

/// Log configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LogSection {
    #[serde(default)]
    pub level: LogLevel,
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub log: LogSection,

    /// File this configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> RevwatchResult<Self> {
        let (config, _warnings) = loader::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> RevwatchResult<(Self, Vec<ConfigWarning>)> {
        loader::load_with_warnings(path)
    }

    /// Load from `explicit`, else the user config, else defaults; then apply
    /// environment overrides and validate.
    pub fn resolve(explicit: Option<&Path>) -> RevwatchResult<(Self, Vec<ConfigWarning>)> {
        loader::resolve(explicit)
    }

    /// Apply environment variable overrides (REVWATCH_* prefix)
    pub fn with_env_overrides(self) -> Self {
        loader::with_env_overrides(self)
    }

    /// Reject values the watcher cannot run with.
    pub fn validate(&self) -> RevwatchResult<()> {
        let name = self.watch.versions_dir.as_str();
        if name.trim().is_empty() {
            return Err(self.invalid("watch.versions_dir must not be empty"));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(self.invalid(format!(
                "watch.versions_dir must be a plain directory name, got '{name}'"
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(self.invalid("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.delay_ms),
        )
    }

    /// Watch options for `root` with this configuration applied
    pub fn to_watch_options(&self, root: impl Into<PathBuf>) -> WatchOptions {
        WatchOptions::new(root)
            .with_versions_dir(self.watch.versions_dir.clone())
            .with_debounce(Duration::from_millis(self.watch.debounce_ms))
            .with_retry(self.retry_policy())
            .with_workers(self.watch.workers)
    }

    fn invalid(&self, message: impl Into<String>) -> RevwatchError {
        RevwatchError::Config {
            file: self
                .source
                .clone()
                .unwrap_or_else(|| PathBuf::from("<defaults>")),
            message: message.into(),
        }
    }
}
