//! Logging setup using tracing.
//!
//! Diagnostics go to stderr so stdout stays clean for the event stream.

use std::fmt;

use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Accepted spellings, most verbose first
pub const LEVEL_NAMES: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a log level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Apply CLI flags: `-v` means at least debug, `-vv` trace, `-q` at most
    /// warn. Quiet wins over verbose.
    pub fn adjusted(self, verbose: u8, quiet: bool) -> Self {
        if quiet {
            return self.max(LogLevel::Warn);
        }
        match verbose {
            0 => self,
            1 => self.min(LogLevel::Debug),
            _ => LogLevel::Trace,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is not set.
    pub level: LogLevel,
    /// Colour output; `None` decides from whether stderr is a terminal.
    pub ansi: Option<bool>,
    /// Include module targets in each line.
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            ansi: None,
            with_target: false,
        }
    }
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Initialize logging with the given configuration.
///
/// This should be called once at application startup; later calls fail.
pub fn init(config: LogConfig) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let ansi = config
        .ansi
        .unwrap_or_else(|| std::io::stderr().is_terminal());

    let fmt_layer = tracing_fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(config.with_target)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
}
