//! Configuration module for revwatch
//!
//! Resolution order:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (REVWATCH_*)
//! 3. `--config <file>`, else `<config dir>/revwatch/config.toml`
//! 4. Built-in defaults (lowest priority)

mod loader;
mod types;

pub use loader::{apply_overrides, parse_with_warnings, user_config_path, ConfigWarning};
pub use types::{Config, LogSection, RetryConfig, WatchConfig};
